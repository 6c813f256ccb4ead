//! ScriptedInput — input без клавиатуры (headless runs, тесты)
//!
//! Два режима:
//! - fixed: оси и jump задаются напрямую
//! - autopilot: seeded ChaCha8 (детерминизм) — бежим вперёд, рулим и прыгаем случайно

use bevy::prelude::{KeyCode, Resource};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{InputAxis, InputSource};

/// Как часто autopilot меняет руление (frames)
const STEER_INTERVAL_FRAMES: u32 = 30;
/// Вероятность нажать jump в frame
const JUMP_CHANCE: f64 = 0.02;

#[derive(Resource, Debug, Clone)]
pub struct ScriptedInput {
    pub horizontal: f32,
    pub vertical: f32,
    /// Held state jump key (любой jump key считается нажатым)
    pub jump: bool,
    autopilot: Option<Autopilot>,
}

#[derive(Debug, Clone)]
struct Autopilot {
    rng: ChaCha8Rng,
    frames_until_steer: u32,
}

impl ScriptedInput {
    pub fn fixed(horizontal: f32, vertical: f32, jump: bool) -> Self {
        Self {
            horizontal,
            vertical,
            jump,
            autopilot: None,
        }
    }

    pub fn idle() -> Self {
        Self::fixed(0.0, 0.0, false)
    }

    pub fn autopilot(seed: u64) -> Self {
        Self {
            horizontal: 0.0,
            vertical: 1.0,
            jump: false,
            autopilot: Some(Autopilot {
                rng: ChaCha8Rng::seed_from_u64(seed),
                frames_until_steer: 0,
            }),
        }
    }

    pub fn is_autopilot(&self) -> bool {
        self.autopilot.is_some()
    }

    /// Следующий frame (fixed режим не меняется)
    pub fn advance(&mut self) {
        let Some(pilot) = self.autopilot.as_mut() else {
            return;
        };

        if pilot.frames_until_steer == 0 {
            self.horizontal = pilot.rng.gen_range(-1.0..=1.0);
            pilot.frames_until_steer = STEER_INTERVAL_FRAMES;
        }
        pilot.frames_until_steer -= 1;

        // Jump — одиночный frame нажатия, иначе InputReader не увидит transition
        self.jump = !self.jump && pilot.rng.gen_bool(JUMP_CHANCE);
    }
}

impl InputSource for ScriptedInput {
    fn axis(&self, axis: InputAxis) -> f32 {
        match axis {
            InputAxis::Horizontal => self.horizontal,
            InputAxis::Vertical => self.vertical,
        }
    }

    fn key_held(&self, _key: KeyCode) -> bool {
        self.jump
    }
}
