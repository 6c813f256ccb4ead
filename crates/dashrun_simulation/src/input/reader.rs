//! InputReader — per-frame polling двух осей и jump key

use bevy::prelude::KeyCode;

use crate::events::{EventBus, GameTrigger};

/// Named axis (платформа отдаёт normalized значение)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAxis {
    /// -1.0 (left) → +1.0 (right)
    Horizontal,
    /// -1.0 (back) → +1.0 (forward)
    Vertical,
}

/// Capability: платформенный input
///
/// Реализации: KeyboardSource (Bevy ButtonInput), ScriptedInput (headless).
pub trait InputSource {
    fn axis(&self, axis: InputAxis) -> f32;

    /// Key зажат в этом frame (edge detection делает InputReader)
    fn key_held(&self, key: KeyCode) -> bool;
}

/// Читает input раз в frame, публикует jump через EventBus
///
/// Инвариант: horizontal/vertical = сырые значения последнего update(),
/// clamp в [-1, 1], NaN → 0.
#[derive(Debug)]
pub struct InputReader {
    horizontal: f32,
    vertical: f32,
    jump_key: KeyCode,
    jump_held: bool,
    bus: EventBus,
}

impl InputReader {
    pub fn new(bus: EventBus, jump_key: KeyCode) -> Self {
        Self {
            horizontal: 0.0,
            vertical: 0.0,
            jump_key,
            jump_held: false,
            bus,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.horizontal
    }

    pub fn vertical(&self) -> f32 {
        self.vertical
    }

    pub fn jump_key(&self) -> KeyCode {
        self.jump_key
    }

    /// Frame update: оси + jump transition
    ///
    /// PlayerJump поднимается ровно один раз на переход released → pressed,
    /// удержание клавиши повторно не триггерит.
    pub fn update(&mut self, source: &impl InputSource) {
        self.horizontal = sanitize_axis(source.axis(InputAxis::Horizontal));
        self.vertical = sanitize_axis(source.axis(InputAxis::Vertical));

        let held = source.key_held(self.jump_key);
        let pressed_this_frame = held && !self.jump_held;
        self.jump_held = held;

        if pressed_this_frame {
            self.bus.raise(GameTrigger::PlayerJump);
        }
    }
}

fn sanitize_axis(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}
