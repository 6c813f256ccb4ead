//! Keyboard → InputSource (Bevy ButtonInput<KeyCode>)
//!
//! - A/D, ←/→ → Horizontal
//! - W/S, ↑/↓ → Vertical
//! - jump key (по умолчанию Space) — held state, transition детектит InputReader

use bevy::prelude::{ButtonInput, KeyCode};

use super::{InputAxis, InputSource};

pub struct KeyboardSource<'a> {
    keys: &'a ButtonInput<KeyCode>,
}

impl<'a> KeyboardSource<'a> {
    pub fn new(keys: &'a ButtonInput<KeyCode>) -> Self {
        Self { keys }
    }

    fn digital_axis(&self, negative: [KeyCode; 2], positive: [KeyCode; 2]) -> f32 {
        let mut value = 0.0;
        if self.keys.any_pressed(negative) {
            value -= 1.0;
        }
        if self.keys.any_pressed(positive) {
            value += 1.0;
        }
        value
    }
}

impl InputSource for KeyboardSource<'_> {
    fn axis(&self, axis: InputAxis) -> f32 {
        match axis {
            InputAxis::Horizontal => self.digital_axis(
                [KeyCode::KeyA, KeyCode::ArrowLeft],
                [KeyCode::KeyD, KeyCode::ArrowRight],
            ),
            InputAxis::Vertical => self.digital_axis(
                [KeyCode::KeyS, KeyCode::ArrowDown],
                [KeyCode::KeyW, KeyCode::ArrowUp],
            ),
        }
    }

    fn key_held(&self, key: KeyCode) -> bool {
        self.keys.pressed(key)
    }
}
