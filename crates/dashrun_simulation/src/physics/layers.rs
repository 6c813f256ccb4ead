//! Collision layers — общие константы
//!
//! - Layer 1 (0b1): Player
//! - Layer 2 (0b10): Ground (всё, на чём можно стоять и прыгать)
//! - Layer 3 (0b100): Obstacles (стены, препятствия; НЕ земля)
//!
//! MovementTuning::ground_layers хранит bit mask (u32) — engine-agnostic,
//! Rapier Group получаем через group().

use bevy_rapier3d::prelude::{CollisionGroups, Group};

pub const LAYER_PLAYER: u32 = 0b1;
pub const LAYER_GROUND: u32 = 0b10;
pub const LAYER_OBSTACLES: u32 = 0b100;

/// Bit mask → Rapier Group (лишние биты отбрасываются)
pub fn group(bits: u32) -> Group {
    Group::from_bits_truncate(bits)
}

/// Игрок коллайдит с землёй и препятствиями
pub fn player_groups() -> CollisionGroups {
    CollisionGroups::new(group(LAYER_PLAYER), group(LAYER_GROUND | LAYER_OBSTACLES))
}

pub fn ground_groups() -> CollisionGroups {
    CollisionGroups::new(group(LAYER_GROUND), Group::ALL)
}

pub fn obstacle_groups() -> CollisionGroups {
    CollisionGroups::new(group(LAYER_OBSTACLES), Group::ALL)
}
