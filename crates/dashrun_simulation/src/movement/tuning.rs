//! Movement tunables (authoring-time конфиг, immutable в runtime)

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::physics::layers::LAYER_GROUND;

/// Y ниже которого игрок считается упавшим с карты
pub const DEATH_HEIGHT: f32 = -5.0;

/// Параметры движения игрока
///
/// Defaults подобраны под capsule высотой 2m (центр на 1m над подошвой):
/// ray стартует на 0.9m ниже центра и дотягивается ровно до подошвы.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct MovementTuning {
    /// Сила вперёд (+Z), масштабируется Vertical axis
    pub forward_force: f32,
    /// Боковой velocity change (+X), масштабируется Horizontal axis
    pub sideways_force: f32,
    /// Jump impulse (+Y)
    pub jump_force: f32,
    /// Старт ground ray относительно позиции тела
    pub raycast_offset: Vec3,
    /// Длина ground ray (m)
    pub raycast_distance: f32,
    /// Collision layers, которые считаются землёй (bit mask)
    pub ground_layers: u32,
    pub death_height: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            forward_force: 1000.0,
            sideways_force: 50.0,
            jump_force: 500.0,
            raycast_offset: Vec3::new(0.0, -0.9, 0.0),
            raycast_distance: 0.1,
            ground_layers: LAYER_GROUND,
            death_height: DEATH_HEIGHT,
        }
    }
}

impl MovementTuning {
    /// Парсит TOML; отсутствующие поля берутся из Default
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&source)
    }
}
