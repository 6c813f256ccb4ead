//! BodyCommands — RigidBodyHandle поверх Rapier компонентов
//!
//! Контроллер не трогает ECS напрямую: за step копим силы здесь,
//! потом step_controllers переносит их в ExternalForce/ExternalImpulse/Velocity.
//!
//! Jump impulse приходит из Update (InputReader → PlayerJump) и
//! применяется на ближайшем fixed step.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{ExternalForce, ExternalImpulse, Velocity};

use crate::movement::{ForceMode, RigidBodyHandle};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyCommands {
    position: Vec3,
    /// Continuous force этого step'а
    pub force: Vec3,
    pub impulse: Vec3,
    pub velocity_change: Vec3,
}

impl BodyCommands {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..default()
        }
    }

    /// Позиция из Transform перед step'ом
    pub fn sync_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Забирает накопленное, аккумуляторы обнуляются (позиция остаётся)
    pub fn take(&mut self) -> BodyCommands {
        let taken = *self;
        self.force = Vec3::ZERO;
        self.impulse = Vec3::ZERO;
        self.velocity_change = Vec3::ZERO;
        taken
    }

    pub fn is_empty(&self) -> bool {
        self.force == Vec3::ZERO && self.impulse == Vec3::ZERO && self.velocity_change == Vec3::ZERO
    }

    /// Перенос в Rapier
    ///
    /// - ExternalForce персистентный в Rapier → перезаписываем каждый step
    /// - ExternalImpulse Rapier обнуляет после step → добавляем
    /// - velocity change → прямо в linvel
    pub fn apply_to(&self, force: &mut ExternalForce, impulse: &mut ExternalImpulse, velocity: &mut Velocity) {
        force.force = self.force;
        impulse.impulse += self.impulse;
        velocity.linvel += self.velocity_change;
    }
}

impl RigidBodyHandle for BodyCommands {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn add_force(&mut self, force: Vec3, mode: ForceMode) {
        match mode {
            ForceMode::Force => self.force += force,
            ForceMode::Impulse => self.impulse += force,
            ForceMode::VelocityChange => self.velocity_change += force,
        }
    }
}
