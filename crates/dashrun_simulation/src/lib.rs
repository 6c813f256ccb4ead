//! DASHRUN Simulation Core
//!
//! Player controller на Bevy 0.16 + Rapier:
//! - events: EventBus (PlayerJump, PlayerDied) со scoped подписками
//! - input: InputReader (оси + jump), InputService (один reader на App)
//! - movement: MovementController (ground ray, силы, jump, death check)
//! - physics: Bevy/Rapier adapter (plugin, системы, spawn helpers)
//!
//! Логика контроллера engine-agnostic (capability traits), Bevy — внешний
//! driver loop: Update → InputReader::update, FixedUpdate → fixed_update(dt).

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier3d::prelude::*;

pub mod error;
pub mod events;
pub mod input;
pub mod logger;
pub mod movement;
pub mod physics;

// Re-exports для удобного импорта
pub use error::{ConfigError, ControllerError, InputError};
pub use events::{EventBus, GameTrigger, Subscription};
pub use input::{InputAxis, InputReader, InputService, InputSource, KeyboardSource, ScriptedInput};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use movement::{
    classify_ground, ForceMode, GroundProbe, MovementController, MovementTuning, RayHit, RigidBodyHandle,
    StepOutcome, DEATH_HEIGHT,
};
pub use physics::{
    spawn_ground, spawn_player, BodyCommands, ControllerRegistry, GroundContact, PlayerController,
    PlayerControllerPlugin, PlayerDied, PlayerJumped,
};

/// Частота fixed step (physics + movement)
pub const FIXED_HZ: f64 = 60.0;

/// Главный plugin симуляции
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
            .add_plugins(PlayerControllerPlugin);
    }
}

/// Minimal Bevy App без рендера и физики
///
/// Input — autopilot с заданным seed (тесты подменяют ресурс ScriptedInput).
pub fn create_headless_app(seed: u64) -> App {
    init_logger();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
        .insert_resource(ScriptedInput::autopilot(seed));

    app
}

/// Headless App с Rapier и SimulationPlugin
///
/// Каждый app.update() продвигает время ровно на один fixed step —
/// результат не зависит от скорости машины.
pub fn create_physics_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins((
        TransformPlugin,
        RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule(),
        SimulationPlugin,
    ))
    .insert_resource(TimeUpdateStrategy::ManualDuration(fixed_timestep()));

    app
}

pub fn fixed_timestep() -> Duration {
    Time::<Fixed>::from_hz(FIXED_HZ).timestep()
}

/// Snapshot компонентов в детерминированном порядке (по Entity index)
pub fn world_snapshot<T>(world: &mut World) -> Vec<u8>
where
    T: Component + std::fmt::Debug,
{
    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(entity, _)| entity.index());

    let mut snapshot = Vec::new();
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
