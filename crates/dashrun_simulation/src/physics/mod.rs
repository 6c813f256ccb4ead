//! Physics adapter — Bevy + Rapier реализация capabilities контроллера
//!
//! - body: BodyCommands (RigidBodyHandle → ExternalForce/ExternalImpulse/Velocity)
//! - ground: RapierGroundProbe (GroundProbe → RapierContext::cast_ray)
//! - layers: collision layers (player / ground / obstacles)
//! - plugin: PlayerControllerPlugin, системы Update/FixedUpdate, spawn helpers

pub mod body;
pub mod ground;
pub mod layers;
pub mod plugin;

pub use body::BodyCommands;
pub use ground::RapierGroundProbe;
pub use plugin::{
    attach_controllers, detach_controllers, poll_input, spawn_ground, spawn_player, step_controllers,
    sync_activation, ControllerRegistry, GroundContact, PlayerController, PlayerControllerPlugin, PlayerDied,
    PlayerJumped,
};
