//! Movement domain — контроллер игрока и его tunables
//!
//! Содержит:
//! - MovementController (fixed step логика + jump subscriber)
//! - RigidBodyHandle / GroundProbe (capabilities движка)
//! - MovementTuning (authoring-time конфиг)

pub mod controller;
pub mod tuning;


pub use controller::{
    classify_ground, ForceMode, GroundProbe, MovementController, RayHit, RigidBodyHandle, StepOutcome,
};
pub use tuning::{MovementTuning, DEATH_HEIGHT};
