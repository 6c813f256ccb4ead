//! Ошибки setup/config
//!
//! Runtime-ошибок у контроллера нет: всё что может сломаться, ломается
//! при конструировании и логируется (instance отключается, не паникуем).

use thiserror::Error;

/// Контроллер не может работать без rigid body
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("PlayerMovement requires a rigid body")]
    MissingRigidBody,
}

/// Input service держит ровно один reader
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("input reader already installed, duplicate dropped")]
    DuplicateReader,
}

/// Ошибка загрузки MovementTuning
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tuning: {0}")]
    Parse(#[from] toml::de::Error),
}
