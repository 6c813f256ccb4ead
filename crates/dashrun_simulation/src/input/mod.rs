//! Input domain
//!
//! # Архитектура
//!
//! ```text
//! InputSource (keyboard / scripted)
//!     ↓ update() раз в frame
//! InputReader (оси + jump edge detection)
//!     ├─→ horizontal/vertical (читает MovementController в fixed step)
//!     └─→ EventBus::raise(PlayerJump)
//! ```
//!
//! InputReader живёт в InputService (один на App).

pub mod keyboard;
pub mod reader;
pub mod scripted;
pub mod service;

pub use keyboard::KeyboardSource;
pub use reader::{InputAxis, InputReader, InputSource};
pub use scripted::ScriptedInput;
pub use service::InputService;
