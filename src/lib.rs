//! telecam - Telegram-controlled camera bot
//!
//! Chat commands are routed through [`CommandRouter`], which checks the
//! sender against the allow-list before running a handler. Camera access is
//! serialized by [`CameraSession`].

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod app;

pub use application::errors::{BotError, CaptureError, ConfigError, SendError};
pub use application::messaging::{CommandRouter, Dispatch};
pub use application::services::{BusyPolicy, CameraSession};
pub use app::{serve, Interrupts};
pub use infrastructure::config::BotConfig;

#[cfg(test)]
pub(crate) mod test_support;
