//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod camera;

pub use bot::{Bot, BotCommand, BotInfo};
pub use camera::{Camera, VideoFormat};
