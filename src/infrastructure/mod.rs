//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Adapters: Platform integrations (Telegram)
//! - Camera: Capture backends
//! - Logging: Subscriber setup

pub mod config;
pub mod adapters;
pub mod camera;
pub mod logging;
