//! Application layer errors

use std::path::PathBuf;
use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Interrupted while commands were still running")]
    Interrupted,
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration: pass --config (or set TELECAM_CONFIG), or both --token and --authorized-user")]
    MissingSource,

    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Camera failures, reported back to the chat by the handlers
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("camera is busy")]
    Busy,

    #[error("camera program `{program}` is not available: {source}")]
    Unavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("camera produced no data")]
    Empty,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Messaging failures. Logged, never retried.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Telegram API error in {method} ({status}): {description}")]
    Api {
        method: String,
        status: u16,
        description: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl SendError {
    pub fn api(method: &str, status: u16, description: impl Into<String>) -> Self {
        SendError::Api {
            method: method.to_string(),
            status,
            description: description.into(),
        }
    }
}
