//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::application::errors::ConfigError;
use crate::application::services::BusyPolicy;
use crate::domain::entities::UserId;

/// Bot configuration. Loaded once at startup and never changed afterwards.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    pub token: String,
    pub authorized_users: BTreeSet<UserId>,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraBackend {
    /// libcamera based `rpicam-still` / `rpicam-vid`
    #[default]
    Rpicam,
    /// Legacy firmware `raspistill` / `raspivid`
    Raspi,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct CameraConfig {
    pub backend: CameraBackend,
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    /// Sensor settle time before a still is taken
    pub still_timeout_ms: u64,
    /// Text burned into video frames (raspi backend only, strftime escapes allowed)
    pub annotate: Option<String>,
    pub busy_policy: BusyPolicy,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: CameraBackend::Rpicam,
            width: 1280,
            height: 720,
            framerate: 30,
            still_timeout_ms: 1000,
            annotate: None,
            busy_policy: BusyPolicy::Wait,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PollingConfig {
    pub timeout_secs: u64,
    pub retry_delay_secs: u64,
    pub api_base: String,
    /// Skip commands that queued up while the bot was offline
    pub drop_pending_updates: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_delay_secs: 5,
            api_base: "https://api.telegram.org".to_string(),
            drop_pending_updates: false,
        }
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("authorized_users", &self.authorized_users)
            .field("camera", &self.camera)
            .field("polling", &self.polling)
            .finish()
    }
}

impl BotConfig {
    /// Config from an explicit token and allow-list
    pub fn new(token: impl Into<String>, authorized_users: impl IntoIterator<Item = i64>) -> Result<Self, ConfigError> {
        Self {
            token: token.into(),
            authorized_users: authorized_users.into_iter().map(UserId).collect(),
            camera: CameraConfig::default(),
            polling: PollingConfig::default(),
        }
        .validated()
    }

    /// Read a config file. `.yaml` / `.yml` files are YAML, anything else JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let parsed = if is_yaml {
            serde_yaml::from_str::<Self>(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str::<Self>(&content).map_err(|e| e.to_string())
        };

        parsed
            .map_err(|reason| ConfigError::Parse {
                path: path.to_path_buf(),
                reason,
            })?
            .validated()
    }

    /// Pick the config source for startup.
    ///
    /// A config file wins; `token` then overrides the file's token. Without a
    /// file, an explicit token is required.
    pub fn resolve(
        path: Option<&Path>,
        token: Option<String>,
        authorized_users: &[i64],
    ) -> Result<Self, ConfigError> {
        match (path, token) {
            (Some(path), token) => {
                let mut config = Self::load(path)?;
                if let Some(token) = token {
                    config.token = token;
                }
                config.authorized_users.extend(authorized_users.iter().copied().map(UserId));
                config.validated()
            }
            (None, Some(token)) => Self::new(token, authorized_users.iter().copied()),
            (None, None) => Err(ConfigError::MissingSource),
        }
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        self.token = self.token.trim().to_string();
        if self.token.is_empty() {
            return Err(ConfigError::InvalidValue("token must not be empty".to_string()));
        }
        if self.token.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue("token must not contain whitespace".to_string()));
        }
        if self.polling.api_base.is_empty() {
            return Err(ConfigError::InvalidValue("polling.api_base must not be empty".to_string()));
        }
        if self.camera.width == 0 || self.camera.height == 0 || self.camera.framerate == 0 {
            return Err(ConfigError::InvalidValue(
                "camera width, height and framerate must be positive".to_string(),
            ));
        }
        if self.authorized_users.is_empty() {
            tracing::warn!("authorized_users is empty, every restricted command will be denied");
        }
        Ok(self)
    }

    /// Starting point written by `init-config`
    pub fn template() -> Self {
        Self {
            token: "123456:REPLACE-WITH-BOT-TOKEN".to_string(),
            authorized_users: BTreeSet::from([UserId(42)]),
            camera: CameraConfig::default(),
            polling: PollingConfig::default(),
        }
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("telecam.json")
    }
}
