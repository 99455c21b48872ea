//! Telegram adapter

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use crate::application::errors::{BotError, SendError};
use crate::domain::entities::{self, ChatId, Content};
use crate::domain::traits::{Bot, BotCommand, BotInfo, VideoFormat};
use crate::infrastructure::config::PollingConfig;

/// Slack on top of the long-poll timeout before the HTTP request gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

/// How a recording is uploaded: Bot API method, form field, file name and MIME type.
///
/// Raw H.264 is not a container Telegram plays, so it goes out as a document.
fn video_upload(format: VideoFormat) -> (&'static str, &'static str, &'static str, &'static str) {
    match format {
        VideoFormat::Mp4 => ("sendVideo", "video", "video.mp4", "video/mp4"),
        VideoFormat::H264 => ("sendDocument", "document", "video.h264", "video/h264"),
    }
}

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl From<User> for entities::User {
    fn from(user: User) -> Self {
        entities::User {
            id: entities::UserId(user.id),
            username: user.username,
            first_name: user.first_name,
            is_bot: user.is_bot,
        }
    }
}

impl Message {
    /// Domain view of a text message; other message kinds are dropped
    pub fn into_domain(self) -> Option<entities::Message> {
        let text = self.text?;
        let timestamp = chrono::DateTime::from_timestamp(self.date, 0).unwrap_or_else(chrono::Utc::now);

        let mut message = entities::Message::new(self.message_id, ChatId(self.chat.id), Content::Text(text))
            .with_timestamp(timestamp);
        if let Some(from) = self.from {
            message = message.with_sender(from.into());
        }
        Some(message)
    }
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    polling: PollingConfig,
    info: RwLock<BotInfo>,
    offset: AtomicI64,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>, polling: PollingConfig) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            polling,
            info: RwLock::new(BotInfo::default()),
            offset: AtomicI64::new(0),
        }
    }

    /// First characters of the token, for logs
    fn token_hint(&self) -> String {
        self.token.chars().take(8).collect()
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.polling.api_base.trim_end_matches('/'), self.token, method)
    }

    /// Decode a Bot API response body
    fn parse_body<T: DeserializeOwned>(method: &str, status: u16, body: &str) -> Result<T, SendError> {
        let parsed: ApiResponse<T> = match serde_json::from_str(body) {
            Ok(parsed) => parsed,
            Err(_) if !(200..300).contains(&status) => {
                return Err(SendError::api(method, status, body.chars().take(200).collect::<String>()));
            }
            Err(e) => return Err(SendError::Parse(format!("{}: {}", method, e))),
        };

        if !parsed.ok {
            return Err(SendError::api(method, status, parsed.description.unwrap_or_default()));
        }
        parsed
            .result
            .ok_or_else(|| SendError::Parse(format!("{} returned no result", method)))
    }

    async fn read_response<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<T, SendError> {
        let status = response.status().as_u16();
        // The request URL carries the token, keep it out of errors
        let body = response.text().await.map_err(|e| SendError::Network(e.without_url()))?;
        Self::parse_body(method, status, &body)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, SendError> {
        let mut request = self.client.post(self.api_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(|e| SendError::Network(e.without_url()))?;
        Self::read_response(method, response).await
    }

    async fn post_multipart<T: DeserializeOwned>(&self, method: &str, form: Form) -> Result<T, SendError> {
        let response = self
            .client
            .post(self.api_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SendError::Network(e.without_url()))?;
        Self::read_response(method, response).await
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&self) -> Result<BotInfo, SendError> {
        #[derive(Deserialize)]
        struct Me {
            id: i64,
            first_name: String,
            username: Option<String>,
        }

        let me: Me = self.post_json("getMe", &serde_json::json!({}), None).await?;
        let info = BotInfo {
            id: me.id,
            name: me.first_name,
            username: me.username.unwrap_or_default(),
        };
        if let Ok(mut slot) = self.info.write() {
            *slot = info.clone();
        }
        Ok(info)
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: u64) -> Result<Vec<Update>, SendError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest<'a> {
            offset: i64,
            timeout: u64,
            allowed_updates: &'a [&'a str],
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: &["message"],
        };
        self.post_json("getUpdates", &request, Some(Duration::from_secs(timeout) + POLL_GRACE))
            .await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter().map(|u| u.update_id + 1).max()
    }

    /// Skip everything queued while the bot was offline
    async fn drop_pending_updates(&self) -> Result<(), SendError> {
        let pending = self.get_updates(-1, 0).await?;
        if let Some(next) = Self::get_next_offset(&pending) {
            self.offset.store(next, Ordering::SeqCst);
            tracing::info!("Dropped pending updates up to {}", next - 1);
        }
        Ok(())
    }

    async fn send_media(&self, method: &str, field: &str, chat_id: ChatId, part: Part) -> Result<(), SendError> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(field.to_string(), part);
        let _: serde_json::Value = self.post_multipart(method, form).await?;
        Ok(())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Telegram bot (token: {}...)", self.token_hint());
        self.fetch_bot_info().await?;
        if self.polling.drop_pending_updates {
            self.drop_pending_updates().await?;
        }
        Ok(())
    }

    async fn next_messages(&self) -> Result<Vec<entities::Message>, BotError> {
        let offset = self.offset.load(Ordering::SeqCst);
        let updates = self.get_updates(offset, self.polling.timeout_secs).await?;
        if let Some(next) = Self::get_next_offset(&updates) {
            self.offset.store(next, Ordering::SeqCst);
        }

        Ok(updates
            .into_iter()
            .filter_map(|u| u.message)
            .filter_map(Message::into_domain)
            .collect())
    }

    async fn stop(&self) -> Result<(), BotError> {
        // Confirm the processed updates so a restart does not replay them
        let offset = self.offset.load(Ordering::SeqCst);
        if offset > 0 {
            let _ = self.get_updates(offset, 0).await?;
        }
        tracing::info!("Telegram polling stopped");
        Ok(())
    }

    async fn register_commands(&self, commands: &[BotCommand]) -> Result<(), SendError> {
        #[derive(Serialize)]
        struct Command<'a> {
            command: &'a str,
            description: &'a str,
        }

        let commands: Vec<Command> = commands
            .iter()
            .map(|c| Command {
                command: &c.command,
                description: &c.description,
            })
            .collect();

        let _: bool = self
            .post_json("setMyCommands", &serde_json::json!({ "commands": commands }), None)
            .await?;
        tracing::info!("Registered bot commands with Telegram");
        Ok(())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), SendError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);
        let _: serde_json::Value = self
            .post_json(
                "sendMessage",
                &serde_json::json!({ "chat_id": chat_id.0, "text": text }),
                None,
            )
            .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, photo: Vec<u8>) -> Result<(), SendError> {
        tracing::debug!("Sending photo to {} ({} bytes)", chat_id, photo.len());
        let part = Part::bytes(photo).file_name("picture.jpg").mime_str("image/jpeg")?;
        self.send_media("sendPhoto", "photo", chat_id, part).await
    }

    async fn send_video(&self, chat_id: ChatId, video: Vec<u8>, format: VideoFormat) -> Result<(), SendError> {
        tracing::debug!("Sending {:?} video to {} ({} bytes)", format, chat_id, video.len());
        let (method, field, file_name, mime) = video_upload(format);
        let part = Part::bytes(video).file_name(file_name).mime_str(mime)?;
        self.send_media(method, field, chat_id, part).await
    }

    fn bot_info(&self) -> BotInfo {
        self.info.read().map(|info| info.clone()).unwrap_or_default()
    }
}
