use async_trait::async_trait;
use crate::domain::entities::{ChatId, Message};
use crate::application::errors::{BotError, SendError};
use super::VideoFormat;

/// Bot trait - abstraction for the messaging platform
#[async_trait]
pub trait Bot: Send + Sync {
    /// Open the transport connection
    async fn start(&self) -> Result<(), BotError>;

    /// Wait for the next batch of inbound messages (long poll)
    async fn next_messages(&self) -> Result<Vec<Message>, BotError>;

    /// Release the transport connection
    async fn stop(&self) -> Result<(), BotError>;

    /// Publish the command list to the platform
    async fn register_commands(&self, commands: &[BotCommand]) -> Result<(), SendError>;

    /// Send a message to a chat
    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), SendError>;

    /// Send a JPEG image held in memory
    async fn send_photo(&self, chat_id: ChatId, photo: Vec<u8>) -> Result<(), SendError>;

    /// Send a video held in memory, encoded as `format`
    async fn send_video(&self, chat_id: ChatId, video: Vec<u8>, format: VideoFormat) -> Result<(), SendError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Command shown in the client's command menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

/// Bot information
#[derive(Debug, Clone, Default)]
pub struct BotInfo {
    pub id: i64,
    pub name: String,
    pub username: String,
}
