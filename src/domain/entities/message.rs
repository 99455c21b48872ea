use super::{ChatId, User, UserId};
use chrono::{DateTime, Utc};

/// Message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Command { name: String, args: Vec<String> },
    Empty,
}

/// Represents an incoming message
#[derive(Debug, Clone)]
pub struct Message {
    pub id: i64,
    pub chat_id: ChatId,
    pub sender: Option<User>,
    pub content: Content,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(id: i64, chat_id: ChatId, content: Content) -> Self {
        Self {
            id,
            chat_id,
            sender: None,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn from_text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self::new(0, chat_id, Content::Text(text.into()))
    }

    pub fn with_sender(mut self, user: User) -> Self {
        self.sender = Some(user);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// What a handler gets to see of the message that invoked it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub sender: UserId,
    pub chat_id: ChatId,
    pub args: Vec<String>,
}

impl InvocationContext {
    pub fn new(sender: UserId, chat_id: ChatId, args: Vec<String>) -> Self {
        Self { sender, chat_id, args }
    }

    /// Argument at `index`, if any
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}
