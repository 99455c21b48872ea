//! Message parser - Turns raw chat text into commands

use crate::domain::entities::Content;

/// Parses incoming text into structured content
pub struct MessageParser {
    bot_username: Option<String>,
}

impl MessageParser {
    pub fn new() -> Self {
        Self { bot_username: None }
    }

    /// Accept `/cmd@username` addressed to this bot
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Parse a text message
    pub fn parse(&self, text: &str) -> Content {
        let text = text.trim();
        if text.is_empty() {
            return Content::Empty;
        }

        if let Some(cmd_text) = text.strip_prefix('/') {
            return self.parse_command(cmd_text).unwrap_or(Content::Empty);
        }

        Content::Text(text.to_string())
    }

    /// Parse the part after the leading slash
    fn parse_command(&self, cmd_text: &str) -> Option<Content> {
        let mut parts = cmd_text.split_whitespace();
        let head = parts.next()?;

        // In groups clients send `/cmd@botname`; anything addressed elsewhere is not ours
        let name = match head.split_once('@') {
            Some((name, target)) => {
                let ours = self
                    .bot_username
                    .as_deref()
                    .is_some_and(|u| u.eq_ignore_ascii_case(target));
                if !ours {
                    return None;
                }
                name
            }
            None => head,
        };

        if name.is_empty() {
            return None;
        }

        Some(Content::Command {
            name: name.to_lowercase(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}
