use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::errors::BotError;
use crate::domain::entities::InvocationContext;
use crate::domain::traits::Bot;

/// A chat command implementation
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command. Replies go out through `bot`.
    async fn handle(&self, ctx: InvocationContext, bot: &dyn Bot) -> Result<(), BotError>;
}

pub type Handler = Arc<dyn CommandHandler>;

/// Represents a registered bot command
#[derive(Clone)]
pub struct CommandRegistration {
    pub name: String,
    pub description: Option<String>,
    pub handler: Handler,
    pub restricted: bool,
}

impl CommandRegistration {
    /// New registration. Commands are restricted unless stated otherwise.
    pub fn new(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into().to_lowercase(),
            description: None,
            handler,
            restricted: true,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn restricted(mut self, restricted: bool) -> Self {
        self.restricted = restricted;
        self
    }
}

impl std::fmt::Debug for CommandRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("restricted", &self.restricted)
            .finish_non_exhaustive()
    }
}

/// Command registry keyed by name. Registering a name again replaces it.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandRegistration>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the registration that was replaced
    pub fn register(&mut self, command: CommandRegistration) -> Option<CommandRegistration> {
        self.commands.insert(command.name.clone(), command)
    }

    pub fn get(&self, name: &str) -> Option<&CommandRegistration> {
        self.commands.get(name)
    }

    /// Registrations sorted by name
    pub fn all(&self) -> Vec<&CommandRegistration> {
        let mut all: Vec<_> = self.commands.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
