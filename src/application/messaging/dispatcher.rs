//! Command router - Maps commands to handlers and gates them by the allow-list

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::application::errors::BotError;
use crate::domain::entities::{
    CommandRegistration, CommandRegistry, Content, Handler, InvocationContext, Message, UserId,
};
use crate::domain::traits::{Bot, BotCommand};
use super::parser::MessageParser;

/// Outcome of a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not a command, or no sender to authorize
    Ignored,
    /// No command registered under that name
    Unknown,
    /// Restricted command from a sender outside the allow-list
    Denied(UserId),
    /// Handler ran
    Handled,
}

/// Routes commands through the authorization check to their handlers
pub struct CommandRouter {
    bot: Arc<dyn Bot>,
    authorized_users: HashSet<UserId>,
    registry: CommandRegistry,
    retry_delay: Duration,
}

impl CommandRouter {
    pub fn new(bot: Arc<dyn Bot>, authorized_users: HashSet<UserId>) -> Self {
        Self {
            bot,
            authorized_users,
            registry: CommandRegistry::new(),
            retry_delay: Duration::from_secs(5),
        }
    }

    /// Pause between failed polls
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Register a handler under `name`, replacing any previous one
    pub fn register(&mut self, name: &str, handler: Handler, restricted: bool) {
        self.register_command(CommandRegistration::new(name, handler).restricted(restricted));
    }

    /// Register a command, replacing any previous one with the same name
    pub fn register_command(&mut self, command: CommandRegistration) {
        if command.name.is_empty() {
            tracing::warn!("Ignoring command registration with an empty name");
            return;
        }
        let name = command.name.clone();
        if self.registry.register(command).is_some() {
            tracing::debug!("Replaced handler for /{}", name);
        }
    }

    pub fn is_authorized(&self, user: UserId) -> bool {
        self.authorized_users.contains(&user)
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Run the command `name` for `ctx`
    pub async fn dispatch(&self, name: &str, ctx: InvocationContext) -> Dispatch {
        let name = name.to_lowercase();
        let Some(command) = self.registry.get(&name) else {
            tracing::debug!("[{}] Ignoring unknown command /{}", ctx.chat_id, name);
            return Dispatch::Unknown;
        };

        // Denied senders get no reply at all
        if command.restricted && !self.is_authorized(ctx.sender) {
            tracing::info!(user_id = %ctx.sender, command = %name, "Unauthorized access denied for {}", ctx.sender);
            return Dispatch::Denied(ctx.sender);
        }

        let chat_id = ctx.chat_id;
        tracing::debug!("[{}] Running /{} {:?}", chat_id, name, ctx.args);
        if let Err(e) = command.handler.handle(ctx, self.bot.as_ref()).await {
            tracing::error!("[{}] /{} failed: {}", chat_id, name, e);
        }
        Dispatch::Handled
    }

    /// Parse an inbound message and dispatch it if it is a command
    pub async fn handle_message(&self, message: Message) -> Dispatch {
        match self.route(&message) {
            Some((name, ctx)) => self.dispatch(&name, ctx).await,
            None => Dispatch::Ignored,
        }
    }

    fn route(&self, message: &Message) -> Option<(String, InvocationContext)> {
        let sender = message.sender.as_ref()?.id;

        let content = match &message.content {
            Content::Text(text) => self.parser().parse(text),
            other => other.clone(),
        };

        let Content::Command { name, args } = content else {
            tracing::debug!("[{}] Ignoring non-command message", message.chat_id);
            return None;
        };

        Some((name, InvocationContext::new(sender, message.chat_id, args)))
    }

    fn parser(&self) -> MessageParser {
        let username = self.bot.bot_info().username;
        if username.is_empty() {
            MessageParser::new()
        } else {
            MessageParser::new().with_bot_username(username)
        }
    }

    /// Command menu entries for every registration
    pub fn bot_commands(&self) -> Vec<BotCommand> {
        self.registry
            .all()
            .into_iter()
            .map(|cmd| BotCommand {
                command: cmd.name.clone(),
                description: cmd.description.clone().unwrap_or_else(|| cmd.name.clone()),
            })
            .collect()
    }

    /// Start the transport and serve commands until `shutdown` resolves.
    ///
    /// Each command runs on its own task. On shutdown the in-flight tasks
    /// are awaited, then the transport is stopped.
    pub async fn run<F>(self: Arc<Self>, shutdown: F) -> Result<(), BotError>
    where
        F: Future<Output = ()> + Send,
    {
        self.bot.start().await?;

        let info = self.bot.bot_info();
        tracing::info!("Bot started: @{}", info.username);

        if let Err(e) = self.bot.register_commands(&self.bot_commands()).await {
            tracing::warn!("Failed to register commands: {}", e);
        }

        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        tracing::info!("Starting message loop...");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                polled = self.bot.next_messages() => match polled {
                    Ok(messages) => {
                        if !messages.is_empty() {
                            tracing::debug!("Received {} messages", messages.len());
                        }
                        for message in messages {
                            let router = Arc::clone(&self);
                            tasks.spawn(async move {
                                router.handle_message(message).await;
                            });
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to get updates: {}", e);
                        tokio::select! {
                            _ = &mut shutdown => {
                                tracing::info!("Shutdown requested");
                                break;
                            }
                            _ = tokio::time::sleep(self.retry_delay) => {}
                        }
                    }
                },
            }

            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!("Command task failed: {}", e);
                }
            }
        }

        if !tasks.is_empty() {
            tracing::info!("Waiting for {} running commands", tasks.len());
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Command task failed: {}", e);
            }
        }

        if let Err(e) = self.bot.stop().await {
            tracing::warn!("Failed to stop transport cleanly: {}", e);
        }
        tracing::info!("Bot stopped");
        Ok(())
    }
}
