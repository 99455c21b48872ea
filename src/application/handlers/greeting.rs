use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{CommandHandler, InvocationContext};
use crate::domain::traits::Bot;

pub const GREETING: &str = "Hello World!";

pub const HELP_TEXT: &str = "Available commands:\n\
/hello - Say hello\n\
/help - Show this message\n\
/picture, /pic - Take a photo\n\
/video, /vid [seconds] - Record a video (1-60 seconds, default 10)";

/// `/hello`
pub struct HelloHandler;

#[async_trait]
impl CommandHandler for HelloHandler {
    async fn handle(&self, ctx: InvocationContext, bot: &dyn Bot) -> Result<(), BotError> {
        bot.send_message(ctx.chat_id, GREETING).await?;
        Ok(())
    }
}

/// `/help`
pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn handle(&self, ctx: InvocationContext, bot: &dyn Bot) -> Result<(), BotError> {
        bot.send_message(ctx.chat_id, HELP_TEXT).await?;
        Ok(())
    }
}
