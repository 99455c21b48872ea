use async_trait::async_trait;
use std::num::IntErrorKind;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::{BotError, CaptureError};
use crate::application::services::CameraSession;
use crate::domain::entities::{ChatId, CommandHandler, InvocationContext};
use crate::domain::traits::Bot;

pub const DEFAULT_VIDEO_SECS: u64 = 10;
pub const MIN_VIDEO_SECS: u64 = 1;
pub const MAX_VIDEO_SECS: u64 = 60;

pub const BUSY_TEXT: &str = "camera busy, try again shortly";
pub const VIDEO_DONE_TEXT: &str = "video done";

/// Effective recording length for the `/video` argument.
///
/// Absent or non-numeric input falls back to the default; integers of any
/// size are clamped to `[MIN_VIDEO_SECS, MAX_VIDEO_SECS]`.
pub fn video_duration(arg: Option<&str>) -> u64 {
    let Some(arg) = arg else {
        return DEFAULT_VIDEO_SECS;
    };
    match arg.trim().parse::<i64>() {
        Ok(secs) => secs.clamp(MIN_VIDEO_SECS as i64, MAX_VIDEO_SECS as i64) as u64,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => MAX_VIDEO_SECS,
            IntErrorKind::NegOverflow => MIN_VIDEO_SECS,
            _ => DEFAULT_VIDEO_SECS,
        },
    }
}

async fn report_failure(bot: &dyn Bot, chat_id: ChatId, action: &str, err: &CaptureError) -> Result<(), BotError> {
    let text = match err {
        CaptureError::Busy => BUSY_TEXT.to_string(),
        _ => {
            tracing::error!("[{}] Failed to {}: {}", chat_id, action, err);
            format!("Failed to {}: {}", action, err)
        }
    };
    bot.send_message(chat_id, &text).await?;
    Ok(())
}

/// `/picture`, `/pic`
pub struct PictureHandler {
    camera: Arc<CameraSession>,
}

impl PictureHandler {
    pub fn new(camera: Arc<CameraSession>) -> Self {
        Self { camera }
    }
}

#[async_trait]
impl CommandHandler for PictureHandler {
    async fn handle(&self, ctx: InvocationContext, bot: &dyn Bot) -> Result<(), BotError> {
        match self.camera.capture_still().await {
            Ok(image) => bot.send_photo(ctx.chat_id, image).await?,
            Err(e) => report_failure(bot, ctx.chat_id, "take picture", &e).await?,
        }
        Ok(())
    }
}

/// `/video [seconds]`, `/vid [seconds]`
pub struct VideoHandler {
    camera: Arc<CameraSession>,
}

impl VideoHandler {
    pub fn new(camera: Arc<CameraSession>) -> Self {
        Self { camera }
    }
}

#[async_trait]
impl CommandHandler for VideoHandler {
    async fn handle(&self, ctx: InvocationContext, bot: &dyn Bot) -> Result<(), BotError> {
        let secs = video_duration(ctx.arg(0));
        bot.send_message(ctx.chat_id, &format!("recording {}-second video", secs)).await?;

        let mut buffer = Vec::new();
        if let Err(e) = self.camera.record(Duration::from_secs(secs), &mut buffer).await {
            return report_failure(bot, ctx.chat_id, "record video", &e).await;
        }

        bot.send_video(ctx.chat_id, buffer, self.camera.video_format()).await?;
        bot.send_message(ctx.chat_id, VIDEO_DONE_TEXT).await?;
        Ok(())
    }
}
