//! Startup wiring - camera, router and transport for one bot session

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::application::errors::BotError;
use crate::application::handlers;
use crate::application::messaging::CommandRouter;
use crate::application::services::CameraSession;
use crate::domain::traits::{Bot, Camera};
use crate::infrastructure::config::BotConfig;

/// Count of interrupts (Ctrl-C, SIGTERM) received so far
pub type Interrupts = watch::Receiver<u32>;

/// Resolves once `count` interrupts have arrived. Never resolves if the sender is gone first.
async fn interrupted(mut interrupts: Interrupts, count: u32) {
    let reached = interrupts.wait_for(|received| *received >= count).await.map(|_| ());
    if reached.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Serve commands on `bot` until interrupted.
///
/// The first interrupt stops polling and lets running commands finish, then
/// the transport and the camera are released. A second interrupt abandons
/// the running commands, killing any capture process, and returns
/// [`BotError::Interrupted`].
pub async fn serve(
    config: &BotConfig,
    bot: Arc<dyn Bot>,
    camera: Box<dyn Camera>,
    interrupts: Interrupts,
) -> Result<(), BotError> {
    let camera = Arc::new(CameraSession::open(camera, config.camera.busy_policy).await?);

    let mut router = CommandRouter::new(bot, config.authorized_users.iter().copied().collect())
        .with_retry_delay(Duration::from_secs(config.polling.retry_delay_secs));
    handlers::register_defaults(&mut router, camera.clone());

    let run = Arc::new(router).run(interrupted(interrupts.clone(), 1));
    let result = tokio::select! {
        result = run => result,
        _ = interrupted(interrupts, 2) => {
            tracing::warn!("Interrupted again, abandoning running commands");
            return Err(BotError::Interrupted);
        }
    };

    // `run` consumed the router, so its handlers and their camera handles are gone
    match Arc::try_unwrap(camera) {
        Ok(session) => session.close().await,
        Err(_) => tracing::warn!("Camera still referenced at shutdown"),
    }

    result
}
