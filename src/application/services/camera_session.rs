use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use crate::application::errors::CaptureError;
use crate::domain::traits::{Camera, VideoFormat};

/// What to do when a capture is requested while another one is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusyPolicy {
    /// Queue behind the running capture
    #[default]
    Wait,
    /// Fail immediately with [`CaptureError::Busy`]
    Reject,
}

/// Exclusive access to the one physical camera.
///
/// Every still and every recording holds the lock for its whole duration.
pub struct CameraSession {
    camera: Mutex<Box<dyn Camera>>,
    policy: BusyPolicy,
    video_format: VideoFormat,
}

impl CameraSession {
    /// Probe the backend and take ownership of it
    pub async fn open(camera: Box<dyn Camera>, policy: BusyPolicy) -> Result<Self, CaptureError> {
        camera.probe().await?;
        tracing::info!("Camera opened ({}, busy policy {:?})", camera.name(), policy);
        let video_format = camera.video_format();
        Ok(Self {
            camera: Mutex::new(camera),
            policy,
            video_format,
        })
    }

    /// Container of recorded videos
    pub fn video_format(&self) -> VideoFormat {
        self.video_format
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, Box<dyn Camera>>, CaptureError> {
        match self.policy {
            BusyPolicy::Reject => self.camera.try_lock().map_err(|_| CaptureError::Busy),
            BusyPolicy::Wait => {
                if let Ok(guard) = self.camera.try_lock() {
                    return Ok(guard);
                }
                tracing::debug!("Camera busy, waiting");
                Ok(self.camera.lock().await)
            }
        }
    }

    pub async fn capture_still(&self) -> Result<Vec<u8>, CaptureError> {
        let camera = self.acquire().await?;
        let image = camera.capture_still().await?;
        if image.is_empty() {
            return Err(CaptureError::Empty);
        }
        tracing::debug!("Captured still ({} bytes)", image.len());
        Ok(image)
    }

    pub async fn record(&self, duration: Duration, sink: &mut Vec<u8>) -> Result<(), CaptureError> {
        let camera = self.acquire().await?;
        let before = sink.len();
        camera.record(duration, sink).await?;
        if sink.len() == before {
            return Err(CaptureError::Empty);
        }
        tracing::debug!("Recorded {:?} ({} bytes)", duration, sink.len() - before);
        Ok(())
    }

    /// Release the camera. Taking `self` guarantees no capture is in flight.
    pub async fn close(self) {
        let camera = self.camera.into_inner();
        match camera.close().await {
            Ok(()) => tracing::info!("Camera closed ({})", camera.name()),
            Err(e) => tracing::warn!("Failed to close camera ({}): {}", camera.name(), e),
        }
    }
}
