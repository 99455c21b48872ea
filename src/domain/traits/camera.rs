use async_trait::async_trait;
use std::time::Duration;
use crate::application::errors::CaptureError;

/// Container of the bytes produced by [`Camera::record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    /// MP4, playable inline by Telegram clients
    Mp4,
    /// Raw H.264 elementary stream, delivered as a file
    H264,
}

/// Camera trait - abstraction for the capture backend
///
/// Implementations assume exclusive access; serialization is the job of
/// [`CameraSession`](crate::application::services::CameraSession).
#[async_trait]
pub trait Camera: Send + Sync {
    /// Check the device can be used at all
    async fn probe(&self) -> Result<(), CaptureError>;

    /// Capture one still image, returned as encoded bytes
    async fn capture_still(&self) -> Result<Vec<u8>, CaptureError>;

    /// Record for `duration` of wall-clock time, appending the encoded video to `sink`
    async fn record(&self, duration: Duration, sink: &mut Vec<u8>) -> Result<(), CaptureError>;

    /// Container written by [`record`](Camera::record)
    fn video_format(&self) -> VideoFormat;

    /// Release the device after the last capture
    async fn close(&self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Backend name for logs
    fn name(&self) -> &str;
}
