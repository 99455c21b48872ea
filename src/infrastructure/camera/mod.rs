//! Camera backends driving the Raspberry Pi camera tools as child processes
//!
//! - **rpicam** (`rpicam-still`, `rpicam-vid`): libcamera stack, current
//!   Raspberry Pi OS. Videos are muxed to MP4 through a temporary file.
//! - **raspi** (`raspistill`, `raspivid`): legacy firmware stack. Writes to
//!   stdout; supports burned-in annotation text, refreshed every frame.
//!   `raspivid` has no muxer, so its videos are raw H.264.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::application::errors::CaptureError;
use crate::domain::traits::{Camera, VideoFormat};
use crate::infrastructure::config::{CameraBackend, CameraConfig};

/// Stderr kept in error messages
const STDERR_TAIL: usize = 400;

/// Camera driven through the vendor command line tools
pub struct ProcessCamera {
    config: CameraConfig,
}

impl ProcessCamera {
    pub fn new(config: CameraConfig) -> Self {
        if config.annotate.is_some() && config.backend == CameraBackend::Rpicam {
            tracing::warn!("camera.annotate is only supported by the raspi backend, ignoring it");
        }
        Self { config }
    }

    fn still_program(&self) -> &'static str {
        match self.config.backend {
            CameraBackend::Rpicam => "rpicam-still",
            CameraBackend::Raspi => "raspistill",
        }
    }

    fn video_program(&self) -> &'static str {
        match self.config.backend {
            CameraBackend::Rpicam => "rpicam-vid",
            CameraBackend::Raspi => "raspivid",
        }
    }

    /// Arguments for a JPEG still written to stdout
    fn still_args(&self) -> Vec<String> {
        let c = &self.config;
        match c.backend {
            CameraBackend::Rpicam => vec![
                "--nopreview".into(),
                "--timeout".into(),
                c.still_timeout_ms.to_string(),
                "--width".into(),
                c.width.to_string(),
                "--height".into(),
                c.height.to_string(),
                "--encoding".into(),
                "jpg".into(),
                "--output".into(),
                "-".into(),
            ],
            CameraBackend::Raspi => vec![
                "-n".into(),
                "-t".into(),
                c.still_timeout_ms.to_string(),
                "-w".into(),
                c.width.to_string(),
                "-h".into(),
                c.height.to_string(),
                "-e".into(),
                "jpg".into(),
                "-o".into(),
                "-".into(),
            ],
        }
    }

    /// Arguments for a recording of `duration` written to `output`
    fn video_args(&self, duration: Duration, output: &str) -> Vec<String> {
        let c = &self.config;
        let millis = duration.as_millis().to_string();
        match c.backend {
            CameraBackend::Rpicam => vec![
                "--nopreview".into(),
                "--timeout".into(),
                millis,
                "--width".into(),
                c.width.to_string(),
                "--height".into(),
                c.height.to_string(),
                "--framerate".into(),
                c.framerate.to_string(),
                "--codec".into(),
                "libav".into(),
                "--libav-format".into(),
                "mp4".into(),
                "--output".into(),
                output.into(),
            ],
            CameraBackend::Raspi => {
                let mut args: Vec<String> = vec![
                    "-n".into(),
                    "-t".into(),
                    millis,
                    "-w".into(),
                    c.width.to_string(),
                    "-h".into(),
                    c.height.to_string(),
                    "-fps".into(),
                    c.framerate.to_string(),
                ];
                if let Some(text) = &c.annotate {
                    args.push("-a".into());
                    args.push(text.clone());
                }
                args.push("-o".into());
                args.push(output.into());
                args
            }
        }
    }
}

/// Run a capture program to completion and collect its stdout
async fn run_capture(program: &str, args: &[String]) -> Result<Vec<u8>, CaptureError> {
    tracing::debug!(program, ?args, "starting capture");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| spawn_error(program, source))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        let tail_start = stderr
            .char_indices()
            .rev()
            .nth(STDERR_TAIL)
            .map(|(i, _)| i)
            .unwrap_or(0);
        return Err(CaptureError::Failed {
            program: program.to_string(),
            status: output.status,
            stderr: stderr[tail_start..].to_string(),
        });
    }

    Ok(output.stdout)
}

fn spawn_error(program: &str, source: std::io::Error) -> CaptureError {
    if source.kind() == std::io::ErrorKind::NotFound {
        CaptureError::Unavailable {
            program: program.to_string(),
            source,
        }
    } else {
        CaptureError::Io(source)
    }
}

/// Check if a command exists on the system PATH.
async fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[async_trait]
impl Camera for ProcessCamera {
    async fn probe(&self) -> Result<(), CaptureError> {
        for program in [self.still_program(), self.video_program()] {
            if !command_exists(program).await {
                return Err(CaptureError::Unavailable {
                    program: program.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found on PATH"),
                });
            }
        }
        Ok(())
    }

    async fn capture_still(&self) -> Result<Vec<u8>, CaptureError> {
        run_capture(self.still_program(), &self.still_args()).await
    }

    async fn record(&self, duration: Duration, sink: &mut Vec<u8>) -> Result<(), CaptureError> {
        match self.config.backend {
            CameraBackend::Raspi => {
                let video = run_capture(self.video_program(), &self.video_args(duration, "-")).await?;
                sink.extend_from_slice(&video);
            }
            CameraBackend::Rpicam => {
                // The MP4 muxer needs a seekable output
                let file = tempfile::Builder::new()
                    .prefix("telecam-")
                    .suffix(".mp4")
                    .tempfile()?;
                let path = file.path().to_string_lossy().into_owned();
                run_capture(self.video_program(), &self.video_args(duration, &path)).await?;
                sink.extend_from_slice(&tokio::fs::read(file.path()).await?);
            }
        }
        Ok(())
    }

    fn video_format(&self) -> VideoFormat {
        match self.config.backend {
            CameraBackend::Rpicam => VideoFormat::Mp4,
            CameraBackend::Raspi => VideoFormat::H264,
        }
    }

    fn name(&self) -> &str {
        match self.config.backend {
            CameraBackend::Rpicam => "rpicam",
            CameraBackend::Raspi => "raspi",
        }
    }
}
