//! Fakes shared by the unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::errors::{BotError, CaptureError, SendError};
use crate::domain::entities::{ChatId, Message};
use crate::domain::traits::{Bot, BotCommand, BotInfo, Camera, VideoFormat};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(ChatId, String),
    Photo(ChatId, Vec<u8>),
    Video(ChatId, Vec<u8>, VideoFormat),
}

/// Bot that records everything sent and serves a queue of inbound messages
#[derive(Default)]
pub struct RecordingBot {
    sent: Mutex<Vec<Sent>>,
    inbound: Mutex<VecDeque<Message>>,
    commands: Mutex<Vec<BotCommand>>,
    started: AtomicBool,
    stopped: AtomicBool,
    fail_start: AtomicBool,
    failing_polls: AtomicUsize,
    polls: AtomicUsize,
    sent_at_stop: Mutex<Option<usize>>,
}

impl RecordingBot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `start` fail like a rejected token
    pub fn failing_start(self) -> Self {
        self.fail_start.store(true, Ordering::SeqCst);
        self
    }

    /// Make the next `count` polls fail before any message is handed out
    pub fn fail_polls(&self, count: usize) {
        self.failing_polls.store(count, Ordering::SeqCst);
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// How many items had been sent when the transport was stopped
    pub fn sent_at_stop(&self) -> Option<usize> {
        *self.sent_at_stop.lock().unwrap()
    }

    pub fn push_inbound(&self, message: Message) {
        self.inbound.lock().unwrap().push_back(message);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn registered_commands(&self) -> Vec<BotCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn was_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once every queued inbound message has been handed out
    pub async fn wait_until_drained(&self) {
        while !self.inbound.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Resolves once at least `count` items have been sent
    pub async fn wait_for_sent(&self, count: usize) {
        while self.sent.lock().unwrap().len() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn start(&self) -> Result<(), BotError> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(SendError::api("getMe", 401, "Unauthorized").into());
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn next_messages(&self) -> Result<Vec<Message>, BotError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SendError::Parse("getUpdates: connection reset".to_string()).into());
        }

        let batch: Vec<Message> = self.inbound.lock().unwrap().drain(..).collect();
        if batch.is_empty() {
            return std::future::pending().await;
        }
        Ok(batch)
    }

    async fn stop(&self) -> Result<(), BotError> {
        *self.sent_at_stop.lock().unwrap() = Some(self.sent.lock().unwrap().len());
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn register_commands(&self, commands: &[BotCommand]) -> Result<(), SendError> {
        *self.commands.lock().unwrap() = commands.to_vec();
        Ok(())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), SendError> {
        self.record(Sent::Text(chat_id, text.to_string()));
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, photo: Vec<u8>) -> Result<(), SendError> {
        self.record(Sent::Photo(chat_id, photo));
        Ok(())
    }

    async fn send_video(&self, chat_id: ChatId, video: Vec<u8>, format: VideoFormat) -> Result<(), SendError> {
        self.record(Sent::Video(chat_id, video, format));
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: 1,
            name: "Test".to_string(),
            username: "test_bot".to_string(),
        }
    }
}

#[derive(Default)]
struct ProbeState {
    active: AtomicBool,
    overlapped: AtomicBool,
    operations: Mutex<Vec<&'static str>>,
    recorded: Mutex<Vec<Duration>>,
}

/// Observes what a [`FakeCamera`] was asked to do
#[derive(Clone, Default)]
pub struct CameraProbe(Arc<ProbeState>);

impl CameraProbe {
    fn begin(&self, operation: &'static str) {
        self.0.operations.lock().unwrap().push(operation);
        if self.0.active.swap(true, Ordering::SeqCst) {
            self.0.overlapped.store(true, Ordering::SeqCst);
        }
    }

    fn end(&self) {
        self.0.active.store(false, Ordering::SeqCst);
    }

    /// Whether two operations were ever in flight at once
    pub fn overlapped(&self) -> bool {
        self.0.overlapped.load(Ordering::SeqCst)
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.0.operations.lock().unwrap().clone()
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.0.recorded.lock().unwrap().clone()
    }
}

/// Camera that returns canned bytes after a fixed latency
pub struct FakeCamera {
    still: Vec<u8>,
    latency: Duration,
    failing: bool,
    unavailable: bool,
    video_format: VideoFormat,
    probe: CameraProbe,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            still: b"\xff\xd8fake-jpeg".to_vec(),
            latency: Duration::ZERO,
            failing: false,
            unavailable: false,
            video_format: VideoFormat::Mp4,
            probe: CameraProbe::default(),
        }
    }

    pub fn with_still(mut self, still: Vec<u8>) -> Self {
        self.still = still;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn with_video_format(mut self, format: VideoFormat) -> Self {
        self.video_format = format;
        self
    }

    pub fn probe_handle(&self) -> CameraProbe {
        self.probe.clone()
    }

    fn failure() -> CaptureError {
        CaptureError::Io(io::Error::new(io::ErrorKind::Other, "sensor timeout"))
    }
}

#[async_trait]
impl Camera for FakeCamera {
    async fn probe(&self) -> Result<(), CaptureError> {
        if self.unavailable {
            return Err(CaptureError::Unavailable {
                program: "fake-camera".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "not found on PATH"),
            });
        }
        Ok(())
    }

    async fn capture_still(&self) -> Result<Vec<u8>, CaptureError> {
        self.probe.begin("still");
        tokio::time::sleep(self.latency).await;
        self.probe.end();
        if self.failing {
            return Err(Self::failure());
        }
        Ok(self.still.clone())
    }

    async fn record(&self, duration: Duration, sink: &mut Vec<u8>) -> Result<(), CaptureError> {
        self.probe.begin("record");
        self.probe.0.recorded.lock().unwrap().push(duration);
        tokio::time::sleep(self.latency).await;
        self.probe.end();
        if self.failing {
            return Err(Self::failure());
        }
        sink.extend_from_slice(format!("video:{}s", duration.as_secs()).as_bytes());
        Ok(())
    }

    fn video_format(&self) -> VideoFormat {
        self.video_format
    }

    async fn close(&self) -> Result<(), CaptureError> {
        self.probe.0.operations.lock().unwrap().push("close");
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` on a fresh runtime and return what it logged at info level and above
pub fn capture_logs<F, Fut, T>(f: F) -> (T, String)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let result = tracing::subscriber::with_default(subscriber, || rt.block_on(f()));

    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, logs)
}
