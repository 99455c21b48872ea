//! End-to-end command flow tests
//! Run with: cargo test --test command_flow_test

use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use telecam::application::handlers;
use telecam::domain::entities::{ChatId, Message, User};
use telecam::domain::traits::{Bot, BotCommand, BotInfo, Camera, VideoFormat};
use telecam::{BotConfig, BotError, BusyPolicy, CameraSession, CaptureError, CommandRouter, Dispatch, SendError};

#[derive(Debug, Clone, PartialEq)]
enum Out {
    Text(ChatId, String),
    Photo(ChatId),
    Video(ChatId, Vec<u8>),
}

#[derive(Default)]
struct ChatLog {
    out: Mutex<Vec<Out>>,
}

impl ChatLog {
    fn out(&self) -> Vec<Out> {
        self.out.lock().unwrap().clone()
    }
}

#[async_trait]
impl Bot for ChatLog {
    async fn start(&self) -> Result<(), BotError> {
        Ok(())
    }

    async fn next_messages(&self) -> Result<Vec<Message>, BotError> {
        std::future::pending().await
    }

    async fn stop(&self) -> Result<(), BotError> {
        Ok(())
    }

    async fn register_commands(&self, _commands: &[BotCommand]) -> Result<(), SendError> {
        Ok(())
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), SendError> {
        self.out.lock().unwrap().push(Out::Text(chat_id, text.to_string()));
        Ok(())
    }

    async fn send_photo(&self, chat_id: ChatId, _photo: Vec<u8>) -> Result<(), SendError> {
        self.out.lock().unwrap().push(Out::Photo(chat_id));
        Ok(())
    }

    async fn send_video(&self, chat_id: ChatId, video: Vec<u8>, _format: VideoFormat) -> Result<(), SendError> {
        self.out.lock().unwrap().push(Out::Video(chat_id, video));
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: 1,
            name: "Telecam".to_string(),
            username: "telecam_bot".to_string(),
        }
    }
}

/// Camera that takes `latency` per operation and flags overlapping use
#[derive(Default)]
struct SlowCamera {
    latency: Duration,
    busy: AtomicBool,
    overlapped: Arc<AtomicBool>,
}

impl SlowCamera {
    async fn occupy(&self) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        tokio::time::sleep(self.latency).await;
        self.busy.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Camera for SlowCamera {
    async fn probe(&self) -> Result<(), CaptureError> {
        Ok(())
    }

    async fn capture_still(&self) -> Result<Vec<u8>, CaptureError> {
        self.occupy().await;
        Ok(b"jpeg".to_vec())
    }

    async fn record(&self, duration: Duration, sink: &mut Vec<u8>) -> Result<(), CaptureError> {
        self.occupy().await;
        sink.extend_from_slice(format!("{}s", duration.as_secs()).as_bytes());
        Ok(())
    }

    fn video_format(&self) -> VideoFormat {
        VideoFormat::Mp4
    }

    fn name(&self) -> &str {
        "slow"
    }
}

fn load_config() -> BotConfig {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(br#"{ "token": "T", "authorized_users": [42] }"#).unwrap();
    BotConfig::load(file.path()).unwrap()
}

async fn setup(camera: SlowCamera) -> (Arc<CommandRouter>, Arc<ChatLog>) {
    let config = load_config();
    let bot = Arc::new(ChatLog::default());
    let session = CameraSession::open(Box::new(camera), BusyPolicy::Wait).await.unwrap();

    let mut router = CommandRouter::new(bot.clone(), config.authorized_users.iter().copied().collect());
    handlers::register_defaults(&mut router, Arc::new(session));
    (Arc::new(router), bot)
}

fn message(sender: i64, text: &str) -> Message {
    Message::from_text(ChatId(sender), text).with_sender(User::new(sender))
}

#[tokio::test]
async fn test_authorized_video_request() {
    let (router, bot) = setup(SlowCamera::default()).await;

    let outcome = router.handle_message(message(42, "/video 5")).await;

    assert_eq!(outcome, Dispatch::Handled);
    assert_eq!(
        bot.out(),
        vec![
            Out::Text(ChatId(42), "recording 5-second video".to_string()),
            Out::Video(ChatId(42), b"5s".to_vec()),
            Out::Text(ChatId(42), "video done".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_unauthorized_picture_request_gets_no_reply() {
    let (router, bot) = setup(SlowCamera::default()).await;

    for text in ["/picture", "/pic", "/vid 3", "/hello", "/help"] {
        assert!(matches!(router.handle_message(message(99, text)).await, Dispatch::Denied(_)));
    }
    assert!(bot.out().is_empty());
}

#[tokio::test]
async fn test_aliases_and_clamping() {
    let (router, bot) = setup(SlowCamera::default()).await;

    router.handle_message(message(42, "/vid 500")).await;
    router.handle_message(message(42, "/pic")).await;

    let out = bot.out();
    assert_eq!(out[0], Out::Text(ChatId(42), "recording 60-second video".to_string()));
    assert_eq!(out[1], Out::Video(ChatId(42), b"60s".to_vec()));
    assert_eq!(out[3], Out::Photo(ChatId(42)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_picture_waits_for_running_video() {
    let camera = SlowCamera {
        latency: Duration::from_millis(150),
        ..SlowCamera::default()
    };
    let overlapped = camera.overlapped.clone();
    let (router, bot) = setup(camera).await;

    let video = {
        let router = router.clone();
        tokio::spawn(async move { router.handle_message(message(42, "/video 2")).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    let picture = router.handle_message(message(42, "/picture")).await;

    assert_eq!(picture, Dispatch::Handled);
    assert_eq!(video.await.unwrap(), Dispatch::Handled);
    assert!(!overlapped.load(Ordering::SeqCst));

    let out = bot.out();
    let video_at = out.iter().position(|o| matches!(o, Out::Video(..))).unwrap();
    let photo_at = out.iter().position(|o| matches!(o, Out::Photo(..))).unwrap();
    assert!(out.contains(&Out::Text(ChatId(42), "video done".to_string())));
    assert!(video_at < photo_at, "picture was taken before the recording finished: {:?}", out);
}
