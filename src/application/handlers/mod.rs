//! Command handlers - hello, help, picture and video

pub mod camera;
pub mod greeting;

pub use camera::{video_duration, PictureHandler, VideoHandler};
pub use greeting::{HelloHandler, HelpHandler};

use std::sync::Arc;

use crate::application::messaging::CommandRouter;
use crate::application::services::CameraSession;
use crate::domain::entities::{CommandRegistration, Handler};

/// Register the standard command table. Every command is restricted.
pub fn register_defaults(router: &mut CommandRouter, camera: Arc<CameraSession>) {
    let picture: Handler = Arc::new(PictureHandler::new(camera.clone()));
    let video: Handler = Arc::new(VideoHandler::new(camera));

    let table: [(&str, &str, Handler); 6] = [
        ("hello", "Say hello", Arc::new(HelloHandler)),
        ("help", "Show available commands", Arc::new(HelpHandler)),
        ("picture", "Take a photo", picture.clone()),
        ("pic", "Take a photo", picture),
        ("video", "Record a video: /video [seconds]", video.clone()),
        ("vid", "Record a video: /vid [seconds]", video),
    ];

    for (name, description, handler) in table {
        router.register_command(CommandRegistration::new(name, handler).with_description(description));
    }
}
