//! Application services - Shared resources used by the handlers

pub mod camera_session;

pub use camera_session::{BusyPolicy, CameraSession};
