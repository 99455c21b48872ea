//! Platform integrations

pub mod telegram;

pub use telegram::TelegramAdapter;
