//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;

pub use user::{ChatId, User, UserId};
pub use message::{Content, InvocationContext, Message};
pub use command::{CommandHandler, CommandRegistration, CommandRegistry, Handler};
