//! Message handling - Parsing and routing inbound commands

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{CommandRouter, Dispatch};
pub use parser::MessageParser;
