//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Handlers: The chat commands
//! - Services: The shared camera session
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing and command routing

pub mod errors;
pub mod handlers;
pub mod services;
pub mod messaging;
