//! Domain layer - Core business objects and collaborator abstractions
//! 
//! This layer contains:
//! - Entities: Core business objects (User, Message, CommandRegistration)
//! - Traits: Abstractions for infrastructure (Bot, Camera)

pub mod entities;
pub mod traits;
