//! Domain layer - Core business objects and collaborator contracts
//!
//! This layer contains:
//! - Entities: Interactions, replies, the command registry
//! - Traits: Abstractions for infrastructure (Gateway, CommandSync, ImageGenerator)

pub mod entities;
pub mod traits;
