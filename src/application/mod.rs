//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Messaging: Rate limiting, interaction dispatch, message routing, console parsing
//! - Commands: Built-in command handlers
//! - Services: Remote command bookkeeping
//! - Errors: Domain-specific errors

pub mod commands;
pub mod errors;
pub mod messaging;
pub mod services;
