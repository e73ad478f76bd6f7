//! Built-in commands, message handlers and delete handlers

pub mod openjourney;
pub mod version;

use regex_lite::Regex;
use std::sync::Arc;

use crate::application::messaging::{DeleteRouter, MessageRouter};
use crate::domain::entities::CommandRegistry;
use crate::domain::traits::ImageGenerator;

/// Register every built-in slash command
pub fn register_defaults(registry: &mut CommandRegistry, images: Arc<dyn ImageGenerator>) {
    registry.register(version::NAME, version::handler());
    registry.register(openjourney::NAME, openjourney::handler(images));
}

/// Register the built-in plain-message handlers
pub fn register_message_handlers(router: &mut MessageRouter) {
    match Regex::new(r"(?i)^\s*ping\s*$") {
        Ok(pattern) => router.register(Some(pattern), |_| Some("pong".to_string())),
        Err(e) => tracing::warn!(error = %e, "ping handler not registered"),
    }
}

/// Register the built-in message-delete handlers
pub fn register_delete_handlers(router: &mut DeleteRouter) {
    router.register(|deletion| {
        tracing::debug!(
            guild_id = ?deletion.guild_id,
            channel_id = %deletion.channel_id,
            message_id = %deletion.id,
            "message deleted"
        );
    });
}
