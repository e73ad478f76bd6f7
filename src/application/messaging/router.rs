//! Plain-message handlers selected by pattern, and message-delete handlers

use async_trait::async_trait;
use regex_lite::Regex;
use std::sync::Arc;

use crate::domain::entities::{GatewayEvent, MessageDeletion, MessageEvent};
use crate::domain::traits::{EventHandler, Gateway};

/// Message handler function type; a returned text is posted to the channel
pub type MessageHandlerFn = Arc<dyn Fn(&MessageEvent) -> Option<String> + Send + Sync>;

struct Route {
    pattern: Option<Regex>,
    handler: MessageHandlerFn,
}

/// Runs every handler whose pattern matches a message, in registration order
pub struct MessageRouter {
    routes: Vec<Route>,
    gateway: Arc<dyn Gateway>,
}

impl MessageRouter {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            routes: Vec::new(),
            gateway,
        }
    }

    /// Register a handler. A `None` pattern matches every message.
    pub fn register<F>(&mut self, pattern: Option<Regex>, handler: F)
    where
        F: Fn(&MessageEvent) -> Option<String> + Send + Sync + 'static,
    {
        self.routes.push(Route {
            pattern,
            handler: Arc::new(handler),
        });
    }

    /// Returns how many handlers matched. Bot authors are routed like
    /// anyone else.
    pub async fn on_message(&self, message: &MessageEvent) -> usize {
        tracing::debug!(
            channel_id = %message.channel_id,
            author = %message.author,
            bot = message.author.is_bot,
            "routing message"
        );

        let mut matched = 0;
        for route in &self.routes {
            if route.pattern.as_ref().is_some_and(|p| !p.is_match(&message.content)) {
                continue;
            }
            matched += 1;

            let Some(text) = (route.handler)(message) else {
                continue;
            };
            if let Err(e) = self.gateway.send_message(message.channel_id, &text).await {
                tracing::error!(
                    channel_id = %message.channel_id,
                    error = %e,
                    "failed to post message handler reply"
                );
            }
        }
        matched
    }
}

#[async_trait]
impl EventHandler for MessageRouter {
    async fn on_event(&self, event: &GatewayEvent) {
        if let GatewayEvent::MessageCreate(message) = event {
            self.on_message(message).await;
        }
    }
}

/// Message-delete handler function type
pub type DeleteHandlerFn = Arc<dyn Fn(&MessageDeletion) + Send + Sync>;

/// Runs every registered handler, in registration order, when a message is
/// deleted
#[derive(Default)]
pub struct DeleteRouter {
    handlers: Vec<DeleteHandlerFn>,
}

impl DeleteRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, handler: F)
    where
        F: Fn(&MessageDeletion) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    /// Returns how many handlers ran
    pub fn on_delete(&self, deletion: &MessageDeletion) -> usize {
        for handler in &self.handlers {
            handler(deletion);
        }
        self.handlers.len()
    }
}

#[async_trait]
impl EventHandler for DeleteRouter {
    async fn on_event(&self, event: &GatewayEvent) {
        if let GatewayEvent::MessageDelete(deletion) = event {
            self.on_delete(deletion);
        }
    }
}
