use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{DeliveredMessage, GatewayEvent, Interaction, Reply, Snowflake};

/// Gateway trait - abstraction over the chat platform connection
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Answer an interaction
    async fn respond(&self, interaction: &Interaction, reply: &Reply) -> Result<(), BotError>;

    /// Look up the message created by an interaction answer.
    ///
    /// `Ok(None)` means the platform has no message for the token.
    async fn delivered_message(&self, app_id: Snowflake, token: &str) -> Result<Option<DeliveredMessage>, BotError>;

    /// Post a plain message to a channel
    async fn send_message(&self, channel_id: Snowflake, content: &str) -> Result<DeliveredMessage, BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Subscriber for raw gateway events
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_event(&self, event: &GatewayEvent);
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub app_id: Snowflake,
    pub name: String,
}
