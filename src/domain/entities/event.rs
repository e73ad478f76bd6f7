use super::{Interaction, MessageDeletion, MessageEvent, Snowflake};

/// Raw events emitted by the gateway
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    InteractionCreate(Interaction),
    MessageCreate(MessageEvent),
    MessageDelete(MessageDeletion),
    /// The bot joined, or reconnected to, a guild
    GuildCreate(Snowflake),
}

impl GatewayEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayEvent::InteractionCreate(_) => "interaction_create",
            GatewayEvent::MessageCreate(_) => "message_create",
            GatewayEvent::MessageDelete(_) => "message_delete",
            GatewayEvent::GuildCreate(_) => "guild_create",
        }
    }
}
