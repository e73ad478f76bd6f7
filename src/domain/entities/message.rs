use super::{Snowflake, User};
use chrono::{DateTime, Utc};

/// A message that actually landed in a channel
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredMessage {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub content: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DeliveredMessage {
    pub fn new(id: impl Into<Snowflake>, channel_id: impl Into<Snowflake>) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            content: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// A plain chat message posted by someone
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub channel_id: Snowflake,
    pub author: User,
    pub content: String,
}

/// A message that was removed from a channel
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDeletion {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
}
