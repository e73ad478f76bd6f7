//! Handler result contract
//!
//! A handler returns a [`CommandResponse`]: the reply to send plus an optional
//! follow-up that resolves once the reply has a real message behind it.

use serde::Serialize;
use tokio::sync::oneshot;

use super::DeliveredMessage;

/// Who can see a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Only the invoking user
    Ephemeral,
    Public,
}

/// Reply payload sent back through the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub content: Option<String>,
    pub visibility: Visibility,
}

impl Reply {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            visibility: Visibility::Ephemeral,
        }
    }

    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            visibility: Visibility::Public,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        self.visibility == Visibility::Ephemeral
    }

    /// Content length in characters, not bytes
    pub fn len(&self) -> usize {
        self.content.as_deref().map_or(0, |c| c.chars().count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sending half of a reply follow-up
#[derive(Debug)]
pub struct FollowUp(oneshot::Sender<DeliveredMessage>);

impl FollowUp {
    /// Hand the delivered message to the waiting handler. Returns false if
    /// the handler stopped waiting.
    pub fn resolve(self, message: DeliveredMessage) -> bool {
        self.0.send(message).is_ok()
    }
}

/// What a command handler hands back to the dispatcher
#[derive(Debug)]
pub struct CommandResponse {
    pub reply: Reply,
    pub follow_up: Option<FollowUp>,
}

impl CommandResponse {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            follow_up: None,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self::new(Reply::ephemeral(content))
    }

    pub fn public(content: impl Into<String>) -> Self {
        Self::new(Reply::public(content))
    }

    /// Ask to be told about the delivered reply. The receiver yields the
    /// message once, or errors if the reply never materialised.
    pub fn with_follow_up(mut self) -> (Self, oneshot::Receiver<DeliveredMessage>) {
        let (tx, rx) = oneshot::channel();
        self.follow_up = Some(FollowUp(tx));
        (self, rx)
    }
}

impl From<Reply> for CommandResponse {
    fn from(reply: Reply) -> Self {
        Self::new(reply)
    }
}
