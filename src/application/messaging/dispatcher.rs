//! Interaction dispatcher - admission control and routing for commands

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::rate_limiter::RateLimiter;
use crate::domain::entities::{
    CommandContext, CommandHandler, CommandInteraction, CommandRegistry, CommandResponse, FollowUp, GatewayEvent,
    Interaction, Reply, Snowflake,
};
use crate::domain::traits::{EventHandler, Gateway};

pub const PRIVATE_CONTEXT_NOTICE: &str = "I'm sorry, I do not respond to commands in private.";
pub const USER_THROTTLE_NOTICE: &str = "You are using too many commands too quickly. Slow down.";
pub const CHANNEL_THROTTLE_NOTICE: &str = "Too many commands being processed in this channel right now. Please wait.";

/// Private replies longer than this many characters get their body re-wrapped
pub const OVERSIZED_CONTENT_CHARS: usize = 1500;

/// Why an interaction was turned away before reaching a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decline {
    PrivateContext,
    UserThrottled,
    ChannelThrottled,
}

impl Decline {
    pub fn notice(self) -> &'static str {
        match self {
            Decline::PrivateContext => PRIVATE_CONTEXT_NOTICE,
            Decline::UserThrottled => USER_THROTTLE_NOTICE,
            Decline::ChannelThrottled => CHANNEL_THROTTLE_NOTICE,
        }
    }
}

/// How the handling of one interaction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not a command interaction
    Ignored,
    Declined(Decline),
    /// No command registered under that name
    Unroutable,
    HandlerPanicked,
    DeliveryFailed,
    Replied,
    /// Reply sent and the follow-up got its message
    FollowedUp,
    /// Reply sent but its message could not be resolved
    FollowUpDropped,
}

/// Gatekeeper between the gateway and command handlers
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    user_limiter: Arc<RateLimiter>,
    channel_limiter: Arc<RateLimiter>,
    gateway: Arc<dyn Gateway>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<CommandRegistry>,
        user_limiter: Arc<RateLimiter>,
        channel_limiter: Arc<RateLimiter>,
        gateway: Arc<dyn Gateway>,
    ) -> Self {
        Self {
            registry,
            user_limiter,
            channel_limiter,
            gateway,
        }
    }

    /// Run one interaction through scope check, both limiters, routing,
    /// the handler, and reply delivery.
    ///
    /// Usage taken from a limiter is never given back, even when a later
    /// step declines the interaction or delivery fails.
    pub async fn on_interaction(&self, interaction: &Interaction) -> Dispatch {
        let Some(command) = interaction.command() else {
            return Dispatch::Ignored;
        };

        let (Some(guild_id), Some(member)) = (interaction.guild_id, interaction.member.as_ref()) else {
            return self.decline(interaction, Decline::PrivateContext).await;
        };

        if !self.user_limiter.allocate(guild_id, member.user.id) {
            info!(
                guild_id = %guild_id,
                user_id = %member.user.id,
                username = %member.user.username,
                "user throttled"
            );
            return self.decline(interaction, Decline::UserThrottled).await;
        }

        if !self.channel_limiter.allocate(guild_id, interaction.channel_id) {
            info!(guild_id = %guild_id, channel_id = %interaction.channel_id, "channel throttled");
            return self.decline(interaction, Decline::ChannelThrottled).await;
        }

        let Some(handler) = self.registry.lookup(&command.name) else {
            debug!(guild_id = %guild_id, command = %command.name, "no handler registered, dropping interaction");
            return Dispatch::Unroutable;
        };

        debug!(
            guild_id = %guild_id,
            user = member.display_name(),
            command = %command.name,
            "running command"
        );
        let Some(CommandResponse { mut reply, follow_up }) = self.invoke(handler, interaction, command).await else {
            return Dispatch::HandlerPanicked;
        };

        if reply.is_empty() {
            debug!(command = %command.name, "handler returned an empty reply");
        } else if guard_oversized(&mut reply) {
            debug!(command = %command.name, chars = reply.len(), "re-wrapped oversized private reply");
        }

        if let Err(e) = self.gateway.respond(interaction, &reply).await {
            error!(
                guild_id = %guild_id,
                command = %command.name,
                error = %e,
                "failed to send command interaction response"
            );
            return Dispatch::DeliveryFailed;
        }

        match follow_up {
            Some(follow_up) => self.resolve_follow_up(interaction, &command.name, follow_up).await,
            None => Dispatch::Replied,
        }
    }

    async fn decline(&self, interaction: &Interaction, decline: Decline) -> Dispatch {
        let reply = Reply::ephemeral(decline.notice());
        if let Err(e) = self.gateway.respond(interaction, &reply).await {
            error!(
                interaction_id = %interaction.id,
                channel_id = %interaction.channel_id,
                reason = ?decline,
                error = %e,
                "failed to post decline notice"
            );
        }
        Dispatch::Declined(decline)
    }

    /// Run the handler on the blocking pool. `None` if it panicked.
    async fn invoke(
        &self,
        handler: Arc<CommandHandler>,
        interaction: &Interaction,
        command: &CommandInteraction,
    ) -> Option<CommandResponse> {
        let gateway = Arc::clone(&self.gateway);
        let interaction = interaction.clone();
        let command = command.clone();

        let name = command.name.clone();
        let guild_id = interaction.guild_id.unwrap_or(Snowflake::NULL);

        let result = tokio::task::spawn_blocking(move || {
            let ctx = CommandContext {
                gateway: &gateway,
                interaction: &interaction,
                command: &command,
            };
            handler.call(&ctx)
        })
        .await;

        match result {
            Ok(response) => Some(response),
            Err(e) => {
                error!(guild_id = %guild_id, command = %name, error = %e, "command handler failed");
                None
            }
        }
    }

    async fn resolve_follow_up(&self, interaction: &Interaction, name: &str, follow_up: FollowUp) -> Dispatch {
        match self.gateway.delivered_message(interaction.app_id, &interaction.token).await {
            Ok(Some(message)) if !message.id.is_null() => {
                if !follow_up.resolve(message) {
                    debug!(command = %name, "follow-up receiver already gone");
                }
                Dispatch::FollowedUp
            }
            Ok(_) => {
                debug!(command = %name, "no delivered message for follow-up");
                Dispatch::FollowUpDropped
            }
            Err(e) => {
                error!(
                    command = %name,
                    error = %e,
                    "failed to get message reference for command follow-up"
                );
                Dispatch::FollowUpDropped
            }
        }
    }
}

/// Oversized-content guard for private replies. Returns true when the
/// guard ran. Public replies go out as they are, whatever their length.
pub fn guard_oversized(reply: &mut Reply) -> bool {
    if !reply.is_ephemeral() || reply.len() <= OVERSIZED_CONTENT_CHARS {
        return false;
    }
    // body is always sent as an explicit value, never a null field
    reply.content = Some(reply.content.take().unwrap_or_default());
    true
}

#[async_trait]
impl EventHandler for Dispatcher {
    async fn on_event(&self, event: &GatewayEvent) {
        if let GatewayEvent::InteractionCreate(interaction) = event {
            let outcome = self.on_interaction(interaction).await;
            debug!(interaction_id = %interaction.id, ?outcome, "interaction handled");
        }
    }
}
