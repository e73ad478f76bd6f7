use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use crate::application::errors::BotError;
use crate::domain::entities::{CommandRegistry, GatewayEvent, Snowflake};
use crate::domain::traits::{CommandSync, EventHandler};

/// Keeps the platform's view of our commands in line with the registry
pub struct CommandService {
    registry: Arc<CommandRegistry>,
    sync: Arc<dyn CommandSync>,
}

impl CommandService {
    pub fn new(registry: Arc<CommandRegistry>, sync: Arc<dyn CommandSync>) -> Self {
        Self { registry, sync }
    }

    /// Declare the full command set globally. Commands missing from the
    /// registry disappear from the platform.
    pub async fn register_commands(&self) -> Result<usize, BotError> {
        let app_id = self.sync.current_application().await?;
        let registered = self
            .sync
            .bulk_overwrite_commands(app_id, self.registry.declarations())
            .await?;

        info!(count = registered.len(), "commands successfully registered");
        Ok(registered.len())
    }

    /// Delete guild-scoped commands we own, left over from before commands
    /// went global. Failures are logged and skipped. Returns how many were
    /// removed.
    pub async fn clear_obsolete_commands(&self, guild_id: Snowflake) -> usize {
        let app_id = match self.sync.current_application().await {
            Ok(app_id) => app_id,
            Err(e) => {
                error!(error = %e, "failed to clear obsolete commands, could not determine the app identifier");
                return 0;
            }
        };

        let commands = match self.sync.guild_commands(app_id, guild_id).await {
            Ok(commands) => commands,
            Err(e) => {
                error!(
                    guild_id = %guild_id,
                    error = %e,
                    "failed to clear obsolete commands, could not determine current guild commands"
                );
                return 0;
            }
        };

        let mut removed = 0;
        for command in commands.iter().filter(|c| c.app_id == app_id) {
            match self.sync.delete_guild_command(app_id, guild_id, command.id).await {
                Ok(()) => {
                    removed += 1;
                    info!(guild_id = %guild_id, command = %command.name, "removed obsolete command from guild");
                }
                Err(e) => {
                    error!(guild_id = %guild_id, command = %command.name, error = %e, "failed to remove obsolete command");
                }
            }
        }
        removed
    }
}

#[async_trait]
impl EventHandler for CommandService {
    async fn on_event(&self, event: &GatewayEvent) {
        if let GatewayEvent::GuildCreate(guild_id) = event {
            self.clear_obsolete_commands(*guild_id).await;
        }
    }
}
