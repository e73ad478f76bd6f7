use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::entities::{CommandDeclaration, Snowflake};

/// A command as the remote platform knows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCommand {
    pub id: Snowflake,
    pub app_id: Snowflake,
    pub name: String,
}

/// Remote command bookkeeping
#[async_trait]
pub trait CommandSync: Send + Sync {
    async fn current_application(&self) -> Result<Snowflake, BotError>;

    /// Replace the global command set; anything not listed is removed
    async fn bulk_overwrite_commands(
        &self,
        app_id: Snowflake,
        commands: Vec<CommandDeclaration>,
    ) -> Result<Vec<RegisteredCommand>, BotError>;

    async fn guild_commands(&self, app_id: Snowflake, guild_id: Snowflake) -> Result<Vec<RegisteredCommand>, BotError>;

    async fn delete_guild_command(
        &self,
        app_id: Snowflake,
        guild_id: Snowflake,
        command_id: Snowflake,
    ) -> Result<(), BotError>;
}
