use crate::domain::entities::{CommandHandler, CommandResponse};

pub const NAME: &str = "version";

pub fn handler() -> CommandHandler {
    CommandHandler::new("Return the current bot version", |ctx| {
        tracing::debug!(
            bot = %ctx.gateway.bot_info().name,
            guild_id = ?ctx.interaction.guild_id,
            user = ?ctx.interaction.invoker().map(|u| u.id),
            "version command called"
        );
        CommandResponse::ephemeral(text())
    })
}

pub fn text() -> String {
    format!("Replicator bot v{}", env!("CARGO_PKG_VERSION"))
}
