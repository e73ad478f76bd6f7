//! Console adapter for development/testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::RwLock;
use tokio::task::{JoinError, JoinSet};

use crate::application::errors::BotError;
use crate::application::messaging::{InteractionParser, Parsed};
use crate::domain::entities::{CommandDeclaration, DeliveredMessage, Interaction, Reply, Snowflake};
use crate::domain::traits::{BotInfo, CommandSync, EventHandler, Gateway, ImageGenerator, ImageRequest, RegisteredCommand};

/// Console gateway for local development: stdin in, stdout out
pub struct ConsoleAdapter {
    info: BotInfo,
    next_id: AtomicU64,
    /// Replies by interaction token, until looked up
    delivered: RwLock<HashMap<String, DeliveredMessage>>,
    global_commands: RwLock<Vec<RegisteredCommand>>,
    guild_commands: RwLock<HashMap<Snowflake, Vec<RegisteredCommand>>>,
}

impl ConsoleAdapter {
    pub fn new(name: impl Into<String>, app_id: Snowflake) -> Self {
        Self {
            info: BotInfo {
                app_id,
                name: name.into(),
            },
            next_id: AtomicU64::new(1_000_000),
            delivered: RwLock::new(HashMap::new()),
            global_commands: RwLock::new(Vec::new()),
            guild_commands: RwLock::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> Snowflake {
        Snowflake(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    async fn seed_guild_command(&self, guild_id: Snowflake, app_id: Snowflake, name: &str) {
        let command = RegisteredCommand {
            id: self.next_id(),
            app_id,
            name: name.to_string(),
        };
        self.guild_commands.write().await.entry(guild_id).or_default().push(command);
    }

    /// Global commands as last declared
    pub async fn registered_commands(&self) -> Vec<RegisteredCommand> {
        self.global_commands.read().await.clone()
    }

    /// Read stdin until EOF or Ctrl-C, handing every event to every handler
    /// on its own task. In-flight events are drained before returning.
    pub async fn run(&self, mut parser: InteractionParser, handlers: Vec<Arc<dyn EventHandler>>) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        println!("Type /command key=value..., plain text, or :guild/:dm/:channel/:user/:join/:delete. Ctrl-D quits.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match parser.parse(&line) {
                        Parsed::Event(event) => {
                            tracing::debug!(kind = event.kind(), "console event");
                            let event = Arc::new(event);
                            for handler in &handlers {
                                let handler = Arc::clone(handler);
                                let event = Arc::clone(&event);
                                in_flight.spawn(async move { handler.on_event(&event).await });
                            }
                        }
                        Parsed::Context(change) => println!("[CONSOLE] {}", change),
                        Parsed::Invalid(reason) => println!("[CONSOLE] {}", reason),
                        Parsed::Empty => {}
                    }
                }
                Some(done) = in_flight.join_next() => reap(done),
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupt received, shutting down");
                    break;
                }
            }
        }

        while let Some(done) = in_flight.join_next().await {
            reap(done);
        }
        Ok(())
    }
}

fn reap(done: Result<(), JoinError>) {
    if let Err(e) = done {
        tracing::error!(error = %e, "event task failed");
    }
}

#[async_trait]
impl Gateway for ConsoleAdapter {
    async fn respond(&self, interaction: &Interaction, reply: &Reply) -> Result<(), BotError> {
        let content = reply.content.clone().unwrap_or_default();
        if reply.is_ephemeral() {
            println!("[BOT] (only you) {}", content);
        } else {
            println!("[BOT] {}", content);
        }

        let message = DeliveredMessage::new(self.next_id(), interaction.channel_id).with_content(content);
        self.delivered.write().await.insert(interaction.token.clone(), message);
        Ok(())
    }

    async fn delivered_message(&self, app_id: Snowflake, token: &str) -> Result<Option<DeliveredMessage>, BotError> {
        if app_id != self.info.app_id {
            return Err(BotError::Gateway(format!("unknown application {}", app_id)));
        }
        Ok(self.delivered.write().await.remove(token))
    }

    async fn send_message(&self, channel_id: Snowflake, content: &str) -> Result<DeliveredMessage, BotError> {
        println!("[BOT] #{} {}", channel_id, content);
        Ok(DeliveredMessage::new(self.next_id(), channel_id).with_content(content))
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[async_trait]
impl CommandSync for ConsoleAdapter {
    async fn current_application(&self) -> Result<Snowflake, BotError> {
        Ok(self.info.app_id)
    }

    async fn bulk_overwrite_commands(
        &self,
        app_id: Snowflake,
        commands: Vec<CommandDeclaration>,
    ) -> Result<Vec<RegisteredCommand>, BotError> {
        let registered: Vec<_> = commands
            .into_iter()
            .map(|c| RegisteredCommand {
                id: self.next_id(),
                app_id,
                name: c.name,
            })
            .collect();
        *self.global_commands.write().await = registered.clone();
        Ok(registered)
    }

    async fn guild_commands(&self, _app_id: Snowflake, guild_id: Snowflake) -> Result<Vec<RegisteredCommand>, BotError> {
        Ok(self.guild_commands.read().await.get(&guild_id).cloned().unwrap_or_default())
    }

    async fn delete_guild_command(
        &self,
        _app_id: Snowflake,
        guild_id: Snowflake,
        command_id: Snowflake,
    ) -> Result<(), BotError> {
        let mut guilds = self.guild_commands.write().await;
        let commands = guilds
            .get_mut(&guild_id)
            .ok_or_else(|| BotError::Gateway(format!("no commands in guild {}", guild_id)))?;

        let before = commands.len();
        commands.retain(|c| c.id != command_id);
        if commands.len() == before {
            return Err(BotError::Gateway(format!("unknown command {}", command_id)));
        }
        Ok(())
    }
}

/// Stand-in image backend that only reports what it was asked for.
/// A prediction can be fetched once.
#[derive(Default)]
pub struct ConsoleImages {
    predictions: Mutex<HashMap<String, u32>>,
}

impl ConsoleImages {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageGenerator for ConsoleImages {
    fn create_prediction(&self, request: &ImageRequest) -> Result<String, BotError> {
        let id = uuid::Uuid::new_v4().to_string();
        println!(
            "[IMAGE] {} {}x{} x{} steps={} guidance={} prompt={:?}",
            id,
            request.width,
            request.height,
            request.num_outputs,
            request.num_inference_steps,
            request.guidance_scale,
            request.prompt
        );
        self.predictions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), request.num_outputs);
        Ok(id)
    }

    fn prediction_output(&self, prediction_id: &str) -> Result<Vec<String>, BotError> {
        let outputs = self
            .predictions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(prediction_id)
            .ok_or_else(|| BotError::ImageGeneration(format!("unknown prediction {}", prediction_id)))?;

        Ok((0..outputs)
            .map(|i| format!("console://images/{}-{}.png", prediction_id, i))
            .collect())
    }
}
