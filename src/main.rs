use clap::{Parser, Subcommand};
use std::sync::Arc;

mod application;
mod domain;
mod infrastructure;

use application::commands::{self, version};
use application::errors::BotError;
use application::messaging::{DeleteRouter, Dispatcher, InteractionParser, MessageRouter, RateLimiter, Session};
use application::services::CommandService;
use domain::entities::{CommandRegistry, Snowflake};
use domain::traits::{EventHandler, Gateway, ImageGenerator};
use infrastructure::adapters::console::{ConsoleAdapter, ConsoleImages};
use infrastructure::config::Config;

#[derive(Parser)]
#[command(name = "replicator-bot")]
#[command(about = "Rate-limited slash command dispatcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// Print the command declarations as JSON
    Commands,
}

fn main() {
    let cli = Cli::parse();

    let (config, load_error) = load_config(&cli.config);
    init_tracing(&config.logging.level);
    if let Some(e) = load_error {
        tracing::warn!("Failed to load config: {}, using defaults", e);
    }

    let result = match cli.command {
        Commands::Run => run_bot(config),
        Commands::Version => {
            println!("{}", version::text());
            Ok(())
        }
        Commands::InitConfig => init_config(),
        Commands::Commands => list_commands(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

/// File config when present and valid, environment otherwise
fn load_config(path: &str) -> (Config, Option<BotError>) {
    if !std::path::Path::new(path).exists() {
        return (Config::load_env(), None);
    }
    match Config::load(path) {
        Ok(config) => (config, None),
        Err(e) => (Config::load_env(), Some(e.into())),
    }
}

fn build_registry(images: Arc<dyn ImageGenerator>) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    commands::register_defaults(&mut registry, images);
    registry
}

fn run_bot(config: Config) -> Result<(), BotError> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(serve(config))
}

async fn serve(config: Config) -> Result<(), BotError> {
    tracing::info!("Starting {}", config.bot.name);

    if config.gateway.token.is_some() {
        tracing::warn!("Gateway token configured, but only the console transport is built in");
    }
    if config.image.token.is_some() {
        tracing::warn!(model = %config.image.model, "Image token configured, console images are used instead");
    }

    let app_id = Snowflake(config.gateway.app_id);
    let console = Arc::new(ConsoleAdapter::new(&config.bot.name, app_id));
    let registry = Arc::new(build_registry(Arc::new(ConsoleImages::new())));

    let users = Arc::new(RateLimiter::from_config("user", &config.rate_limit.user));
    let channels = Arc::new(RateLimiter::from_config("channel", &config.rate_limit.channel));
    tracing::info!(
        user_capacity = users.capacity(),
        user_interval = ?users.interval(),
        channel_capacity = channels.capacity(),
        channel_interval = ?channels.interval(),
        "Rate limiters ready"
    );
    let replenishers = [users.spawn_replenisher(), channels.spawn_replenisher()];

    let sync = CommandService::new(Arc::clone(&registry), console.clone());
    if let Err(e) = sync.register_commands().await {
        tracing::warn!("Failed to register commands: {}", e);
    }
    let names: Vec<_> = console
        .registered_commands()
        .await
        .into_iter()
        .map(|c| format!("/{}", c.name))
        .collect();
    println!("[CONSOLE] commands: {}", names.join(" "));

    let dispatcher = Dispatcher::new(registry, users, channels, console.clone());
    let mut router = MessageRouter::new(console.clone());
    commands::register_message_handlers(&mut router);
    let mut deletes = DeleteRouter::new();
    commands::register_delete_handlers(&mut deletes);

    let handlers: Vec<Arc<dyn EventHandler>> = vec![
        Arc::new(dispatcher),
        Arc::new(router),
        Arc::new(deletes),
        Arc::new(sync),
    ];

    let info = console.bot_info();
    tracing::info!(app_id = %info.app_id, "Bot started: {}", info.name);

    let parser = InteractionParser::new("/", Session::new(app_id));
    let result = console.run(parser, handlers).await;

    for replenisher in replenishers {
        replenisher.shutdown().await;
    }
    tracing::info!("Bot stopped");
    result
}

fn init_config() -> Result<(), BotError> {
    let yaml = Config::default().to_yaml()?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}

fn list_commands() -> Result<(), BotError> {
    let registry = build_registry(Arc::new(ConsoleImages::new()));
    let json = serde_json::to_string_pretty(&registry.declarations())
        .map_err(|e| BotError::Internal(format!("Failed to serialize commands: {}", e)))?;
    println!("{}", json);
    Ok(())
}
