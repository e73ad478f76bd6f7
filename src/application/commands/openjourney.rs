//! `/openjourney` - image generation through the configured backend

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::errors::CommandError;
use crate::domain::entities::{CommandContext, CommandHandler, CommandInteraction, CommandResponse, OptionSpec};
use crate::domain::traits::{ImageGenerator, ImageRequest};

pub const NAME: &str = "openjourney";

pub const STRUCTURE_NOTICE: &str = "/openjourney command structure is incorrect, check your input.";

pub fn handler(generator: Arc<dyn ImageGenerator>) -> CommandHandler {
    CommandHandler::new(
        "Have replicate.com generate an image using the openjourney model",
        move |ctx| run(generator.as_ref(), ctx),
    )
    .with_option(OptionSpec::string("prompt", "Prompt to pass to replicate.com").required())
}

fn run(generator: &dyn ImageGenerator, ctx: &CommandContext<'_>) -> CommandResponse {
    let guild_id = ctx.interaction.guild_id;

    let prompt = match prompt(ctx.command) {
        Ok(prompt) => prompt,
        Err(e) => {
            warn!(guild_id = ?guild_id, error = %e, "openjourney command structure is incorrect");
            return CommandResponse::ephemeral(STRUCTURE_NOTICE);
        }
    };
    info!(guild_id = ?guild_id, "openjourney command called");

    let prediction_id = match generator.create_prediction(&ImageRequest::new(prompt.as_str())) {
        Ok(id) => id,
        Err(e) => {
            error!(guild_id = ?guild_id, prompt = %prompt, error = %e, "failed to create prediction");
            return CommandResponse::ephemeral(format!("failed to create prediction: {e}"));
        }
    };

    match generator.prediction_output(&prediction_id) {
        Ok(outputs) => CommandResponse::ephemeral(format!("Output: [{}]", outputs.join(" "))),
        Err(e) => {
            error!(
                guild_id = ?guild_id,
                prediction_id = %prediction_id,
                error = %e,
                "failed to get response from replicate.com"
            );
            CommandResponse::ephemeral(format!("failed to get response from replicate.com: {e}"))
        }
    }
}

/// Exactly one option, `prompt`, with some text in it
fn prompt(command: &CommandInteraction) -> Result<String, CommandError> {
    if command.options.len() > 1 {
        return Err(CommandError::InvalidArgs(format!(
            "expected a single prompt, got {} options",
            command.options.len()
        )));
    }
    command
        .option("prompt")
        .map(|o| o.as_text())
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| CommandError::MissingOption("prompt".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::BotError;
    use crate::application::messaging::dispatcher::guard_oversized;
    use crate::application::messaging::tests::{guild_interaction, RecordingGateway};
    use crate::domain::entities::Snowflake;
    use crate::domain::traits::Gateway;
    use std::sync::Mutex;

    struct FakeGenerator {
        requests: Mutex<Vec<ImageRequest>>,
        fetched: Mutex<Vec<String>>,
        created: Result<String, String>,
        output: Result<Vec<String>, String>,
    }

    impl FakeGenerator {
        fn new(created: Result<&str, &str>, output: Result<Vec<String>, &str>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                fetched: Mutex::new(Vec::new()),
                created: created.map(str::to_string).map_err(str::to_string),
                output: output.map_err(str::to_string),
            })
        }

        fn succeeding(urls: &[&str]) -> Arc<Self> {
            Self::new(Ok("p-1"), Ok(urls.iter().map(|u| u.to_string()).collect()))
        }
    }

    impl ImageGenerator for FakeGenerator {
        fn create_prediction(&self, request: &ImageRequest) -> Result<String, BotError> {
            self.requests.lock().unwrap().push(request.clone());
            self.created.clone().map_err(BotError::ImageGeneration)
        }

        fn prediction_output(&self, prediction_id: &str) -> Result<Vec<String>, BotError> {
            self.fetched.lock().unwrap().push(prediction_id.to_string());
            self.output.clone().map_err(BotError::ImageGeneration)
        }
    }

    fn call(generator: Arc<FakeGenerator>, command: CommandInteraction) -> CommandResponse {
        let gateway: Arc<dyn Gateway> = RecordingGateway::new();
        let interaction = guild_interaction(Snowflake(10), Snowflake(100), command.clone());
        let ctx = CommandContext {
            gateway: &gateway,
            interaction: &interaction,
            command: &command,
        };
        handler(generator).call(&ctx)
    }

    fn fox() -> CommandInteraction {
        CommandInteraction::new(NAME).with_option("prompt", "a red fox")
    }

    #[test]
    fn rejects_extra_options() {
        let generator = FakeGenerator::succeeding(&["url"]);
        let command = CommandInteraction::new(NAME)
            .with_option("prompt", "fox")
            .with_option("seed", 1);

        let response = call(generator.clone(), command);
        assert_eq!(response.reply.content.as_deref(), Some(STRUCTURE_NOTICE));
        assert!(response.reply.is_ephemeral());
        assert!(generator.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn rejects_missing_prompt() {
        let generator = FakeGenerator::succeeding(&["url"]);
        let response = call(generator, CommandInteraction::new(NAME));
        assert_eq!(response.reply.content.as_deref(), Some(STRUCTURE_NOTICE));
        assert!(response.follow_up.is_none());
    }

    #[test]
    fn create_failure_is_reported_privately() {
        let generator = FakeGenerator::new(Err("quota exceeded"), Ok(Vec::new()));

        let response = call(generator.clone(), fox());
        assert!(response.reply.is_ephemeral());
        let content = response.reply.content.unwrap_or_default();
        assert!(content.starts_with("failed to create prediction:"));
        assert!(content.contains("quota exceeded"));
        assert!(generator.fetched.lock().unwrap().is_empty());
    }

    #[test]
    fn fetch_failure_is_reported_privately() {
        let generator = FakeGenerator::new(Ok("p-9"), Err("timed out"));

        let response = call(generator.clone(), fox());
        assert!(response.reply.is_ephemeral());
        let content = response.reply.content.unwrap_or_default();
        assert!(content.starts_with("failed to get response from replicate.com:"));
        assert!(content.contains("timed out"));
        assert_eq!(generator.fetched.lock().unwrap().clone(), ["p-9"]);
    }

    #[test]
    fn success_is_a_private_reply_without_follow_up() {
        let generator = FakeGenerator::succeeding(&["https://img/1.png"]);

        let response = call(generator.clone(), fox());
        assert!(response.reply.is_ephemeral());
        assert!(response.follow_up.is_none());
        assert_eq!(response.reply.content.as_deref(), Some("Output: [https://img/1.png]"));

        let requests = generator.requests.lock().unwrap().clone();
        assert_eq!(requests, [ImageRequest::new("a red fox")]);
        assert_eq!((requests[0].width, requests[0].height), (512, 512));
        assert_eq!(generator.fetched.lock().unwrap().clone(), ["p-1"]);
    }

    #[test]
    fn long_output_hits_the_oversized_guard() {
        let url = format!("https://img/{}.png", "x".repeat(1600));
        let generator = FakeGenerator::succeeding(&[url.as_str()]);

        let mut reply = call(generator, fox()).reply;
        assert!(guard_oversized(&mut reply));
        assert!(reply.content.is_some_and(|c| c.contains(&url)));
    }
}
