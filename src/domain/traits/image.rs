use crate::application::errors::BotError;

/// Parameters for one image prediction
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_outputs: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: 512,
            height: 512,
            num_outputs: 1,
            num_inference_steps: 50,
            guidance_scale: 7.5,
        }
    }
}

/// Image generation backend, driven in two steps: start a prediction, then
/// fetch what it produced. Called from command handlers, which run on the
/// blocking pool, so implementations may block.
pub trait ImageGenerator: Send + Sync {
    /// Start a prediction and return its identifier
    fn create_prediction(&self, request: &ImageRequest) -> Result<String, BotError>;

    /// URLs produced by a prediction
    fn prediction_output(&self, prediction_id: &str) -> Result<Vec<String>, BotError>;
}
