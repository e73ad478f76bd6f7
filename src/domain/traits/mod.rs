//! Domain traits - Abstractions for infrastructure implementations

pub mod gateway;
pub mod image;
pub mod sync;

pub use gateway::{BotInfo, EventHandler, Gateway};
pub use image::{ImageGenerator, ImageRequest};
pub use sync::{CommandSync, RegisteredCommand};
