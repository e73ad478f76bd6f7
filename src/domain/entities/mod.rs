//! Domain entities - Core business objects

pub mod command;
pub mod event;
pub mod interaction;
pub mod message;
pub mod response;
pub mod snowflake;
pub mod user;

pub use command::{CommandContext, CommandDeclaration, CommandHandler, CommandRegistry, OptionSpec};
pub use event::GatewayEvent;
pub use interaction::{CommandInteraction, Interaction, InteractionData};
pub use message::{DeliveredMessage, MessageDeletion, MessageEvent};
pub use response::{CommandResponse, FollowUp, Reply};
pub use snowflake::Snowflake;
pub use user::{Member, User};
