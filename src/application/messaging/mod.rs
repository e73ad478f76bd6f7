//! Message handling - Event-driven interaction processing

pub mod dispatcher;
pub mod parser;
pub mod rate_limiter;
pub mod router;


pub use dispatcher::Dispatcher;
pub use parser::{InteractionParser, Parsed, Session};
pub use rate_limiter::RateLimiter;
pub use router::{DeleteRouter, MessageRouter};
