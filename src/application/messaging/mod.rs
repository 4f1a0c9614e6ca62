//! Message handling - Event-driven message processing

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{DispatcherState, EventDispatcher};
pub use parser::{MentionParser, TRIGGERS};
