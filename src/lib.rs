//! welcomebot - greets users joining Slack channels and answers `help` mentions
//! with responses configured per channel.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::errors::{BotError, ConfigError};
pub use application::messaging::{DispatcherState, EventDispatcher};
pub use infrastructure::config::{ResponseConfig, Settings};
