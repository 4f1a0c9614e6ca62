//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Response rules and runtime settings
//! - Adapters: Platform integrations (Slack)

pub mod config;
pub mod adapters;
