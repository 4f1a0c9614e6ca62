//! Domain layer - Core types with no platform dependencies
//!
//! This layer contains:
//! - Entities: Response rules, inbound events, the bot identity
//! - Traits: Abstractions for the chat platform (Bot)

pub mod entities;
pub mod traits;
