//! Application layer - Event handling use cases
//!
//! This layer contains:
//! - Services: Join and mention responses
//! - Errors: Bot and configuration errors
//! - Messaging: Mention parsing, event dispatching

pub mod errors;
pub mod services;
pub mod messaging;

#[cfg(test)]
pub(crate) mod testing;
