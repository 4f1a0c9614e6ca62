//! Platform adapters

pub mod slack;

pub use slack::{RtmConnection, SlackAdapter};
