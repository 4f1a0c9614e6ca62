//! Domain entities - Core objects shared by the dispatcher and the adapters

pub mod event;
pub mod identity;
pub mod rule;

pub use event::{InboundEvent, MessageEvent, MessageSubtype};
pub use identity::{BotIdentity, Resolution};
pub use rule::{DeliveryMode, ResponseRule};
