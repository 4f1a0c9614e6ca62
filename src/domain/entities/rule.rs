use serde::{Deserialize, Serialize};
use std::fmt;

/// How a configured response is delivered to the channel or the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryMode {
    /// Posted to the channel for everyone
    Public,
    /// Sent in a direct message to the user
    Direct,
    /// Posted in the channel, visible to a single user
    Ephemeral,
}

impl DeliveryMode {
    /// Processing order used by the response handlers
    pub const ALL: [DeliveryMode; 3] = [DeliveryMode::Public, DeliveryMode::Direct, DeliveryMode::Ephemeral];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Public => "public",
            DeliveryMode::Direct => "dm",
            DeliveryMode::Ephemeral => "ephemeral",
        }
    }

    /// Heading used when a rule is echoed back in reply to a mention
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryMode::Public => "Public",
            DeliveryMode::Direct => "DM",
            DeliveryMode::Ephemeral => "Ephemeral",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single configured response for a channel
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseRule {
    /// Human channel name, compared verbatim against the resolved name
    pub channel: String,
    /// Send the body without the platform's escaping
    #[serde(rename = "raw_response", default)]
    pub raw: bool,
    pub response: String,
}

impl ResponseRule {
    pub fn new(channel: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            raw: false,
            response: response.into(),
        }
    }

    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn applies_to(&self, channel_name: &str) -> bool {
        self.channel == channel_name
    }
}
