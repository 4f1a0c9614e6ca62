//! Recording `Bot` used by the unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use crate::application::errors::BotError;
use crate::domain::traits::Bot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Post { channel: String, text: String, raw: bool },
    OpenDirect { user: String },
    Ephemeral { channel: String, user: String, text: String, raw: bool },
    ChannelName { channel: String },
}

/// Records every outbound call; channel names come from a fixed table
#[derive(Default)]
pub struct RecordingBot {
    calls: Mutex<Vec<Call>>,
    channels: HashMap<String, String>,
    fail_open_direct: bool,
    fail_post_containing: Option<String>,
}

impl RecordingBot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, id: &str, name: &str) -> Self {
        self.channels.insert(id.to_string(), name.to_string());
        self
    }

    pub fn fail_open_direct(mut self) -> Self {
        self.fail_open_direct = true;
        self
    }

    pub fn fail_post_containing(mut self, needle: &str) -> Self {
        self.fail_post_containing = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Outbound calls only, lookups excluded
    pub fn sends(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::ChannelName { .. }))
            .collect()
    }

    pub fn posts_to(&self, channel: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Post { channel: ch, text, .. } if ch == channel => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn ephemeral_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Ephemeral { .. }))
            .count()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn post_message(&self, channel: &str, text: &str, raw: bool) -> Result<String, BotError> {
        if let Some(needle) = &self.fail_post_containing {
            if text.contains(needle.as_str()) {
                return Err(BotError::api("chat.postMessage", "channel_not_found"));
            }
        }
        self.push(Call::Post { channel: channel.into(), text: text.into(), raw });
        Ok("1700000000.000100".to_string())
    }

    async fn open_direct_channel(&self, user: &str) -> Result<String, BotError> {
        if self.fail_open_direct {
            return Err(BotError::api("conversations.open", "user_not_found"));
        }
        self.push(Call::OpenDirect { user: user.into() });
        Ok(format!("D-{}", user))
    }

    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str, raw: bool) -> Result<String, BotError> {
        self.push(Call::Ephemeral {
            channel: channel.into(),
            user: user.into(),
            text: text.into(),
            raw,
        });
        Ok("1700000000.000200".to_string())
    }

    async fn channel_name(&self, channel: &str) -> Result<String, BotError> {
        self.push(Call::ChannelName { channel: channel.into() });
        self.channels
            .get(channel)
            .cloned()
            .ok_or_else(|| BotError::api("conversations.info", "channel_not_found"))
    }
}
