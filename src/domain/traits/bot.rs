use async_trait::async_trait;
use std::sync::Arc;
use crate::application::errors::BotError;

/// Bot trait - outbound primitives of the chat platform
#[async_trait]
pub trait Bot: Send + Sync {
    /// Post a message to a channel, returns the message reference
    async fn post_message(&self, channel: &str, text: &str, raw: bool) -> Result<String, BotError>;

    /// Open (or reuse) a direct message channel with a user
    async fn open_direct_channel(&self, user: &str) -> Result<String, BotError>;

    /// Post a message in a channel that only `user` can see
    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str, raw: bool) -> Result<String, BotError>;

    /// Resolve a channel id to its human name
    async fn channel_name(&self, channel: &str) -> Result<String, BotError>;
}

#[async_trait]
impl<B: Bot + ?Sized> Bot for Arc<B> {
    async fn post_message(&self, channel: &str, text: &str, raw: bool) -> Result<String, BotError> {
        (**self).post_message(channel, text, raw).await
    }

    async fn open_direct_channel(&self, user: &str) -> Result<String, BotError> {
        (**self).open_direct_channel(user).await
    }

    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str, raw: bool) -> Result<String, BotError> {
        (**self).post_ephemeral(channel, user, text, raw).await
    }

    async fn channel_name(&self, channel: &str) -> Result<String, BotError> {
        (**self).channel_name(channel).await
    }
}
