//! Slack adapter
//!
//! [`SlackAdapter`] wraps the Web API calls the bot needs and implements
//! [`Bot`]. The RTM event stream lives in [`rtm`].

pub mod rtm;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::errors::BotError;
use crate::domain::traits::Bot;
use crate::infrastructure::config::{redact, Settings, DEFAULT_API_BASE};

pub use rtm::RtmConnection;

/// Error codes that mean the token will never work
const AUTH_ERRORS: &[&str] = &[
    "invalid_auth",
    "not_authed",
    "account_inactive",
    "token_revoked",
    "token_expired",
];

/// Result of `rtm.connect`
#[derive(Debug, Clone, Deserialize)]
pub struct RtmSession {
    /// WebSocket URL, valid for a short time
    pub url: String,
    #[serde(rename = "self")]
    pub bot: BotRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct PostedMessage {
    ts: String,
}

#[derive(Debug, Deserialize)]
struct PostedEphemeral {
    message_ts: String,
}

#[derive(Debug, Deserialize)]
struct ChannelRef {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    is_private: bool,
}

#[derive(Debug, Deserialize)]
struct ChannelResponse {
    channel: ChannelRef,
}

/// Slack Web API client authenticated with the bot token
pub struct SlackAdapter {
    token: String,
    client: Client,
    api_base: String,
}

impl SlackAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.token.clone()).with_api_base(settings.api_base.clone())
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Open an RTM session
    pub async fn rtm_connect(&self) -> Result<RtmSession, BotError> {
        tracing::debug!("Calling rtm.connect (token: {})", redact(&self.token));
        self.call_form("rtm.connect", &[]).await
    }

    /// Methods that take JSON bodies (writes)
    async fn call_json<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, BotError> {
        let response = self.client
            .post(self.api_url(method))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| BotError::Network(format!("{} request failed: {}", method, e)))?;

        Self::decode(method, response).await
    }

    /// Methods that only take form arguments (reads, rtm.connect)
    async fn call_form<T: DeserializeOwned>(&self, method: &str, form: &[(&str, &str)]) -> Result<T, BotError> {
        let response = self.client
            .post(self.api_url(method))
            .bearer_auth(&self.token)
            .form(form)
            .send()
            .await
            .map_err(|e| BotError::Network(format!("{} request failed: {}", method, e)))?;

        Self::decode(method, response).await
    }

    async fn decode<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<T, BotError> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| BotError::Parse(format!("{} response (HTTP {}): {}", method, status, e)))?;

        check_envelope(method, &body)?;

        serde_json::from_value(body)
            .map_err(|e| BotError::Parse(format!("{} response: {}", method, e)))
    }
}

/// Map Slack's `{ "ok": false, "error": ... }` envelope to an error
fn check_envelope(method: &str, body: &Value) -> Result<(), BotError> {
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }
    let error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    if AUTH_ERRORS.contains(&error) {
        return Err(BotError::Auth(format!("{}: {}", method, error)));
    }
    Err(BotError::api(method, error))
}

/// Slack's default escaping for message text
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Body text and extra arguments for a message honoring the raw flag
fn message_fields(text: &str, raw: bool) -> (String, Option<&'static str>) {
    if raw {
        (text.to_string(), Some("none"))
    } else {
        (escape_text(text), None)
    }
}

#[async_trait]
impl Bot for SlackAdapter {
    async fn post_message(&self, channel: &str, text: &str, raw: bool) -> Result<String, BotError> {
        tracing::debug!("Sending to {}: {}", channel, text);
        let (text, parse) = message_fields(text, raw);
        let mut body = json!({ "channel": channel, "text": text });
        if let Some(parse) = parse {
            body["parse"] = json!(parse);
        }
        let posted: PostedMessage = self.call_json("chat.postMessage", &body).await?;
        Ok(posted.ts)
    }

    async fn open_direct_channel(&self, user: &str) -> Result<String, BotError> {
        let body = json!({ "users": user, "return_im": true });
        let opened: ChannelResponse = self.call_json("conversations.open", &body).await?;
        Ok(opened.channel.id)
    }

    async fn post_ephemeral(&self, channel: &str, user: &str, text: &str, raw: bool) -> Result<String, BotError> {
        tracing::debug!("Sending ephemeral to {} in {}: {}", user, channel, text);
        let (text, parse) = message_fields(text, raw);
        let mut body = json!({ "channel": channel, "user": user, "text": text });
        if let Some(parse) = parse {
            body["parse"] = json!(parse);
        }
        let posted: PostedEphemeral = self.call_json("chat.postEphemeral", &body).await?;
        Ok(posted.message_ts)
    }

    async fn channel_name(&self, channel: &str) -> Result<String, BotError> {
        let info: ChannelResponse = self.call_form("conversations.info", &[("channel", channel)]).await?;
        // rules only ever target public channels
        if info.channel.is_private {
            return Err(BotError::NotFound(format!("public channel {}", info.channel.id)));
        }
        info.channel
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| BotError::NotFound(format!("name of channel {}", info.channel.id)))
    }
}
