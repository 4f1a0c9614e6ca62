//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::application::errors::ConfigError;
use crate::domain::entities::{DeliveryMode, ResponseRule};

/// Environment variable holding the bot token
pub const TOKEN_ENV: &str = "SLACK_TOKEN";

/// Environment variable overriding the Web API base URL
pub const API_BASE_ENV: &str = "SLACK_API_BASE";

pub const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Per-channel response rules, one ordered list per delivery mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResponseConfig {
    #[serde(rename = "responses", default)]
    pub public: Vec<ResponseRule>,
    #[serde(rename = "dmresponses", default)]
    pub direct: Vec<ResponseRule>,
    #[serde(rename = "ephresponses", default)]
    pub ephemeral: Vec<ResponseRule>,
}

impl ResponseConfig {
    /// Load rules from a JSON file.
    ///
    /// An unreadable file is an error. A file that reads but does not decode is
    /// logged and yields an empty config, so the bot still runs and answers nothing.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        match Self::parse(&content) {
            Ok(config) => {
                tracing::info!(
                    path = %path.display(),
                    public = config.public.len(),
                    dm = config.direct.len(),
                    ephemeral = config.ephemeral.len(),
                    "Loaded response rules"
                );
                Ok(config)
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Config did not decode, starting with zero rules");
                Ok(Self::default())
            }
        }
    }

    /// Strict decoder
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn rules(&self, mode: DeliveryMode) -> &[ResponseRule] {
        match mode {
            DeliveryMode::Public => &self.public,
            DeliveryMode::Direct => &self.direct,
            DeliveryMode::Ephemeral => &self.ephemeral,
        }
    }

    /// Rules of one mode whose channel equals `channel_name`, in file order
    pub fn matching<'a>(
        &'a self,
        mode: DeliveryMode,
        channel_name: &'a str,
    ) -> impl Iterator<Item = &'a ResponseRule> + 'a {
        self.rules(mode).iter().filter(move |r| r.applies_to(channel_name))
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.direct.is_empty() && self.ephemeral.is_empty()
    }

    /// Example config printed by `init-config`
    pub fn sample() -> Self {
        Self {
            public: vec![ResponseRule::new(
                "general",
                "Welcome to #general! Please read the pinned messages.",
            )],
            direct: vec![ResponseRule::new(
                "general",
                "Hi! Thanks for joining #general. Ask me for `help` there any time.",
            )],
            ephemeral: vec![ResponseRule::new(
                "general",
                "Only you can see this: the channel guidelines are pinned.",
            )
            .with_raw(true)],
        }
    }
}

/// Runtime settings taken from the environment
#[derive(Clone)]
pub struct Settings {
    pub token: String,
    pub api_base: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &redact(&self.token))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup(TOKEN_ENV)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField(TOKEN_ENV.to_string()))?;

        let api_base = lookup(API_BASE_ENV)
            .map(|b| b.trim().trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self { token, api_base })
    }
}

/// First 8 characters of a secret, for logs
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(8).collect();
    format!("{}...", prefix)
}
