//! Mention parser - Recognizes messages addressed to the bot

/// Words the bot answers when mentioned
pub const TRIGGERS: &[&str] = &["help"];

/// Parses mention-prefixed messages for a known bot id
pub struct MentionParser<'a> {
    bot_id: &'a str,
}

impl<'a> MentionParser<'a> {
    pub fn new(bot_id: &'a str) -> Self {
        Self { bot_id }
    }

    /// `<@ID>`
    pub fn prefix(&self) -> String {
        format!("<@{}>", self.bot_id)
    }

    /// Whether the text starts with the bot's mention token
    pub fn is_mention(&self, text: &str) -> bool {
        !self.bot_id.is_empty() && text.starts_with(&self.prefix())
    }

    /// Strip the leading `<@ID> `, trim and lowercase
    pub fn normalize(&self, text: &str) -> String {
        let token = format!("{} ", self.prefix());
        text.strip_prefix(&token)
            .unwrap_or(text)
            .trim()
            .to_lowercase()
    }

    /// The trigger the text asks for, if any
    pub fn trigger(&self, text: &str) -> Option<&'static str> {
        let normalized = self.normalize(text);
        TRIGGERS.iter().copied().find(|t| *t == normalized)
    }
}
