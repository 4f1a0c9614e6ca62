use std::sync::Arc;
use crate::application::errors::BotError;
use crate::application::messaging::parser::MentionParser;
use crate::domain::entities::{DeliveryMode, MessageEvent, ResponseRule};
use crate::domain::traits::Bot;
use crate::infrastructure::config::ResponseConfig;

/// Counts of outbound sends attempted for one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseReport {
    pub sent: usize,
    pub failed: usize,
}

impl ResponseReport {
    fn record(&mut self, result: Result<String, BotError>, mode: DeliveryMode, channel: &str) {
        match result {
            Ok(_) => self.sent += 1,
            Err(e) => {
                self.failed += 1;
                tracing::warn!(mode = %mode, channel, error = %e, "Failed to send response");
            }
        }
    }

    pub fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}

/// Sends the configured responses for joins and mentions
pub struct ResponseService<B: Bot> {
    bot: B,
    config: Arc<ResponseConfig>,
}

impl<B: Bot> ResponseService<B> {
    pub fn new(bot: B, config: Arc<ResponseConfig>) -> Self {
        Self { bot, config }
    }

    pub fn bot(&self) -> &B {
        &self.bot
    }

    /// Greet a user who joined `channel_name`: public rules, then DMs, then
    /// ephemeral messages. Each rule is attempted regardless of earlier failures.
    pub async fn respond_to_join(&self, event: &MessageEvent, channel_name: &str) -> ResponseReport {
        let mut report = ResponseReport::default();

        for rule in self.config.matching(DeliveryMode::Public, channel_name) {
            tracing::info!("Sending public reply to channel {}", channel_name);
            let result = self.bot.post_message(&event.channel, &rule.response, rule.raw).await;
            report.record(result, DeliveryMode::Public, channel_name);
        }

        for rule in self.config.matching(DeliveryMode::Direct, channel_name) {
            let dm_channel = match self.bot.open_direct_channel(&event.user).await {
                Ok(channel) => channel,
                Err(e) => {
                    tracing::warn!(user = %event.user, error = %e, "Failed to open IM channel to user");
                    report.failed += 1;
                    continue;
                }
            };
            tracing::info!("Sending DM to user {}", event.user);
            let result = self.bot.post_message(&dm_channel, &rule.response, rule.raw).await;
            report.record(result, DeliveryMode::Direct, channel_name);
        }

        for rule in self.config.matching(DeliveryMode::Ephemeral, channel_name) {
            tracing::info!("Sending ephemeral reply to {} in channel {}", event.user, channel_name);
            let result = self
                .bot
                .post_ephemeral(&event.channel, &event.user, &rule.response, rule.raw)
                .await;
            report.record(result, DeliveryMode::Ephemeral, channel_name);
        }

        report
    }

    /// Answer a mention. Returns `None` when the text is not a known trigger.
    ///
    /// Every rule of the channel is echoed into the channel itself with a heading
    /// naming its delivery mode; DM and ephemeral rules are not delivered privately here.
    pub async fn respond_to_mention(
        &self,
        event: &MessageEvent,
        channel_name: &str,
        parser: &MentionParser<'_>,
    ) -> Option<ResponseReport> {
        let trigger = parser.trigger(&event.text)?;
        tracing::debug!(trigger, channel = channel_name, "Mention trigger matched");

        let mut report = ResponseReport::default();
        for mode in DeliveryMode::ALL {
            for rule in self.config.matching(mode, channel_name) {
                let text = labeled(mode, rule);
                let result = self.bot.post_message(&event.channel, &text, rule.raw).await;
                report.record(result, mode, channel_name);
            }
        }
        Some(report)
    }
}

fn labeled(mode: DeliveryMode, rule: &ResponseRule) -> String {
    format!("*{} response for this channel*:\n\n{}", mode.label(), rule.response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{Call, RecordingBot};

    fn config() -> Arc<ResponseConfig> {
        Arc::new(ResponseConfig {
            public: vec![
                ResponseRule::new("general", "welcome"),
                ResponseRule::new("random", "not here"),
            ],
            direct: vec![ResponseRule::new("general", "dm body").with_raw(true)],
            ephemeral: vec![ResponseRule::new("general", "only you")],
        })
    }

    #[tokio::test]
    async fn join_fires_every_mode_in_order() {
        let bot = Arc::new(RecordingBot::new());
        let service = ResponseService::new(bot.clone(), config());
        let event = MessageEvent::channel_join("C1", "U42");

        let report = service.respond_to_join(&event, "general").await;

        assert_eq!(report, ResponseReport { sent: 3, failed: 0 });
        assert_eq!(
            bot.calls(),
            vec![
                Call::Post { channel: "C1".into(), text: "welcome".into(), raw: false },
                Call::OpenDirect { user: "U42".into() },
                Call::Post { channel: "D-U42".into(), text: "dm body".into(), raw: true },
                Call::Ephemeral { channel: "C1".into(), user: "U42".into(), text: "only you".into(), raw: false },
            ]
        );
    }

    #[tokio::test]
    async fn failed_dm_open_skips_only_that_rule() {
        let bot = Arc::new(RecordingBot::new().fail_open_direct());
        let service = ResponseService::new(bot.clone(), config());
        let event = MessageEvent::channel_join("C1", "U42");

        let report = service.respond_to_join(&event, "general").await;

        assert_eq!(report, ResponseReport { sent: 2, failed: 1 });
        assert_eq!(bot.posts_to("D-U42").len(), 0);
        assert_eq!(bot.ephemeral_count(), 1);
    }

    #[tokio::test]
    async fn failed_post_does_not_stop_later_rules() {
        let config = Arc::new(ResponseConfig {
            public: vec![
                ResponseRule::new("general", "first"),
                ResponseRule::new("general", "second"),
                ResponseRule::new("general", "third"),
            ],
            ..Default::default()
        });
        let bot = Arc::new(RecordingBot::new().fail_post_containing("first"));
        let service = ResponseService::new(bot.clone(), config);

        let report = service
            .respond_to_join(&MessageEvent::channel_join("C1", "U1"), "general")
            .await;

        assert_eq!(report, ResponseReport { sent: 2, failed: 1 });
        assert_eq!(bot.posts_to("C1"), vec!["second".to_string(), "third".to_string()]);
    }

    #[tokio::test]
    async fn mention_echoes_rules_into_channel() {
        let bot = Arc::new(RecordingBot::new());
        let service = ResponseService::new(bot.clone(), config());
        let parser = MentionParser::new("BOT123");
        let event = MessageEvent::new("C1", "U7", "<@BOT123> Help");

        let report = service.respond_to_mention(&event, "general", &parser).await;

        assert_eq!(report, Some(ResponseReport { sent: 3, failed: 0 }));
        assert_eq!(
            bot.posts_to("C1"),
            vec![
                "*Public response for this channel*:\n\nwelcome".to_string(),
                "*DM response for this channel*:\n\ndm body".to_string(),
                "*Ephemeral response for this channel*:\n\nonly you".to_string(),
            ]
        );
        assert_eq!(bot.ephemeral_count(), 0);
    }

    #[tokio::test]
    async fn unknown_trigger_is_silent() {
        let bot = Arc::new(RecordingBot::new());
        let service = ResponseService::new(bot.clone(), config());
        let parser = MentionParser::new("BOT123");
        let event = MessageEvent::new("C1", "U7", "<@BOT123> helpme");

        assert_eq!(service.respond_to_mention(&event, "general", &parser).await, None);
        assert!(bot.calls().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_channel_sends_nothing() {
        let bot = Arc::new(RecordingBot::new());
        let service = ResponseService::new(bot.clone(), Arc::new(ResponseConfig::default()));

        let report = service
            .respond_to_join(&MessageEvent::channel_join("C1", "U1"), "general")
            .await;

        assert_eq!(report.attempted(), 0);
        assert!(bot.calls().is_empty());
    }
}
