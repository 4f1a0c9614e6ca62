//! Event dispatcher - Routes inbound platform events to the response handlers

use std::sync::Arc;
use tokio::sync::mpsc;
use crate::application::errors::BotError;
use crate::application::services::{ResponseReport, ResponseService};
use crate::domain::entities::{BotIdentity, InboundEvent, MessageEvent, MessageSubtype, Resolution};
use crate::domain::traits::Bot;
use crate::infrastructure::config::ResponseConfig;
use super::parser::MentionParser;

/// Lifecycle of the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// No identity resolved yet
    Connecting,
    Active,
    /// Credentials were rejected; terminal
    Stopped,
}

/// Which handler a message goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Join,
    Mention,
}

/// Single consumer of the event stream. Each event, including its outbound
/// sends, is finished before the next one is taken.
pub struct EventDispatcher<B: Bot> {
    responses: ResponseService<B>,
    identity: BotIdentity,
    state: DispatcherState,
}

impl<B: Bot> EventDispatcher<B> {
    pub fn new(bot: B, config: Arc<ResponseConfig>) -> Self {
        Self {
            responses: ResponseService::new(bot, config),
            identity: BotIdentity::new(),
            state: DispatcherState::Connecting,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    /// Consume events until the stream closes or the credentials are rejected
    pub async fn run(&mut self, mut events: mpsc::Receiver<InboundEvent>) -> Result<(), BotError> {
        tracing::info!("Starting event loop...");
        while let Some(event) = events.recv().await {
            if self.handle(event).await == DispatcherState::Stopped {
                return Err(BotError::Auth("Invalid credentials".to_string()));
            }
        }
        tracing::info!("Event stream closed");
        Ok(())
    }

    /// Process one event and return the resulting state
    pub async fn handle(&mut self, event: InboundEvent) -> DispatcherState {
        if self.state == DispatcherState::Stopped {
            return self.state;
        }
        tracing::trace!(kind = event.kind(), "Event received");

        match event {
            InboundEvent::Connected { self_id, connection_count } => {
                match self.identity.resolve(&self_id) {
                    Resolution::Rejected => {
                        tracing::warn!(connection_count, "Connected without a bot id, waiting for the next session");
                        return self.state;
                    }
                    Resolution::Conflict { current } => {
                        tracing::warn!(current = %current, offered = %self_id, "Ignoring a second bot identity");
                    }
                    Resolution::Set | Resolution::Unchanged => {}
                }
                tracing::info!(connection_count, bot_id = %self_id, "Connected to Slack");
                self.state = DispatcherState::Active;
            }
            InboundEvent::Message(message) => {
                self.on_message(&message).await;
            }
            InboundEvent::ConnectionError { message } => {
                tracing::error!("Error: {}", message);
            }
            InboundEvent::InvalidAuth => {
                tracing::error!("Invalid credentials");
                self.state = DispatcherState::Stopped;
            }
            InboundEvent::Other { .. } => {}
        }

        self.state
    }

    fn route(&self, message: &MessageEvent) -> Option<Route> {
        match &message.subtype {
            MessageSubtype::ChannelJoin => Some(Route::Join),
            MessageSubtype::None => {
                let bot_id = self.identity.get()?;
                let parser = MentionParser::new(bot_id);
                if !self.identity.is_self(&message.user) && parser.is_mention(&message.text) {
                    Some(Route::Mention)
                } else {
                    None
                }
            }
            MessageSubtype::Other(_) => None,
        }
    }

    async fn on_message(&self, message: &MessageEvent) {
        let Some(route) = self.route(message) else {
            return;
        };

        let channel_name = match self.responses.bot().channel_name(&message.channel).await {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(channel = %message.channel, error = %e, "Channel lookup failed, dropping event");
                return;
            }
        };

        let report = match route {
            Route::Join => {
                tracing::info!("channel_join seen on channel: {}", message.channel);
                self.responses.respond_to_join(message, &channel_name).await
            }
            Route::Mention => {
                tracing::info!("message seen on public channel: {}", message.channel);
                let Some(bot_id) = self.identity.get() else {
                    return;
                };
                let parser = MentionParser::new(bot_id);
                match self.responses.respond_to_mention(message, &channel_name, &parser).await {
                    Some(report) => report,
                    None => return,
                }
            }
        };

        log_report(&channel_name, report);
    }
}

fn log_report(channel_name: &str, report: ResponseReport) {
    if report.failed > 0 {
        tracing::warn!(channel = channel_name, sent = report.sent, failed = report.failed, "Some responses were not delivered");
    } else if report.sent > 0 {
        tracing::debug!(channel = channel_name, sent = report.sent, "Responses delivered");
    }
}
