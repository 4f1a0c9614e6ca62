/// Subtype of a posted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSubtype {
    /// A plain user message
    None,
    /// A user joined the channel
    ChannelJoin,
    Other(String),
}

impl MessageSubtype {
    pub fn from_wire(subtype: Option<&str>) -> Self {
        match subtype {
            None | Some("") => MessageSubtype::None,
            Some("channel_join") => MessageSubtype::ChannelJoin,
            Some(other) => MessageSubtype::Other(other.to_string()),
        }
    }
}

/// A message posted in a channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub subtype: MessageSubtype,
    /// Opaque channel id, e.g. `C024BE91L`
    pub channel: String,
    /// Author id; for joins, the user who joined
    pub user: String,
    pub text: String,
}

impl MessageEvent {
    pub fn new(channel: impl Into<String>, user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            subtype: MessageSubtype::None,
            channel: channel.into(),
            user: user.into(),
            text: text.into(),
        }
    }

    pub fn channel_join(channel: impl Into<String>, user: impl Into<String>) -> Self {
        let user = user.into();
        let text = format!("<@{}> has joined the channel", user);
        Self {
            subtype: MessageSubtype::ChannelJoin,
            channel: channel.into(),
            user,
            text,
        }
    }

    pub fn with_subtype(mut self, subtype: MessageSubtype) -> Self {
        self.subtype = subtype;
        self
    }
}

/// Events delivered by the connection manager, one per loop iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A session was established
    Connected { self_id: String, connection_count: u32 },
    Message(MessageEvent),
    /// Non-fatal transport or protocol error
    ConnectionError { message: String },
    /// The platform rejected the credentials
    InvalidAuth,
    /// Anything the bot does not act on
    Other { kind: String },
}

impl InboundEvent {
    pub fn kind(&self) -> &str {
        match self {
            InboundEvent::Connected { .. } => "connected",
            InboundEvent::Message(_) => "message",
            InboundEvent::ConnectionError { .. } => "connection_error",
            InboundEvent::InvalidAuth => "invalid_auth",
            InboundEvent::Other { kind } => kind,
        }
    }
}
