use once_cell::sync::OnceCell;

/// The bot's own user id, set once from the first connection event.
#[derive(Debug, Default)]
pub struct BotIdentity {
    id: OnceCell<String>,
}

/// Outcome of [`BotIdentity::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// First time the identity was set
    Set,
    /// Same id seen again after a reconnect
    Unchanged,
    /// A different id was offered and ignored
    Conflict { current: String },
    /// An empty id was offered; the identity stays unset
    Rejected,
}

impl BotIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, id: &str) -> Resolution {
        if id.is_empty() {
            return Resolution::Rejected;
        }
        if self.id.set(id.to_string()).is_ok() {
            return Resolution::Set;
        }
        match self.id.get() {
            Some(current) if current == id => Resolution::Unchanged,
            Some(current) => Resolution::Conflict { current: current.clone() },
            None => Resolution::Unchanged,
        }
    }

    pub fn get(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    pub fn is_self(&self, user: &str) -> bool {
        self.get() == Some(user)
    }
}
