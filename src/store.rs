use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Greeting inserted once per session when the store is first seeded.
pub const SEED_GREETING: &str = "سلام 👋 من بات هوشمند زیمر هستم. چطور می‌تونم کمکتون کنم؟";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Local>,
    pub is_fallback: bool,
}

/// Conversation state: the append-only message log plus the two UI flags.
///
/// Owned by the [`App`](crate::app::App); all mutation happens on the UI
/// task. The `seeded`/`greeted` one-shots gate the session's greeting
/// behavior explicitly instead of inferring it from the message count.
#[derive(Debug, Default)]
pub struct ChatStore {
    messages: Vec<Message>,
    is_loading: bool,
    is_open: bool,
    seeded: bool,
    greeted: bool,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, assigning its id and creation instant.
    ///
    /// No validation at this layer; the controller enforces non-empty
    /// input before calling.
    pub fn push(&mut self, text: impl Into<String>, sender: Sender, is_fallback: bool) {
        self.messages.push(Message {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp: Local::now(),
            is_fallback,
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
    }

    /// Empties the log. Open/loading state and the one-shot flags are
    /// untouched; the greeting is not re-inserted.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Inserts the fixed greeting the first time this is called.
    /// Subsequent calls are no-ops.
    pub fn seed_greeting(&mut self) {
        if self.seeded {
            return;
        }
        self.seeded = true;
        self.push(SEED_GREETING, Sender::Bot, false);
    }

    /// One-shot gate for the silent auto-greeting request. Returns true
    /// exactly once per session.
    pub fn mark_greeted(&mut self) -> bool {
        if self.greeted {
            return false;
        }
        self.greeted = true;
        true
    }
}
