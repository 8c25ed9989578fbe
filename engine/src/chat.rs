//! Chat session log.
//!
//! The daemon holds no conversation state; every send carries the full
//! transcript and comes back with one reply turn. The log grows by exactly
//! two turns per completed send: the user's turn (appended optimistically)
//! and either the assistant's reply or a system turn recording why the
//! reply never arrived.

use anvil_types::ChatMessage;

use crate::form::FieldEditor;

/// The transcript, the input line, and the single in-flight send.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    input: FieldEditor,
    waiting: bool,
}

impl ChatSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True between a submit and its resolution. Further submits are refused.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    #[must_use]
    pub fn input(&self) -> &FieldEditor {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut FieldEditor {
        &mut self.input
    }

    /// Commit the input line as a user turn. Returns the transcript to send,
    /// or `None` when the input is blank or a send is already in flight.
    pub fn submit(&mut self) -> Option<Vec<ChatMessage>> {
        if self.waiting || self.input.text().trim().is_empty() {
            return None;
        }
        let content = self.input.text().to_string();
        self.input.set_text("");
        self.messages.push(ChatMessage::user(content));
        self.waiting = true;
        Some(self.messages.clone())
    }

    /// Append the daemon's reply turn.
    pub fn resolve_reply(&mut self, reply: ChatMessage) {
        self.messages.push(reply);
        self.waiting = false;
    }

    /// Record a failed delivery as a system turn. The user's turn stays in
    /// the log; what was sent was sent.
    pub fn resolve_failure(&mut self, message: impl std::fmt::Display) {
        self.messages.push(ChatMessage::system(format!("Error: {message}")));
        self.waiting = false;
    }
}
