//! UI-agnostic chat state types
//!
//! The transcript is what the presentation layer renders. It is only ever
//! mutated by the session that owns it.

use serde::{Deserialize, Serialize};

/// A chat message in the assistant conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Ordered list of messages, seeded with a welcome message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Start a transcript with a single assistant welcome message.
    pub fn seeded(welcome: &str) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(welcome)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push_user(&mut self, content: &str) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Fold the full accumulated assistant text into the transcript.
    ///
    /// Replaces the last assistant entry, except when it is the lone seeded
    /// welcome message; in that case (or after a user message) a new entry is
    /// appended.
    pub fn reconcile(&mut self, accumulated: &str) {
        let extend_last = self.messages.len() > 1
            && matches!(self.messages.last(), Some(m) if m.role == ChatRole::Assistant);

        if extend_last {
            if let Some(last) = self.messages.last_mut() {
                last.content.clear();
                last.content.push_str(accumulated);
            }
        } else {
            self.messages.push(ChatMessage::assistant(accumulated));
        }
    }

    /// Drop everything after the first `len` messages.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_transcript_has_one_assistant_message() {
        let transcript = Transcript::seeded("Welcome");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0], ChatMessage::assistant("Welcome"));
    }

    #[test]
    fn test_reconcile_never_overwrites_lone_welcome() {
        let mut transcript = Transcript::seeded("Welcome");
        transcript.reconcile("Hi");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].content, "Welcome");
        assert_eq!(transcript.messages()[1], ChatMessage::assistant("Hi"));
    }

    #[test]
    fn test_reconcile_appends_after_user_message() {
        let mut transcript = Transcript::seeded("Welcome");
        transcript.push_user("Which miner?");
        transcript.reconcile("The");
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last(), Some(&ChatMessage::assistant("The")));
    }

    #[test]
    fn test_reconcile_extends_same_entry() {
        let mut transcript = Transcript::seeded("Welcome");
        transcript.push_user("Which miner?");
        transcript.reconcile("The");
        transcript.reconcile("The S19");
        transcript.reconcile("The S19 Pro");
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.last().map(|m| m.content.as_str()), Some("The S19 Pro"));
    }

    #[test]
    fn test_reconcile_on_empty_transcript_appends() {
        let mut transcript = Transcript::default();
        transcript.reconcile("Hello");
        assert_eq!(transcript.messages(), &[ChatMessage::assistant("Hello")]);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
