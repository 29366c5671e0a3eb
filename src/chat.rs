use std::collections::HashMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageType {
    User,
    Assistant,
    System,
    Error,
    Info,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageType::User => write!(f, "user"),
            MessageType::Assistant => write!(f, "assistant"),
            MessageType::System => write!(f, "system"),
            MessageType::Error => write!(f, "error"),
            MessageType::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub timestamp: DateTime<Local>,
    pub message_type: MessageType,
    pub content: String,
}

impl ChatMessage {
    pub fn new(message_type: MessageType, content: String) -> Self {
        Self {
            timestamp: Local::now(),
            message_type,
            content,
        }
    }
}

/// One conversation with its activity timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub last_active: DateTime<Local>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            last_active: Local::now(),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.last_active = Local::now();
    }

    /// Renders the user/assistant exchange as plain text, the shape the
    /// materialization pipeline analyzes.
    pub fn conversation_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| {
                matches!(
                    m.message_type,
                    MessageType::User | MessageType::Assistant
                )
            })
            .map(|m| format!("{}: {}", m.message_type, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// In-memory keyed session store.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, ChatSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, id: &str) -> &mut ChatSession {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| ChatSession::new(id))
    }

    pub fn remove(&mut self, id: &str) -> Option<ChatSession> {
        self.sessions.remove(id)
    }

    /// Session ids ordered by most recent activity.
    pub fn recent_ids(&self) -> Vec<String> {
        let mut sessions: Vec<&ChatSession> = self.sessions.values().collect();
        sessions.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        sessions.iter().map(|s| s.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_text_filters_non_dialogue_messages() {
        let mut session = ChatSession::new("s1");
        session.push(ChatMessage::new(MessageType::User, "build a cli".into()));
        session.push(ChatMessage::new(MessageType::Info, "noise".into()));
        session.push(ChatMessage::new(MessageType::Assistant, "sure".into()));

        let text = session.conversation_text();

        assert_eq!(text, "user: build a cli\nassistant: sure");
    }

    #[test]
    fn store_creates_and_removes_by_id() {
        let mut store = SessionStore::new();
        store.get_or_create("a").push(ChatMessage::new(
            MessageType::User,
            "hello".into(),
        ));

        assert_eq!(store.get_or_create("a").messages.len(), 1);
        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
    }

    #[test]
    fn pushing_updates_last_active() {
        let mut session = ChatSession::new("s");
        let before = session.last_active;
        session.push(ChatMessage::new(MessageType::User, "x".into()));

        assert!(session.last_active >= before);
    }
}
