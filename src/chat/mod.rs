//! Table chat messages
//!
//! Messages are append-only. Every store keeps only the most recent
//! [`CHAT_HISTORY_LIMIT`] messages per session.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages retained per session
pub const CHAT_HISTORY_LIMIT: usize = 100;

/// Sender of bookkeeping messages
pub const SYSTEM_SENDER: &str = "System";
/// Sender of combat round notifications
pub const COMBAT_SENDER: &str = "Combat";
/// Sender of AI assistant answers
pub const ORACLE_SENDER: &str = "Oracle";

const SYSTEM_SENDER_ID: &str = "sys";
const ORACLE_SENDER_ID: &str = "ai";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Text,
    Roll,
    System,
    Ai,
}

/// Dice roll attached to a ROLL message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollData {
    pub formula: String,
    /// Individual die results
    pub results: Vec<u32>,
    pub total: i32,
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "isGM", default)]
    pub is_gm: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll_data: Option<RollData>,
}

impl ChatMessage {
    fn build(sender_id: &str, sender_name: &str, content: String, kind: MessageType, is_gm: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            content,
            kind,
            timestamp: Utc::now(),
            is_gm,
            roll_data: None,
        }
    }

    /// Plain text typed by a user
    pub fn text(sender_id: &str, sender_name: &str, content: &str, is_gm: bool) -> Self {
        Self::build(sender_id, sender_name, content.to_string(), MessageType::Text, is_gm)
    }

    /// A dice roll made by a user
    pub fn roll(sender_id: &str, sender_name: &str, is_gm: bool, roll: RollData) -> Self {
        let content = format!("Rolled {}", roll.formula);
        let mut msg = Self::build(sender_id, sender_name, content, MessageType::Roll, is_gm);
        msg.roll_data = Some(roll);
        msg
    }

    /// Bookkeeping notice from the table itself
    pub fn system(content: impl Into<String>) -> Self {
        Self::build(SYSTEM_SENDER_ID, SYSTEM_SENDER, content.into(), MessageType::System, true)
    }

    /// Announcement that a new combat round has begun
    pub fn round_start(round: u32) -> Self {
        let content = format!("--- Round {} begins ---", round);
        Self::build(SYSTEM_SENDER_ID, COMBAT_SENDER, content, MessageType::System, true)
    }

    /// Answer from the Oracle
    pub fn oracle(answer: impl Into<String>) -> Self {
        Self::build(ORACLE_SENDER_ID, ORACLE_SENDER, answer.into(), MessageType::Ai, true)
    }
}

/// Bounded, chronological message log with FIFO eviction
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
    limit: usize,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::with_limit(CHAT_HISTORY_LIMIT)
    }
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(limit.min(CHAT_HISTORY_LIMIT)),
            limit,
        }
    }

    /// Append a message, evicting the oldest past the limit
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Chronological copy of the log
    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let msg = ChatMessage::roll(
            "u1",
            "alice",
            false,
            RollData {
                formula: "1d20+2".to_string(),
                results: vec![14],
                total: 16,
            },
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "ROLL");
        assert_eq!(json["isGM"], false);
        assert_eq!(json["senderName"], "alice");
        assert_eq!(json["content"], "Rolled 1d20+2");
        assert_eq!(json["rollData"]["results"][0], 14);

        let back: ChatMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_oracle_message_type() {
        let msg = ChatMessage::oracle("Roll under your DES.");
        assert_eq!(msg.kind, MessageType::Ai);
        assert_eq!(msg.sender_name, ORACLE_SENDER);
        assert_eq!(serde_json::to_value(msg.kind).unwrap(), "AI");
    }

    #[test]
    fn test_round_start() {
        let msg = ChatMessage::round_start(3);
        assert_eq!(msg.kind, MessageType::System);
        assert_eq!(msg.sender_name, COMBAT_SENDER);
        assert!(msg.content.contains("Round 3"));
    }

    #[test]
    fn test_chat_log_evicts_oldest() {
        let mut log = ChatLog::new();
        for i in 0..(CHAT_HISTORY_LIMIT + 5) {
            log.push(ChatMessage::system(format!("msg {}", i)));
        }
        assert_eq!(log.len(), CHAT_HISTORY_LIMIT);
        let messages = log.to_vec();
        assert_eq!(messages[0].content, "msg 5");
        assert_eq!(messages[CHAT_HISTORY_LIMIT - 1].content, "msg 104");
    }
}
