// ABOUTME: Core types for the wayfarer session state
// ABOUTME: Role, Message, Stage, ToolCall, and connectivity types

use chrono::{DateTime, Utc};

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A finalized message in the permanent transcript. Immutable once appended.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: String) -> Self {
        Self {
            role: Role::User,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: String) -> Self {
        Self {
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: String) -> Self {
        Self {
            role: Role::System,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// What a timeline stage represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Reasoning,
    ToolInvocation,
}

/// One unit of the reasoning timeline: a span of agent narration or one
/// tool invocation. At most one stage is active per timeline, and
/// `is_completed` never reverts once set.
#[derive(Debug, Clone)]
pub struct Stage {
    pub id: u64,
    pub kind: StageKind,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_active: bool,
    pub is_completed: bool,
    pub tool_ref: Option<String>,
}

/// Tool call lifecycle status. Leaves `Calling` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Calling,
    Success,
    Error,
    NotFound,
}

impl ToolStatus {
    pub fn is_terminal(self) -> bool {
        self != ToolStatus::Calling
    }
}

/// One announced tool call tracked by the ledger
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub function_name: String,
    pub arguments: serde_json::Value,
    pub status: ToolStatus,
    /// Latest non-terminal progress text from a detail frame
    pub detail: Option<String>,
    pub result: Option<String>,
    pub error: Option<String>,
}

/// Coarse connectivity phase shown in the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityPhase {
    Connected,
    Disconnected,
    Error,
    /// Backend-reported phase string, e.g. "正在分析您的旅行需求..."
    Agent(String),
}

/// Current connectivity report. Exactly one current value, overwritten per
/// status event, cleared on hard reset.
#[derive(Debug, Clone)]
pub struct ConnectivityStatus {
    pub phase: ConnectivityPhase,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConnectivityStatus {
    pub fn new(phase: ConnectivityPhase, details: Option<String>) -> Self {
        Self {
            phase,
            details,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_user() {
        let msg = Message::user("hello".to_string());
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn message_system() {
        let msg = Message::system("oops".to_string());
        assert_eq!(msg.role, Role::System);
    }

    #[test]
    fn tool_status_terminality() {
        assert!(!ToolStatus::Calling.is_terminal());
        assert!(ToolStatus::Success.is_terminal());
        assert!(ToolStatus::Error.is_terminal());
        assert!(ToolStatus::NotFound.is_terminal());
    }

    #[test]
    fn connectivity_phase_equality() {
        assert_eq!(ConnectivityPhase::Connected, ConnectivityPhase::Connected);
        assert_ne!(
            ConnectivityPhase::Connected,
            ConnectivityPhase::Agent("thinking".to_string())
        );
    }
}
