// ABOUTME: Wire protocol frames for the wayfarer travel agent backend
// ABOUTME: Serde models for every inbound/outbound JSON frame plus decode/encode

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Agent status value that marks the end of a successful turn.
pub const STATUS_COMPLETED: &str = "completed";

/// Tool call status values carried by `tool_call_result` frames.
pub const TOOL_STATUS_SUCCESS: &str = "success";
pub const TOOL_STATUS_ERROR: &str = "error";

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Every frame the backend can push, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Status(StatusFrame),
    TravelPlan(PlanFrame),
    Stream(StreamFrame),
    Error(ErrorFrame),
    Pong(PongFrame),
}

/// Coarse agent progress report. `status` is a free-form phase string;
/// `"completed"` is the one value with reducer-level meaning.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusFrame {
    pub status: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Complete final answer delivered in one piece.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanFrame {
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Incremental streaming frame. The payload is discriminated by
/// `stream_type` with the variant body under `data`; `stage_boundary`
/// is an optional sibling flag on reasoning frames.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamFrame {
    #[serde(flatten)]
    pub payload: StreamPayload,
    #[serde(default)]
    pub stage_boundary: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "stream_type", content = "data", rename_all = "snake_case")]
pub enum StreamPayload {
    Reasoning(String),
    Content(String),
    ToolCallsStart(ToolCallsStartData),
    ToolCallDetail(ToolCallDetailData),
    ToolCallResult(ToolCallResultData),
}

/// Batch announcement of the tool calls the agent is about to execute,
/// in execution order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCallsStartData {
    pub tool_calls: Vec<ToolCallAnnounce>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCallAnnounce {
    pub id: String,
    pub function_name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// Non-terminal progress ping for one announced call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCallDetailData {
    pub tool_call_id: String,
    pub status: String,
}

/// Terminal outcome for one announced call. Exactly one of `result`
/// and `error` is populated in practice; both are optional on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCallResultData {
    pub tool_call_id: String,
    pub status: String,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ToolCallResultData {
    pub fn is_success(&self) -> bool {
        self.status == TOOL_STATUS_SUCCESS
    }
}

/// Turn-aborting failure pushed by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorFrame {
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Heartbeat reply. Decoded and dropped by the classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PongFrame {
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Frames the client sends, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    TravelRequest { content: String },
    Ping,
}

pub fn decode_frame(text: &str) -> Result<ServerFrame, ProtoError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_frame(frame: &ClientFrame) -> Result<String, ProtoError> {
    Ok(serde_json::to_string(frame)?)
}
