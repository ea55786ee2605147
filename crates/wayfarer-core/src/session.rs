// ABOUTME: Session-scoped reducer routing classified events to owned state
// ABOUTME: One synchronous apply per event, strictly in arrival order

use wayfarer_proto::{
    ServerFrame, StreamFrame, StreamPayload, ToolCallResultData, STATUS_COMPLETED,
};

use crate::answer::PendingAnswer;
use crate::ledger::{LedgerUpdate, ToolLedger};
use crate::timeline::Timeline;
use crate::transcript::Transcript;
use crate::types::{ConnectivityPhase, ConnectivityStatus};

/// Narration markers the backend embeds at reasoning stage boundaries.
pub const MARKER_REQUEST: &str = "用户请求：";
pub const MARKER_TOOL_CALL: &str = "开始调用工具";
pub const MARKER_TOOL_RESULT: &str = "正在处理工具返回";

const DEFAULT_REASONING_TITLE: &str = "Reasoning";

/// Tool results shown on the timeline are cut to this many characters.
/// Matches the backend's own log truncation length.
const RESULT_PREVIEW_CHARS: usize = 200;

const ABORTED_TURN_NOTICE: &str = "Connection lost. The current turn was aborted.";

/// Everything the reducer can react to: decoded frames plus the transport
/// notifications from the connection manager, in one arrival-ordered stream.
#[derive(Debug)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    TransportError(String),
    Frame(ServerFrame),
}

/// All semantic state for one session. Rebuilt from empty on every new
/// session; the connection manager owns nothing but the channel.
#[derive(Debug, Default)]
pub struct SessionState {
    pub transcript: Transcript,
    pub timeline: Timeline,
    pub ledger: ToolLedger,
    pub pending_answer: Option<PendingAnswer>,
    pub connectivity: Option<ConnectivityStatus>,
    revision: u64,
    turn_active: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped on every mutation; views redraw and re-scroll when it moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn turn_active(&self) -> bool {
        self.turn_active
    }

    /// Record the user's message at send time. Optimistic: never rolled
    /// back, a failed send surfaces later as a system error message.
    pub fn push_user_message(&mut self, content: String) {
        self.transcript.push_user(content);
        self.turn_active = true;
        self.bump();
    }

    /// Reduce one event. Returns true when the event ended the turn, so
    /// the caller can release the send gate.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Connected => {
                self.connectivity =
                    Some(ConnectivityStatus::new(ConnectivityPhase::Connected, None));
                self.bump();
                false
            }
            SessionEvent::Disconnected => {
                self.connectivity =
                    Some(ConnectivityStatus::new(ConnectivityPhase::Disconnected, None));
                let aborted = self.turn_active;
                if aborted {
                    self.transcript.push_system(ABORTED_TURN_NOTICE.to_string());
                    self.reset_turn_state();
                    self.turn_active = false;
                }
                self.bump();
                aborted
            }
            SessionEvent::TransportError(message) => {
                self.connectivity = Some(ConnectivityStatus::new(
                    ConnectivityPhase::Error,
                    Some(message),
                ));
                self.bump();
                false
            }
            SessionEvent::Frame(frame) => self.apply_frame(frame),
        }
    }

    fn apply_frame(&mut self, frame: ServerFrame) -> bool {
        match frame {
            ServerFrame::Status(status) => {
                let completed = status.status == STATUS_COMPLETED;
                self.connectivity = Some(ConnectivityStatus::new(
                    ConnectivityPhase::Agent(status.status),
                    status.details,
                ));
                if completed {
                    self.finish_turn();
                }
                self.bump();
                completed
            }
            ServerFrame::TravelPlan(plan) => {
                // fast path: the backend skipped incremental streaming
                self.transcript.push_assistant(plan.content);
                self.reset_turn_state();
                self.connectivity = None;
                self.turn_active = false;
                self.bump();
                true
            }
            ServerFrame::Error(error) => {
                self.transcript.push_system(error.content.clone());
                self.reset_turn_state();
                self.connectivity = Some(ConnectivityStatus::new(
                    ConnectivityPhase::Error,
                    Some(error.content),
                ));
                self.turn_active = false;
                self.bump();
                true
            }
            ServerFrame::Pong(_) => {
                tracing::trace!("pong");
                false
            }
            ServerFrame::Stream(stream) => {
                self.apply_stream(stream);
                false
            }
        }
    }

    fn apply_stream(&mut self, frame: StreamFrame) {
        match frame.payload {
            StreamPayload::Reasoning(chunk) => {
                self.apply_reasoning(&chunk, frame.stage_boundary);
                self.bump();
            }
            StreamPayload::Content(fragment) => {
                // content streaming implicitly ends the reasoning phase
                self.timeline.close_active();
                self.pending_answer
                    .get_or_insert_with(PendingAnswer::default)
                    .append(&fragment);
                self.bump();
            }
            StreamPayload::ToolCallsStart(data) => {
                self.timeline.close_active();
                for (i, call) in data.tool_calls.iter().enumerate() {
                    self.ledger.register(call);
                    let content = if call.arguments.is_null() {
                        String::new()
                    } else {
                        call.arguments.to_string()
                    };
                    self.timeline.announce_tool(
                        &call.id,
                        &format!("Calling {}", call.function_name),
                        content,
                        i == 0,
                    );
                }
                self.bump();
            }
            StreamPayload::ToolCallDetail(detail) => {
                match self.ledger.record_detail(&detail.tool_call_id, &detail.status) {
                    LedgerUpdate::Applied => self.bump(),
                    LedgerUpdate::Unknown => {
                        tracing::warn!(id = %detail.tool_call_id, "detail for unannounced tool call dropped");
                    }
                    LedgerUpdate::AlreadyTerminal => {
                        tracing::warn!(id = %detail.tool_call_id, "detail for finished tool call dropped");
                    }
                }
            }
            StreamPayload::ToolCallResult(result) => self.apply_tool_result(result),
        }
    }

    fn apply_reasoning(&mut self, chunk: &str, stage_boundary: Option<bool>) {
        let marker = boundary_title(chunk);
        if stage_boundary == Some(true) || marker.is_some() {
            self.timeline.close_active();
            self.timeline
                .begin_reasoning(marker.unwrap_or(DEFAULT_REASONING_TITLE), chunk);
        } else if !self.timeline.extend_reasoning(chunk) {
            self.timeline.begin_reasoning(DEFAULT_REASONING_TITLE, chunk);
        }
    }

    fn apply_tool_result(&mut self, data: ToolCallResultData) {
        let function_name = match self.ledger.get(&data.tool_call_id) {
            Some(call) => call.function_name.clone(),
            None => {
                tracing::warn!(id = %data.tool_call_id, "result for unannounced tool call dropped");
                return;
            }
        };
        let result_text = data.result.as_ref().map(stringify_result);
        if self.ledger.resolve(&data, result_text.clone()) == LedgerUpdate::AlreadyTerminal {
            tracing::warn!(id = %data.tool_call_id, "duplicate tool call result dropped");
            return;
        }
        let (title, content) = if data.is_success() {
            (
                format!("{function_name} finished"),
                truncate_preview(result_text.as_deref().unwrap_or("")),
            )
        } else {
            (
                format!("{function_name} failed"),
                data.error
                    .clone()
                    .unwrap_or_else(|| "tool call failed".to_string()),
            )
        };
        match self.timeline.resolve_tool(&data.tool_call_id, &title, content) {
            Some(idx) => self.timeline.activate_following(idx),
            None => {
                tracing::warn!(id = %data.tool_call_id, "no timeline stage for tool call result");
            }
        }
        self.bump();
    }

    /// Turn completion: finalize a non-empty pending answer, clear the
    /// ledger, and close every stage still open.
    fn finish_turn(&mut self) {
        if let Some(pending) = self.pending_answer.take() {
            if !pending.is_empty() {
                self.transcript.push_assistant(pending.content);
            }
        }
        self.ledger.clear();
        self.timeline.freeze();
        self.turn_active = false;
    }

    fn reset_turn_state(&mut self) {
        self.timeline.clear();
        self.ledger.clear();
        self.pending_answer = None;
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

fn boundary_title(chunk: &str) -> Option<&'static str> {
    if chunk.contains(MARKER_REQUEST) {
        Some("Analyzing request")
    } else if chunk.contains(MARKER_TOOL_CALL) {
        Some("Preparing tool calls")
    } else if chunk.contains(MARKER_TOOL_RESULT) {
        Some("Processing tool results")
    } else {
        None
    }
}

fn stringify_result(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate_preview(text: &str) -> String {
    match text.char_indices().nth(RESULT_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
