// ABOUTME: Tool-call ledger keyed by tool call id
// ABOUTME: Tracks calling/success/error status with terminal-once transitions

use std::collections::HashMap;

use wayfarer_proto::{ToolCallAnnounce, ToolCallResultData, TOOL_STATUS_SUCCESS};

use crate::types::{ToolCall, ToolStatus};

/// Outcome of a ledger update attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerUpdate {
    Applied,
    /// No entry with that id was ever announced
    Unknown,
    /// The entry already reached a terminal status
    AlreadyTerminal,
}

/// Keyed map of announced tool calls. No transitions happen here beyond
/// those driven by announcement, detail, and result events.
#[derive(Debug, Default)]
pub struct ToolLedger {
    calls: HashMap<String, ToolCall>,
}

impl ToolLedger {
    pub fn get(&self, id: &str) -> Option<&ToolCall> {
        self.calls.get(id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Register an announced call with status Calling. A duplicate
    /// announcement for an id keeps the existing entry.
    pub fn register(&mut self, announce: &ToolCallAnnounce) {
        if self.calls.contains_key(&announce.id) {
            tracing::warn!(id = %announce.id, "duplicate tool call announcement ignored");
            return;
        }
        self.calls.insert(
            announce.id.clone(),
            ToolCall {
                id: announce.id.clone(),
                function_name: announce.function_name.clone(),
                arguments: announce.arguments.clone(),
                status: ToolStatus::Calling,
                detail: None,
                result: None,
                error: None,
            },
        );
    }

    /// Record a transient progress ping. Never moves an entry to or past
    /// a terminal status; that is the result event's job.
    pub fn record_detail(&mut self, id: &str, status: &str) -> LedgerUpdate {
        let Some(call) = self.calls.get_mut(id) else {
            return LedgerUpdate::Unknown;
        };
        if call.status.is_terminal() {
            return LedgerUpdate::AlreadyTerminal;
        }
        call.detail = Some(status.to_string());
        LedgerUpdate::Applied
    }

    /// Move an entry to its terminal status with the result or error
    /// payload. Applies at most once per entry.
    pub fn resolve(&mut self, data: &ToolCallResultData, result_text: Option<String>) -> LedgerUpdate {
        let Some(call) = self.calls.get_mut(&data.tool_call_id) else {
            return LedgerUpdate::Unknown;
        };
        if call.status.is_terminal() {
            return LedgerUpdate::AlreadyTerminal;
        }
        call.status = match data.status.as_str() {
            TOOL_STATUS_SUCCESS => ToolStatus::Success,
            "not_found" => ToolStatus::NotFound,
            _ => ToolStatus::Error,
        };
        call.result = result_text;
        call.error = data.error.clone();
        LedgerUpdate::Applied
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announce(id: &str, name: &str) -> ToolCallAnnounce {
        ToolCallAnnounce {
            id: id.to_string(),
            function_name: name.to_string(),
            arguments: serde_json::json!({"city": "杭州"}),
        }
    }

    fn result(id: &str, status: &str) -> ToolCallResultData {
        ToolCallResultData {
            tool_call_id: id.to_string(),
            status: status.to_string(),
            result: None,
            error: None,
        }
    }

    #[test]
    fn register_starts_calling() {
        let mut ledger = ToolLedger::default();
        ledger.register(&announce("t1", "map_search_places"));
        let call = ledger.get("t1").unwrap();
        assert_eq!(call.status, ToolStatus::Calling);
        assert_eq!(call.function_name, "map_search_places");
        assert!(call.result.is_none());
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let mut ledger = ToolLedger::default();
        ledger.register(&announce("t1", "map_search_places"));
        ledger.register(&announce("t1", "get_weather"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("t1").unwrap().function_name, "map_search_places");
    }

    #[test]
    fn detail_updates_progress_only() {
        let mut ledger = ToolLedger::default();
        ledger.register(&announce("t1", "map_search_places"));
        assert_eq!(ledger.record_detail("t1", "calling"), LedgerUpdate::Applied);
        let call = ledger.get("t1").unwrap();
        assert_eq!(call.detail.as_deref(), Some("calling"));
        assert_eq!(call.status, ToolStatus::Calling);
    }

    #[test]
    fn detail_for_unknown_id_is_rejected() {
        let mut ledger = ToolLedger::default();
        assert_eq!(ledger.record_detail("nope", "calling"), LedgerUpdate::Unknown);
    }

    #[test]
    fn resolve_success_is_terminal() {
        let mut ledger = ToolLedger::default();
        ledger.register(&announce("t1", "map_search_places"));
        let update = ledger.resolve(&result("t1", "success"), Some("西湖".to_string()));
        assert_eq!(update, LedgerUpdate::Applied);
        let call = ledger.get("t1").unwrap();
        assert_eq!(call.status, ToolStatus::Success);
        assert_eq!(call.result.as_deref(), Some("西湖"));
    }

    #[test]
    fn resolve_twice_is_rejected() {
        let mut ledger = ToolLedger::default();
        ledger.register(&announce("t1", "map_search_places"));
        ledger.resolve(&result("t1", "success"), Some("西湖".to_string()));
        let update = ledger.resolve(&result("t1", "error"), None);
        assert_eq!(update, LedgerUpdate::AlreadyTerminal);
        assert_eq!(ledger.get("t1").unwrap().status, ToolStatus::Success);
    }

    #[test]
    fn detail_after_terminal_is_rejected() {
        let mut ledger = ToolLedger::default();
        ledger.register(&announce("t1", "map_search_places"));
        ledger.resolve(&result("t1", "success"), None);
        assert_eq!(
            ledger.record_detail("t1", "calling"),
            LedgerUpdate::AlreadyTerminal
        );
    }

    #[test]
    fn resolve_maps_statuses() {
        let mut ledger = ToolLedger::default();
        ledger.register(&announce("t1", "a"));
        ledger.register(&announce("t2", "b"));
        ledger.register(&announce("t3", "c"));
        ledger.resolve(&result("t1", "error"), None);
        ledger.resolve(&result("t2", "not_found"), None);
        ledger.resolve(&result("t3", "success"), None);
        assert_eq!(ledger.get("t1").unwrap().status, ToolStatus::Error);
        assert_eq!(ledger.get("t2").unwrap().status, ToolStatus::NotFound);
        assert_eq!(ledger.get("t3").unwrap().status, ToolStatus::Success);
    }

    #[test]
    fn clear_empties_the_ledger() {
        let mut ledger = ToolLedger::default();
        ledger.register(&announce("t1", "a"));
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
