// ABOUTME: Insertion-ordered stage sequence for the reasoning timeline
// ABOUTME: Append, idempotent extend, activation handoff, and closure rules

use chrono::Utc;

use crate::types::{Stage, StageKind};

/// Ordered sequence of stages. Append-only except for in-place updates to
/// the last-appended or tool-ref-matched stage.
#[derive(Debug, Default)]
pub struct Timeline {
    stages: Vec<Stage>,
    next_id: u64,
}

impl Timeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn active_count(&self) -> usize {
        self.stages.iter().filter(|s| s.is_active).count()
    }

    /// Close out the currently active stage: inactive and completed.
    /// Returns whether anything changed.
    pub fn close_active(&mut self) -> bool {
        let mut changed = false;
        for stage in &mut self.stages {
            if stage.is_active {
                stage.is_active = false;
                stage.is_completed = true;
                changed = true;
            }
        }
        changed
    }

    fn deactivate_all(&mut self) {
        for stage in &mut self.stages {
            stage.is_active = false;
        }
    }

    /// Start a new active reasoning stage with the chunk as initial content.
    pub fn begin_reasoning(&mut self, title: &str, chunk: &str) {
        self.deactivate_all();
        let stage = Stage {
            id: self.take_id(),
            kind: StageKind::Reasoning,
            title: title.to_string(),
            content: chunk.to_string(),
            timestamp: Utc::now(),
            is_active: true,
            is_completed: false,
            tool_ref: None,
        };
        self.stages.push(stage);
    }

    /// Append a chunk to the last stage if it is an open reasoning stage.
    /// The append is idempotent: a chunk already present in the stage
    /// content is skipped and the timestamp is only refreshed on a real
    /// append. Returns false when no open reasoning stage exists.
    pub fn extend_reasoning(&mut self, chunk: &str) -> bool {
        let Some(stage) = self.stages.last_mut() else {
            return false;
        };
        if stage.kind != StageKind::Reasoning || stage.is_completed {
            return false;
        }
        if !stage.content.contains(chunk) {
            stage.content.push_str(chunk);
            stage.timestamp = Utc::now();
        }
        true
    }

    /// Append one tool invocation stage. Only the first stage of an
    /// announcement batch is active; the rest are placeholders awaiting
    /// their turn.
    pub fn announce_tool(&mut self, tool_id: &str, title: &str, content: String, active: bool) {
        if active {
            self.deactivate_all();
        }
        let stage = Stage {
            id: self.take_id(),
            kind: StageKind::ToolInvocation,
            title: title.to_string(),
            content,
            timestamp: Utc::now(),
            is_active: active,
            is_completed: false,
            tool_ref: Some(tool_id.to_string()),
        };
        self.stages.push(stage);
    }

    /// Rewrite the stage linked to `tool_id` with its outcome summary and
    /// mark it inactive and completed. Returns the stage index, or None if
    /// no stage carries that tool ref.
    pub fn resolve_tool(&mut self, tool_id: &str, title: &str, content: String) -> Option<usize> {
        let idx = self
            .stages
            .iter()
            .position(|s| s.tool_ref.as_deref() == Some(tool_id))?;
        let stage = &mut self.stages[idx];
        stage.title = title.to_string();
        stage.content = content;
        stage.is_active = false;
        stage.is_completed = true;
        stage.timestamp = Utc::now();
        Some(idx)
    }

    /// Sequential execution handoff: activate the next not-yet-completed
    /// stage after `idx`, if it is a tool invocation awaiting its turn.
    pub fn activate_following(&mut self, idx: usize) {
        let candidate = self
            .stages
            .iter()
            .enumerate()
            .skip(idx + 1)
            .find(|(_, s)| !s.is_completed);
        let Some((next, stage)) = candidate else {
            return;
        };
        if stage.kind != StageKind::ToolInvocation {
            return;
        }
        self.deactivate_all();
        self.stages[next].is_active = true;
    }

    /// Mark every stage inactive and completed. Guards against a stage
    /// left open by a missed content or result event.
    pub fn freeze(&mut self) {
        for stage in &mut self.stages {
            stage.is_active = false;
            stage.is_completed = true;
        }
    }

    pub fn clear(&mut self) {
        self.stages.clear();
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_reasoning_is_active() {
        let mut tl = Timeline::default();
        tl.begin_reasoning("Reasoning", "thinking about Kyoto");
        assert_eq!(tl.len(), 1);
        assert!(tl.stages()[0].is_active);
        assert!(!tl.stages()[0].is_completed);
        assert_eq!(tl.active_count(), 1);
    }

    #[test]
    fn second_begin_deactivates_first() {
        let mut tl = Timeline::default();
        tl.begin_reasoning("Reasoning", "a");
        tl.begin_reasoning("Reasoning", "b");
        assert_eq!(tl.active_count(), 1);
        assert!(tl.stages()[1].is_active);
        assert!(!tl.stages()[0].is_active);
    }

    #[test]
    fn extend_appends_to_open_stage() {
        let mut tl = Timeline::default();
        tl.begin_reasoning("Reasoning", "first ");
        assert!(tl.extend_reasoning("second"));
        assert_eq!(tl.stages()[0].content, "first second");
    }

    #[test]
    fn extend_is_idempotent_for_duplicate_chunks() {
        let mut tl = Timeline::default();
        tl.begin_reasoning("Reasoning", "hello");
        assert!(tl.extend_reasoning("hello"));
        assert_eq!(tl.stages()[0].content, "hello");
    }

    #[test]
    fn extend_refuses_completed_stage() {
        let mut tl = Timeline::default();
        tl.begin_reasoning("Reasoning", "a");
        tl.close_active();
        assert!(!tl.extend_reasoning("b"));
        assert_eq!(tl.stages()[0].content, "a");
    }

    #[test]
    fn extend_refuses_tool_stage() {
        let mut tl = Timeline::default();
        tl.announce_tool("t1", "Calling get_weather", String::new(), true);
        assert!(!tl.extend_reasoning("chunk"));
    }

    #[test]
    fn close_active_completes() {
        let mut tl = Timeline::default();
        tl.begin_reasoning("Reasoning", "a");
        assert!(tl.close_active());
        assert!(!tl.stages()[0].is_active);
        assert!(tl.stages()[0].is_completed);
        assert!(!tl.close_active());
    }

    #[test]
    fn announce_batch_only_first_active() {
        let mut tl = Timeline::default();
        tl.announce_tool("t1", "Calling a", String::new(), true);
        tl.announce_tool("t2", "Calling b", String::new(), false);
        tl.announce_tool("t3", "Calling c", String::new(), false);
        assert_eq!(tl.active_count(), 1);
        assert!(tl.stages()[0].is_active);
    }

    #[test]
    fn resolve_tool_rewrites_and_completes() {
        let mut tl = Timeline::default();
        tl.announce_tool("t1", "Calling search", String::new(), true);
        let idx = tl.resolve_tool("t1", "search finished", "西湖".to_string());
        assert_eq!(idx, Some(0));
        let stage = &tl.stages()[0];
        assert_eq!(stage.content, "西湖");
        assert!(stage.is_completed);
        assert!(!stage.is_active);
    }

    #[test]
    fn resolve_unknown_tool_is_none() {
        let mut tl = Timeline::default();
        assert_eq!(tl.resolve_tool("nope", "x", String::new()), None);
    }

    #[test]
    fn handoff_activates_next_tool_stage() {
        let mut tl = Timeline::default();
        tl.announce_tool("t1", "Calling a", String::new(), true);
        tl.announce_tool("t2", "Calling b", String::new(), false);
        let idx = tl.resolve_tool("t1", "a finished", String::new()).unwrap();
        tl.activate_following(idx);
        assert!(tl.stages()[1].is_active);
        assert_eq!(tl.active_count(), 1);
    }

    #[test]
    fn handoff_skips_already_completed_stage() {
        let mut tl = Timeline::default();
        tl.announce_tool("t1", "Calling a", String::new(), true);
        tl.announce_tool("t2", "Calling b", String::new(), false);
        tl.announce_tool("t3", "Calling c", String::new(), false);
        // second result lands first
        let second = tl.resolve_tool("t2", "b finished", String::new()).unwrap();
        tl.activate_following(second);
        let first = tl.resolve_tool("t1", "a finished", String::new()).unwrap();
        tl.activate_following(first);
        assert!(tl.stages()[2].is_active);
        assert_eq!(tl.active_count(), 1);
    }

    #[test]
    fn handoff_stops_at_reasoning_stage() {
        let mut tl = Timeline::default();
        tl.announce_tool("t1", "Calling a", String::new(), true);
        tl.begin_reasoning("Reasoning", "after tools");
        tl.close_active();
        let idx = tl.resolve_tool("t1", "a finished", String::new()).unwrap();
        tl.activate_following(idx);
        assert_eq!(tl.active_count(), 0);
    }

    #[test]
    fn freeze_closes_everything() {
        let mut tl = Timeline::default();
        tl.begin_reasoning("Reasoning", "a");
        tl.announce_tool("t1", "Calling b", String::new(), true);
        tl.freeze();
        assert_eq!(tl.active_count(), 0);
        assert!(tl.stages().iter().all(|s| s.is_completed));
    }

    #[test]
    fn stage_ids_are_unique_and_ordered() {
        let mut tl = Timeline::default();
        tl.begin_reasoning("Reasoning", "a");
        tl.announce_tool("t1", "Calling b", String::new(), true);
        assert!(tl.stages()[0].id < tl.stages()[1].id);
    }
}
