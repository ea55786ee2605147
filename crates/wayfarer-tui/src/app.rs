// ABOUTME: Central application state and event handling
// ABOUTME: Single struct holds all state, mutations happen in handle_* methods

use std::path::Path;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use tui_textarea::TextArea;

use wayfarer_client::ClientEvent;
use wayfarer_core::{SessionEvent, SessionState};

const MAX_HISTORY: usize = 100;

/// Actions that need async handling (returned from handle_key)
pub enum Action {
    Quit,
    SendMessage(String),
    Reconnect,
}

/// Input mode. Sending blocks the composer until the turn ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Chat,
    Sending,
}

/// State persisted across runs
#[derive(Serialize, Deserialize, Default)]
pub struct PersistedState {
    pub last_session: Option<String>,
    #[serde(default)]
    pub input_history: Vec<String>,
}

/// Central application state
pub struct App {
    pub mode: Mode,

    // Session state owned by the reducer
    pub session: SessionState,
    pub session_id: String,

    // Input state
    pub input: TextArea<'static>,
    pub input_history: Vec<String>,
    pub history_index: Option<usize>,

    // Scroll state, one offset per pane
    pub transcript_scroll: usize,
    pub timeline_scroll: usize,

    pub error: Option<String>,

    // Quit handling
    pub last_ctrl_c: Option<Instant>,

    // Throbber animation frame
    pub throbber_frame: usize,

    last_revision: u64,
}

/// Translate connection manager events into reducer events
pub fn to_session_event(event: ClientEvent) -> SessionEvent {
    match event {
        ClientEvent::Connected => SessionEvent::Connected,
        ClientEvent::Disconnected => SessionEvent::Disconnected,
        ClientEvent::TransportError(message) => SessionEvent::TransportError(message),
        ClientEvent::Frame(frame) => SessionEvent::Frame(frame),
    }
}

impl App {
    pub fn new(session_id: String) -> Self {
        Self {
            mode: Mode::Chat,
            session: SessionState::new(),
            session_id,
            input: TextArea::default(),
            input_history: vec![],
            history_index: None,
            transcript_scroll: 0,
            timeline_scroll: 0,
            error: None,
            last_ctrl_c: None,
            throbber_frame: 0,
            last_revision: 0,
        }
    }

    pub fn load(state_dir: &Path, initial_session: Option<String>) -> Self {
        let state_path = state_dir.join("state.json");
        let persisted: PersistedState = std::fs::read_to_string(&state_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        let session_id = initial_session
            .or(persisted.last_session)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut app = Self::new(session_id);
        app.input_history = persisted.input_history;
        app
    }

    pub fn save(&self, state_dir: &Path) -> anyhow::Result<()> {
        let state_path = state_dir.join("state.json");

        let persisted = PersistedState {
            last_session: Some(self.session_id.clone()),
            input_history: self
                .input_history
                .iter()
                .rev()
                .take(MAX_HISTORY)
                .rev()
                .cloned()
                .collect(),
        };

        std::fs::create_dir_all(state_dir)?;
        std::fs::write(&state_path, serde_json::to_string_pretty(&persisted)?)?;
        Ok(())
    }

    /// Advance throbber animation
    pub fn tick(&mut self) {
        self.throbber_frame = (self.throbber_frame + 1) % 8;
    }

    /// Get current throbber character
    pub fn throbber_char(&self) -> char {
        const THROBBER: [char; 8] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];
        THROBBER[self.throbber_frame]
    }

    /// Snap both panes back to the newest content whenever the reducer
    /// mutated anything since the last draw.
    pub fn observe_revision(&mut self) {
        let revision = self.session.revision();
        if revision != self.last_revision {
            self.last_revision = revision;
            self.transcript_scroll = 0;
            self.timeline_scroll = 0;
        }
    }

    /// Apply one event from the connection. Returns true when the event
    /// ended the turn, so the caller can release the send gate.
    pub fn handle_client_event(&mut self, event: ClientEvent) -> bool {
        let turn_ended = self.session.apply(to_session_event(event));
        if turn_ended {
            self.mode = Mode::Chat;
        }
        turn_ended
    }

    /// Handle a key event, returning an action if needed
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        // Global keys
        match key.code {
            KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(Action::Quit);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(last) = self.last_ctrl_c {
                    if last.elapsed() < Duration::from_millis(500) {
                        return Some(Action::Quit);
                    }
                }
                self.last_ctrl_c = Some(Instant::now());
                return None;
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Some(Action::Reconnect);
            }
            _ => {}
        }

        match self.mode {
            Mode::Chat => self.handle_chat_key(key),
            // Input is frozen while a turn is in flight
            Mode::Sending => self.handle_scroll_key(key),
        }
    }

    fn handle_scroll_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::PageUp => {
                self.transcript_scroll = self.transcript_scroll.saturating_add(10);
            }
            KeyCode::PageDown => {
                self.transcript_scroll = self.transcript_scroll.saturating_sub(10);
            }
            KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.timeline_scroll = self.timeline_scroll.saturating_add(1);
            }
            KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.timeline_scroll = self.timeline_scroll.saturating_sub(1);
            }
            _ => {}
        }
        None
    }

    fn handle_chat_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::PageUp
            | KeyCode::PageDown => {
                return self.handle_scroll_key(key);
            }
            KeyCode::Up | KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return self.handle_scroll_key(key);
            }

            // History navigation (when input empty or already browsing)
            KeyCode::Up if self.input.is_empty() || self.history_index.is_some() => {
                self.navigate_history(-1);
            }
            KeyCode::Down if self.input.is_empty() || self.history_index.is_some() => {
                self.navigate_history(1);
            }

            // Send message
            KeyCode::Enter if !key.modifiers.contains(KeyModifiers::SHIFT) => {
                let content = self.input.lines().join("\n").trim().to_string();
                if !content.is_empty() {
                    self.input_history.push(content.clone());
                    self.history_index = None;
                    self.input = TextArea::default();
                    self.error = None;
                    self.mode = Mode::Sending;
                    return Some(Action::SendMessage(content));
                }
            }

            // Pass to textarea
            _ => {
                self.input.input(key);
            }
        }
        None
    }

    fn navigate_history(&mut self, direction: i32) {
        if self.input_history.is_empty() {
            return;
        }

        let new_index = match self.history_index {
            None if direction < 0 => Some(self.input_history.len() - 1),
            None => None,
            Some(i) => {
                let new = i as i32 + direction;
                if new < 0 || new >= self.input_history.len() as i32 {
                    None
                } else {
                    Some(new as usize)
                }
            }
        };

        self.history_index = new_index;
        self.input = TextArea::default();
        if let Some(i) = new_index {
            for line in self.input_history[i].lines() {
                self.input.insert_str(line);
                self.input.insert_newline();
            }
            // Remove trailing newline
            self.input.delete_char();
        }
    }

    /// Check if Ctrl+C hint should be shown
    pub fn show_ctrl_c_hint(&self) -> bool {
        self.last_ctrl_c
            .map(|t| t.elapsed() < Duration::from_millis(500))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_proto::decode_frame;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn new_starts_in_chat_mode() {
        let app = App::new("s1".to_string());
        assert_eq!(app.mode, Mode::Chat);
        assert_eq!(app.session_id, "s1");
    }

    #[test]
    fn enter_sends_trimmed_input_and_freezes_composer() {
        let mut app = App::new("s1".to_string());
        app.input.insert_str("  去杭州玩三天  ");
        let action = app.handle_key(key(KeyCode::Enter));
        match action {
            Some(Action::SendMessage(content)) => assert_eq!(content, "去杭州玩三天"),
            _ => panic!("expected a send action"),
        }
        assert_eq!(app.mode, Mode::Sending);
        assert!(app.input.is_empty());
        assert_eq!(app.input_history, vec!["去杭州玩三天".to_string()]);
    }

    #[test]
    fn enter_on_empty_input_does_nothing() {
        let mut app = App::new("s1".to_string());
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert_eq!(app.mode, Mode::Chat);
    }

    #[test]
    fn sending_mode_swallows_typing() {
        let mut app = App::new("s1".to_string());
        app.mode = Mode::Sending;
        assert!(app.handle_key(key(KeyCode::Char('x'))).is_none());
        assert!(app.input.is_empty());
    }

    #[test]
    fn double_ctrl_c_quits() {
        let mut app = App::new("s1".to_string());
        assert!(app.handle_key(ctrl('c')).is_none());
        assert!(matches!(app.handle_key(ctrl('c')), Some(Action::Quit)));
    }

    #[test]
    fn ctrl_r_requests_reconnect() {
        let mut app = App::new("s1".to_string());
        assert!(matches!(app.handle_key(ctrl('r')), Some(Action::Reconnect)));
    }

    #[test]
    fn history_navigation_restores_previous_input() {
        let mut app = App::new("s1".to_string());
        app.input_history = vec!["first".to_string(), "second".to_string()];
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.input.lines().join("\n"), "second");
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.input.lines().join("\n"), "first");
        app.handle_key(key(KeyCode::Down));
        assert_eq!(app.input.lines().join("\n"), "second");
    }

    #[test]
    fn page_keys_scroll_the_transcript() {
        let mut app = App::new("s1".to_string());
        app.handle_key(key(KeyCode::PageUp));
        assert_eq!(app.transcript_scroll, 10);
        app.handle_key(key(KeyCode::PageDown));
        assert_eq!(app.transcript_scroll, 0);
    }

    #[test]
    fn revision_change_resets_scroll() {
        let mut app = App::new("s1".to_string());
        app.transcript_scroll = 5;
        app.timeline_scroll = 3;
        app.session.push_user_message("hi".to_string());
        app.observe_revision();
        assert_eq!(app.transcript_scroll, 0);
        assert_eq!(app.timeline_scroll, 0);
    }

    #[test]
    fn observe_revision_leaves_scroll_when_idle() {
        let mut app = App::new("s1".to_string());
        app.observe_revision();
        app.transcript_scroll = 5;
        app.observe_revision();
        assert_eq!(app.transcript_scroll, 5);
    }

    #[test]
    fn completed_status_returns_to_chat_mode() {
        let mut app = App::new("s1".to_string());
        app.mode = Mode::Sending;
        app.session.push_user_message("hi".to_string());
        let frame = decode_frame(r#"{"type": "status", "status": "completed"}"#).unwrap();
        assert!(app.handle_client_event(ClientEvent::Frame(frame)));
        assert_eq!(app.mode, Mode::Chat);
    }

    #[test]
    fn persisted_state_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new("trip-7".to_string());
        app.input_history = vec!["去杭州".to_string()];
        app.save(dir.path()).unwrap();

        let restored = App::load(dir.path(), None);
        assert_eq!(restored.session_id, "trip-7");
        assert_eq!(restored.input_history, vec!["去杭州".to_string()]);
    }

    #[test]
    fn load_prefers_explicit_session_over_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new("old".to_string());
        app.save(dir.path()).unwrap();

        let restored = App::load(dir.path(), Some("new".to_string()));
        assert_eq!(restored.session_id, "new");
    }

    #[test]
    fn load_generates_session_when_nothing_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::load(dir.path(), None);
        assert!(!app.session_id.is_empty());
    }

    #[test]
    fn client_events_map_onto_session_events() {
        assert!(matches!(
            to_session_event(ClientEvent::Connected),
            SessionEvent::Connected
        ));
        assert!(matches!(
            to_session_event(ClientEvent::Disconnected),
            SessionEvent::Disconnected
        ));
        assert!(matches!(
            to_session_event(ClientEvent::TransportError("boom".to_string())),
            SessionEvent::TransportError(m) if m == "boom"
        ));
    }
}
