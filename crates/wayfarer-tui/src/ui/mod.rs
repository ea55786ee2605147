// ABOUTME: UI rendering module for the wayfarer TUI
// ABOUTME: Dispatches rendering to widget modules

mod input;
mod status;
mod timeline;
mod transcript;

use ratatui::prelude::*;
use ratatui::Frame;

use crate::app::App;

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Min(1),    // Conversation area
        Constraint::Length(4), // Input area
        Constraint::Length(1), // Status bar
    ])
    .split(f.area());

    let panes = Layout::horizontal([
        Constraint::Percentage(60), // Transcript
        Constraint::Percentage(40), // Reasoning timeline
    ])
    .split(chunks[0]);

    transcript::render(f, panes[0], app);
    timeline::render(f, panes[1], app);
    input::render(f, chunks[1], app);
    status::render(f, chunks[2], app);
}
