// ABOUTME: Bottom status bar rendering
// ABOUTME: Shows session, connectivity phase, errors, keybinds

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;
use wayfarer_core::types::ConnectivityPhase;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut spans: Vec<Span> = vec![];

    spans.push(Span::styled(
        format!(" {} ", short_session(&app.session_id)),
        Style::default().bold(),
    ));

    match app.session.connectivity.as_ref().map(|c| &c.phase) {
        Some(ConnectivityPhase::Connected) => {
            spans.push(Span::styled("●", Style::default().green()));
        }
        Some(ConnectivityPhase::Disconnected) | None => {
            spans.push(Span::styled("○", Style::default().red()));
        }
        Some(ConnectivityPhase::Error) => {
            spans.push(Span::styled("✗", Style::default().red()));
        }
        Some(ConnectivityPhase::Agent(phase)) => {
            spans.push(Span::styled("●", Style::default().green()));
            spans.push(Span::styled(
                format!(" {}", phase),
                Style::default().yellow(),
            ));
        }
    }
    spans.push(Span::raw(" "));

    if let Some(details) = app
        .session
        .connectivity
        .as_ref()
        .and_then(|c| c.details.as_deref())
    {
        spans.push(Span::styled(
            format!("│ {} ", details),
            Style::default().dim(),
        ));
    }

    // Error or Ctrl+C hint
    if let Some(err) = &app.error {
        spans.push(Span::styled(format!("│ ✗ {} ", err), Style::default().red()));
    } else if app.show_ctrl_c_hint() {
        spans.push(Span::styled(
            "│ Press Ctrl+C again to quit ",
            Style::default().yellow(),
        ));
    }

    spans.push(Span::styled(
        "│ Ctrl+R: reconnect │ Ctrl+Q: quit ",
        Style::default().dim(),
    ));

    let line = Line::from(spans);
    let para = Paragraph::new(line).style(Style::default().on_dark_gray());
    f.render_widget(para, area);
}

fn short_session(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
