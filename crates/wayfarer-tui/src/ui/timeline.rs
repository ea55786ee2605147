// ABOUTME: Reasoning timeline rendering
// ABOUTME: One block per stage with activity dot, title, and content preview

use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;
use wayfarer_core::types::{Stage, StageKind, ToolStatus};

const INDENT: &str = "      ";
const MAX_RESULT_LINES: usize = 3;

fn stage_dot(stage: &Stage, app: &App) -> (String, Style) {
    if stage.is_active {
        return (app.throbber_char().to_string(), Style::default().green());
    }
    let style = match stage
        .tool_ref
        .as_deref()
        .and_then(|id| app.session.ledger.get(id))
        .map(|call| call.status)
    {
        Some(ToolStatus::Success) => Style::default().green(),
        Some(ToolStatus::Error) | Some(ToolStatus::NotFound) => Style::default().red(),
        Some(ToolStatus::Calling) | None => Style::default().dim(),
    };
    ("⏺".to_string(), style)
}

fn render_stage<'a>(stage: &'a Stage, app: &App, lines: &mut Vec<Line<'a>>) {
    let time = stage
        .timestamp
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();
    let (dot, dot_style) = stage_dot(stage, app);

    lines.push(Line::from(vec![
        Span::styled(format!("{} ", time), Style::default().dim()),
        Span::styled(format!("{} ", dot), dot_style),
        Span::styled(stage.title.clone(), Style::default().bold()),
    ]));

    // Tool invocation output is truncated, narration is shown in full
    let cap = match stage.kind {
        StageKind::ToolInvocation => MAX_RESULT_LINES,
        StageKind::Reasoning => usize::MAX,
    };

    let content_lines: Vec<&str> = stage.content.lines().collect();
    let show_count = content_lines.len().min(cap);
    let remaining = content_lines.len().saturating_sub(cap);

    for line in content_lines.iter().take(show_count) {
        lines.push(Line::from(vec![
            Span::styled(format!("{} ⎿  ", INDENT), Style::default().dim()),
            Span::styled(*line, Style::default().dim()),
        ]));
    }
    if remaining > 0 {
        lines.push(Line::from(Span::styled(
            format!("{} … +{} lines", INDENT, remaining),
            Style::default().dim(),
        )));
    }

    // Live progress text for a tool still running
    if let Some(call) = stage
        .tool_ref
        .as_deref()
        .and_then(|id| app.session.ledger.get(id))
    {
        if !call.status.is_terminal() {
            if let Some(detail) = &call.detail {
                lines.push(Line::from(Span::styled(
                    format!("{} {}", INDENT, detail),
                    Style::default().dim().italic(),
                )));
            }
        }
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().dim());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = vec![];
    for stage in app.session.timeline.stages() {
        render_stage(stage, app, &mut lines);
        lines.push(Line::from(""));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Agent reasoning appears here",
            Style::default().dim(),
        )));
    }

    let total_lines = lines.len() as u16;
    let visible_lines = inner.height;
    let max_scroll = total_lines.saturating_sub(visible_lines);
    let actual_scroll = max_scroll.saturating_sub(app.timeline_scroll as u16);

    let para = Paragraph::new(lines).scroll((actual_scroll, 0));
    f.render_widget(para, inner);
}
