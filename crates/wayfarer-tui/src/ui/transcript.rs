// ABOUTME: Conversation transcript rendering
// ABOUTME: Finalized messages plus the streaming answer in progress

use chrono::Local;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, Mode};
use wayfarer_core::types::Role;

const INDENT: &str = "       ";

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = vec![];

    for msg in app.session.transcript.messages() {
        let time = msg
            .timestamp
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();

        let mut content_lines: Vec<&str> = msg.content.lines().collect();
        if content_lines.is_empty() {
            content_lines.push("");
        }

        match msg.role {
            Role::User => {
                let bg = Style::default().bg(Color::Rgb(40, 40, 40));
                lines.push(Line::from(vec![
                    Span::styled(format!("{} ", time), bg.dim()),
                    Span::styled("❯ ", bg.bold()),
                    Span::styled(content_lines[0], bg),
                ]));
                for line in content_lines.iter().skip(1) {
                    lines.push(Line::from(Span::styled(format!("{}{}", INDENT, line), bg)));
                }
            }
            Role::Assistant => {
                lines.push(Line::from(vec![
                    Span::styled(format!("{} ", time), Style::default().dim()),
                    Span::styled("⏺ ", Style::default().white()),
                    Span::raw(content_lines[0]),
                ]));
                for line in content_lines.iter().skip(1) {
                    lines.push(Line::from(format!("{}{}", INDENT, line)));
                }
            }
            Role::System => {
                lines.push(Line::from(vec![
                    Span::styled(format!("{} ", time), Style::default().dim()),
                    Span::styled("✗ ", Style::default().red()),
                    Span::styled(content_lines[0], Style::default().red()),
                ]));
                for line in content_lines.iter().skip(1) {
                    lines.push(Line::from(Span::styled(
                        format!("{}{}", INDENT, line),
                        Style::default().red(),
                    )));
                }
            }
        }

        lines.push(Line::from(""));
    }

    // Answer currently streaming in
    let streamed = app
        .session
        .pending_answer
        .as_ref()
        .filter(|answer| !answer.is_empty());
    if let Some(answer) = streamed {
        let now = Local::now().format("%H:%M").to_string();
        let text_lines: Vec<&str> = answer.content.lines().collect();
        if let Some(first) = text_lines.first() {
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", now), Style::default().dim()),
                Span::styled("⏺ ", Style::default().white()),
                Span::raw(*first),
            ]));
        }
        for line in text_lines.iter().skip(1) {
            lines.push(Line::from(format!("{}{}", INDENT, line)));
        }
        if app.mode == Mode::Sending {
            lines.push(Line::from(Span::styled(
                format!("{}{}", INDENT, app.throbber_char()),
                Style::default().dim(),
            )));
        }
    } else if app.mode == Mode::Sending {
        // Nothing streamed yet, show the throbber alone
        let now = Local::now().format("%H:%M").to_string();
        lines.push(Line::from(vec![
            Span::styled(format!("{} ", now), Style::default().dim()),
            Span::styled("⏺ ", Style::default().white()),
            Span::styled(format!("{}", app.throbber_char()), Style::default().dim()),
        ]));
    }

    // Empty state
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Describe a trip to get started...",
            Style::default().dim(),
        )));
    }

    // Auto-scroll to bottom: offset 0 means "show newest", higher values scroll up
    let total_lines = lines.len() as u16;
    let visible_lines = area.height;
    let max_scroll = total_lines.saturating_sub(visible_lines);
    let actual_scroll = max_scroll.saturating_sub(app.transcript_scroll as u16);

    let para = Paragraph::new(lines).scroll((actual_scroll, 0));
    f.render_widget(para, area);
}
