use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, EditTarget, Mode};

pub const NAVIGATE_HINT: &str =
    "hjkl move  space fold  z hoist  x done  a add  r rename  d del  c next  q quit";
const EDIT_HINT: &str = "Enter save  Esc cancel";
const CONFIRM_HINT: &str = "y delete  n keep";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (mut spans, hint) = match app.mode {
        Mode::Navigate => match &app.status {
            Some(status) => {
                let color = if status.is_error {
                    app.theme.red
                } else {
                    app.theme.text
                };
                (
                    vec![Span::styled(
                        format!(" {}", status.text),
                        Style::default().fg(color).bg(bg),
                    )],
                    None,
                )
            }
            None => (Vec::new(), app.show_key_hints.then_some(NAVIGATE_HINT)),
        },
        Mode::Edit => (edit_spans(app), Some(EDIT_HINT)),
        Mode::Confirm => (confirm_spans(app), Some(CONFIRM_HINT)),
    };

    // Hint right-aligned when it fits
    if let Some(hint) = hint {
        let content_width: usize = spans.iter().map(|s| s.width()).sum();
        let hint_width = Span::raw(hint).width();
        if content_width + hint_width < width {
            let padding = width - content_width - hint_width;
            spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
            spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// Prompt, buffer and a block cursor at the edit position
fn edit_spans(app: &App) -> Vec<Span<'static>> {
    let bg = app.theme.background;
    let Some(edit) = &app.edit else {
        return Vec::new();
    };
    let forest = app.state().forest();
    let prompt = match edit.target {
        EditTarget::AddChild(parent) => {
            let title = forest.record(parent).map_or("?", |t| t.title.as_str());
            format!(" add under {}: ", title)
        }
        EditTarget::Rename(_) => " rename: ".to_string(),
    };
    let split = edit
        .buffer
        .char_indices()
        .nth(edit.cursor)
        .map_or(edit.buffer.len(), |(i, _)| i);
    let (before, after) = edit.buffer.split_at(split);
    vec![
        Span::styled(prompt, Style::default().fg(app.theme.highlight).bg(bg)),
        Span::styled(before.to_string(), Style::default().fg(app.theme.text_bright).bg(bg)),
        Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)), // ▌ cursor
        Span::styled(after.to_string(), Style::default().fg(app.theme.text_bright).bg(bg)),
    ]
}

fn confirm_spans(app: &App) -> Vec<Span<'static>> {
    let Some(pending) = &app.confirm else {
        return Vec::new();
    };
    let below = match pending.below {
        0 => String::new(),
        1 => " and 1 task below it".to_string(),
        n => format!(" and {} tasks below it", n),
    };
    vec![Span::styled(
        format!(" delete #{} {}{}?", pending.id, pending.title, below),
        Style::default()
            .fg(app.theme.red)
            .bg(app.theme.background)
            .add_modifier(Modifier::BOLD),
    )]
}
