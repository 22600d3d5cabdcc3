use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;

/// Project name, hoist breadcrumb, and a separator line below
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let bg = app.theme.background;
    let width = area.width as usize;
    let mut spans = vec![
        Span::styled(" \u{25C6} ", Style::default().fg(app.theme.highlight).bg(bg)),
        Span::styled(
            app.project_name.clone(),
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
    ];

    let breadcrumb = hoist_breadcrumb(app);
    if !breadcrumb.is_empty() {
        spans.push(Span::styled(
            format!("  \u{203A} {}", breadcrumb.join(" \u{203A} ")),
            Style::default().fg(app.theme.highlight).bg(bg),
        ));
    }

    if app.busy() {
        let marker = "syncing ";
        let used: usize = spans.iter().map(|s| s.width()).sum();
        if used + marker.len() < width {
            spans.push(Span::styled(
                " ".repeat(width - used - marker.len()),
                Style::default().bg(bg),
            ));
            spans.push(Span::styled(marker, Style::default().fg(app.theme.dim).bg(bg)));
        }
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
        chunks[0],
    );

    let separator = Span::styled(
        "\u{2500}".repeat(width),
        Style::default().fg(app.theme.dim).bg(bg),
    );
    frame.render_widget(Paragraph::new(Line::from(separator)), chunks[1]);
}

/// Titles from the root down to the hoisted node; empty when nothing is hoisted
fn hoist_breadcrumb(app: &App) -> Vec<String> {
    let state = app.state();
    let Some(hoisted) = state.hoisted() else {
        return Vec::new();
    };
    state
        .ancestors(hoisted)
        .into_iter()
        .filter_map(|id| state.forest().record(id))
        .map(|t| t.title.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn header_shows_breadcrumb_when_hoisted() {
        let mut app = app_with(garden());
        app.session.state_mut().set_focus(3);
        app.toggle_hoist();
        let out = render_to_string(TERM_W, 2, |frame, area| render_header(frame, &app, area));
        assert!(out.contains("Life  \u{203A} Life \u{203A} Garden \u{203A} Water"));
    }

    #[test]
    fn header_without_hoist_is_just_the_name() {
        let app = app_with(garden());
        let out = render_to_string(TERM_W, 2, |frame, area| render_header(frame, &app, area));
        assert_eq!(out.lines().next(), Some(" \u{25C6} Life"));
    }
}
