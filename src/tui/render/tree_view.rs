use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::cli::output::{checkbox, fold_marker};
use crate::tree::highlight::{Emphasis, StyledNode};
use crate::tree::layout::outline_order;
use crate::tree::progress::round_percent;
use crate::tui::app::App;

/// Cells in a progress bar
pub const BAR_WIDTH: usize = 10;

/// Render the visible nodes as an indented outline, scrolled to keep the
/// focused row on screen
pub fn render_tree_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let snapshot = app.state().snapshot();
    if snapshot.nodes.is_empty() {
        let empty = Paragraph::new(" No tasks").style(Style::default().fg(app.theme.dim).bg(bg));
        frame.render_widget(empty, area);
        return;
    }

    let order = outline_order(&snapshot.nodes, &snapshot.edges);
    let focused = app.focused();
    let cursor = order
        .iter()
        .position(|&i| Some(snapshot.nodes[i].node.id) == focused)
        .unwrap_or(0);

    let visible_height = area.height as usize;
    if cursor < app.scroll_offset {
        app.scroll_offset = cursor;
    } else if cursor >= app.scroll_offset + visible_height {
        app.scroll_offset = cursor.saturating_sub(visible_height.saturating_sub(1));
    }

    let width = area.width as usize;
    let lines: Vec<Line> = order
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(visible_height)
        .map(|(row, &i)| tree_row(app, &snapshot.nodes[i], row == cursor, width))
        .collect();

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn tree_row<'a>(app: &App, styled: &StyledNode, is_focused: bool, width: usize) -> Line<'a> {
    let theme = &app.theme;
    let node = &styled.node;
    let bg = if is_focused { theme.selection_bg } else { theme.background };
    let base = Style::default().bg(bg);

    // Right side: bar, percent, priority
    let pct = round_percent(node.progress);
    let filled = (usize::from(pct) * BAR_WIDTH + 50) / 100;
    let bar_color = if pct == 100 { theme.done } else { theme.highlight };
    let right = vec![
        Span::styled("\u{2588}".repeat(filled), base.fg(bar_color)),
        Span::styled("\u{2591}".repeat(BAR_WIDTH - filled), base.fg(theme.dim)),
        Span::styled(format!(" {:>3}%", pct), base.fg(theme.text)),
        Span::styled(format!("  p{:<3}", node.priority), base.fg(theme.dim)),
    ];
    let right_width: usize = right.iter().map(|s| s.width()).sum();

    // Left side: indent, fold marker, checkbox
    let marker_color = if is_focused { theme.highlight } else { theme.dim };
    let mut spans = vec![
        Span::styled(format!(" {}", "  ".repeat(node.depth)), base),
        Span::styled(fold_marker(node), base.fg(marker_color)),
        Span::styled(" ", base),
        Span::styled(
            checkbox(node.is_completed, node.pending),
            base.fg(theme.checkbox_color(node.is_completed, node.pending)),
        ),
        Span::styled(" ", base),
    ];
    let left_width: usize = spans.iter().map(|s| s.width()).sum();

    // Title takes what is left, keeping one column of gap before the bar
    let room = width.saturating_sub(left_width + right_width + 1);
    let title = truncate(&node.title, room);
    let mut title_style = base.fg(theme.emphasis_color(styled.emphasis));
    if styled.emphasis == Emphasis::Highlighted || is_focused {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }
    if node.is_completed {
        title_style = title_style.add_modifier(Modifier::CROSSED_OUT);
    }
    let title_width = title.width();
    spans.push(Span::styled(title, title_style));

    let used = left_width + title_width;
    if used + right_width <= width {
        spans.push(Span::styled(" ".repeat(width - used - right_width), base));
        spans.extend(right);
    }
    Line::from(spans)
}

/// Cut `text` to at most `max` columns, ending with `…` when shortened
fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('\u{2026}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskNode;
    use crate::tui::render::test_helpers::*;

    fn render(app: &mut App, w: u16, h: u16) -> String {
        render_to_string(w, h, |frame, area| render_tree_view(frame, app, area))
    }

    #[test]
    fn outline_rows_show_progress() {
        let mut tasks = garden();
        tasks[3].is_completed = true;
        let mut app = app_with(tasks);
        app.expand_all();
        let out = render(&mut app, TERM_W, 6);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(" \u{25BE} [ ] Life"));
        assert!(lines[0].contains("\u{2588}\u{2588}\u{2588}\u{2588}\u{2588}\u{2591}"));
        assert!(lines[0].contains(" 50%  p1"));
        assert!(lines[1].starts_with("   \u{25BE} [ ] Garden"));
        assert!(lines[2].starts_with("       [ ] Water"));
        assert!(lines[3].starts_with("     [x] Taxes"));
        assert!(lines[3].contains("100%"));
    }

    #[test]
    fn folded_root_hides_children() {
        let mut app = app_with(garden());
        let out = render(&mut app, TERM_W, 6);
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with(" \u{25B8} [ ] Life"));
    }

    #[test]
    fn pending_toggle_shows_tilde() {
        let mut app = app_with(garden());
        app.expand_all();
        app.session.state_mut().mark_pending_toggle(4);
        let out = render(&mut app, TERM_W, 6);
        assert!(out.contains("[~] Taxes"));
    }

    #[test]
    fn scrolls_to_focus() {
        let mut tasks = vec![TaskNode::new(1, "Root", None)];
        for id in 2..=20 {
            tasks.push(TaskNode::new(id, format!("Child {}", id), Some(1)));
        }
        let mut app = app_with(tasks);
        app.expand_all();
        app.session.state_mut().set_focus(20);
        let out = render(&mut app, TERM_W, 5);
        assert_eq!(app.scroll_offset, 15);
        assert!(out.lines().last().unwrap().contains("Child 20"));
        assert!(!out.contains("Root"));
    }

    #[test]
    fn long_titles_are_truncated() {
        let mut app = app_with(vec![TaskNode::new(1, "x".repeat(100), None)]);
        let out = render(&mut app, 40, 2);
        let line = out.lines().next().unwrap();
        assert!(line.contains('\u{2026}'));
        assert!(line.contains("0%"));
    }

    #[test]
    fn truncate_respects_wide_chars() {
        assert_eq!(truncate("abc", 3), "abc");
        assert_eq!(truncate("abcdef", 4), "abc\u{2026}");
        assert_eq!(truncate("日本語です", 5), "日本\u{2026}");
        assert_eq!(truncate("abc", 0), "");
    }
}
