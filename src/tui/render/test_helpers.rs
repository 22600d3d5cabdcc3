use std::sync::Arc;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::store::MemoryStore;
use crate::model::{TaskNode, UiConfig};
use crate::tree::Session;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// An App named "Life" over an in-memory store, already loaded.
pub fn app_with(tasks: Vec<TaskNode>) -> App {
    let store = MemoryStore::with_tasks(tasks);
    let mut app = App::new("Life", Session::new(Arc::new(store)), &UiConfig::default());
    app.load();
    app
}

/// Life -> {Garden -> {Water}, Taxes}
pub fn garden() -> Vec<TaskNode> {
    vec![
        TaskNode::new(1, "Life", None),
        TaskNode::new(2, "Garden", Some(1)),
        TaskNode::new(3, "Water", Some(2)),
        TaskNode::new(4, "Taxes", Some(1)),
    ]
}
