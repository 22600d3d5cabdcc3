use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tree::Direction;
use crate::tui::app::App;

/// Outline keys map onto tree moves: up/down walk siblings, left goes to the
/// parent and right into the first child.
pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    app.status = None;

    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) => app.should_quit = true,
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => app.should_quit = true,

        // Focus
        (_, KeyCode::Up | KeyCode::Char('k')) => app.move_focus(Direction::Left),
        (_, KeyCode::Down | KeyCode::Char('j')) => app.move_focus(Direction::Right),
        (_, KeyCode::Left | KeyCode::Char('h')) => app.move_focus(Direction::Up),
        (_, KeyCode::Right | KeyCode::Char('l')) => app.move_focus(Direction::Down),

        // Folding and hoisting
        (_, KeyCode::Char(' ') | KeyCode::Enter) => app.toggle_fold(),
        (_, KeyCode::Char('z')) => app.toggle_hoist(),
        (_, KeyCode::Char('e')) => app.expand_all(),
        (_, KeyCode::Char('E')) => app.collapse_all(),

        // Edits
        (_, KeyCode::Char('x')) => app.toggle_complete(),
        (_, KeyCode::Char('a')) => app.begin_add(),
        (_, KeyCode::Char('r')) => app.begin_rename(),
        (_, KeyCode::Char('+') | KeyCode::Char('=')) => app.adjust_priority(1),
        (_, KeyCode::Char('-')) => app.adjust_priority(-1),
        (_, KeyCode::Char('d') | KeyCode::Delete) => app.begin_delete(),

        (_, KeyCode::Char('c')) => app.choose(),
        (_, KeyCode::Char('R')) => app.refresh(),
        _ => {}
    }
}
