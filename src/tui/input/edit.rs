use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::App;

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => return app.submit_edit(),
        KeyCode::Esc => return app.cancel_edit(),
        _ => {}
    }

    let Some(edit) = app.edit.as_mut() else {
        app.cancel_edit();
        return;
    };
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('a')) | (_, KeyCode::Home) => edit.home(),
        (KeyModifiers::CONTROL, KeyCode::Char('e')) | (_, KeyCode::End) => edit.end(),
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            edit.buffer.clear();
            edit.home();
        }
        (_, KeyCode::Left) => edit.left(),
        (_, KeyCode::Right) => edit.right(),
        (_, KeyCode::Backspace) => edit.backspace(),
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => edit.insert(c),
        _ => {}
    }
}
