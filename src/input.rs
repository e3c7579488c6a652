use crate::term::Layout;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Quit,
    TogglePause,
    NextWord,
    ToggleDrawMode,
    ToggleStatus,
    PointerMove(f32, f32),
    PointerLeave,
    Resize(u16, u16),
}

/// Drains pending terminal events without blocking.
pub(crate) fn collect_events() -> anyhow::Result<Vec<Event>> {
    let mut out = Vec::new();
    while event::poll(Duration::ZERO)? {
        out.push(event::read()?);
        if out.len() >= 64 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn map_event(ev: &Event, layout: &Layout) -> Option<Action> {
    match ev {
        Event::Key(k) => map_key(k),
        Event::Mouse(m) => match m.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(
                layout
                    .cell_to_canvas(m.column, m.row)
                    .map_or(Action::PointerLeave, |(x, y)| Action::PointerMove(x, y)),
            ),
            _ => None,
        },
        Event::FocusLost => Some(Action::PointerLeave),
        Event::Resize(c, r) => Some(Action::Resize(*c, *r)),
        _ => None,
    }
}

fn map_key(k: &KeyEvent) -> Option<Action> {
    if k.kind != KeyEventKind::Press {
        return None;
    }
    if k.code == KeyCode::Char('c') && k.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match k.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Action::NextWord),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::ToggleDrawMode),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleStatus),
        _ => None,
    }
}
