use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;

/// Session controls only. The simulation itself has no user-facing knobs;
/// these either toggle presentation or end the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit,
    TogglePause,
    ToggleHelp,
    ToggleVectors,
    Reset,
}

/// Drain pending key presses without blocking the frame.
pub(crate) fn collect_actions(max_frame_time: Duration) -> anyhow::Result<Vec<Action>> {
    let mut out = Vec::new();
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);

    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                if let Some(action) = map_key(k.code) {
                    out.push(action);
                    if out.len() >= 32 {
                        break;
                    }
                }
            }
            // Resize is picked up by polling the terminal size each frame.
            _ => {}
        }
    }
    Ok(out)
}

fn map_key(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHelp),
        KeyCode::Char('v') | KeyCode::Char('V') => Some(Action::ToggleVectors),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reset),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_maps_from_both_spellings() {
        assert_eq!(map_key(KeyCode::Char('q')), Some(Action::Quit));
        assert_eq!(map_key(KeyCode::Char('Q')), Some(Action::Quit));
        assert_eq!(map_key(KeyCode::Esc), Some(Action::Quit));
    }

    #[test]
    fn unknown_keys_map_to_nothing() {
        assert_eq!(map_key(KeyCode::Char('x')), None);
        assert_eq!(map_key(KeyCode::Enter), None);
    }
}
