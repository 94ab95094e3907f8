use crate::game::Direction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A player intent decoded from a key press
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Command {
    /// Steer the snake
    Turn(Direction),
    /// Start, pause, resume, or retry, depending on the game's status
    Action,
    ClearHistory,
    Quit,
}

impl Command {
    pub(crate) fn from_key_event(ev: KeyEvent) -> Option<Command> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if (ev.modifiers, ev.code) == (KeyModifiers::CONTROL, KeyCode::Char('c')) {
            return Some(Command::Quit);
        }
        if !normal_modifiers.contains(ev.modifiers) {
            return None;
        }
        match ev.code {
            KeyCode::Char('w' | 'W' | 'k') | KeyCode::Up => Some(Command::Turn(Direction::Up)),
            KeyCode::Char('s' | 'S' | 'j') | KeyCode::Down => Some(Command::Turn(Direction::Down)),
            KeyCode::Char('a' | 'A' | 'h') | KeyCode::Left => Some(Command::Turn(Direction::Left)),
            KeyCode::Char('d' | 'D' | 'l') | KeyCode::Right => {
                Some(Command::Turn(Direction::Right))
            }
            KeyCode::Char(' ') | KeyCode::Enter => Some(Command::Action),
            KeyCode::Char('c') => Some(Command::ClearHistory),
            KeyCode::Char('q') => Some(Command::Quit),
            _ => None,
        }
    }
}
