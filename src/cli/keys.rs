//! Keyboard mapping for the interactive games.

use arcade::rpg::{Mode, RpgCommand};
use arcade::Direction;
use crossterm::event::KeyCode;

/// Arrow keys map to the four movement directions; nothing else does.
pub(crate) const fn direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

/// RPG command for a key in the given mode.
///
/// Movement keys only act on the map; the single-letter actions only act
/// on the screen they belong to.
pub(crate) fn rpg_command(code: KeyCode, mode: Mode) -> Option<RpgCommand> {
    if let Some(dir) = direction(code) {
        return (mode == Mode::World).then_some(RpgCommand::Move(dir));
    }
    let KeyCode::Char(c) = code else {
        return None;
    };
    match (mode, c.to_ascii_lowercase()) {
        (Mode::Combat, 'a') => Some(RpgCommand::Attack),
        (Mode::Combat, 'd') => Some(RpgCommand::Defend),
        (Mode::Combat, 'f') => Some(RpgCommand::Flee),
        (Mode::Shop, 'p') => Some(RpgCommand::BuyPotion),
        (Mode::Shop, 's') => Some(RpgCommand::BuySword),
        (Mode::Shop, 'l') => Some(RpgCommand::LeaveShop),
        (Mode::Inn, 'r') => Some(RpgCommand::Rest),
        (Mode::Inn, 'l') => Some(RpgCommand::LeaveInn),
        _ => None,
    }
}
