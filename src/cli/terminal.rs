//! Terminal setup shared by the interactive commands.

use super::CliError;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::time::Duration;

pub(crate) type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Enter raw mode and the alternate screen.
pub(crate) fn enter() -> Result<Tui, CliError> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| CliError::new(e.to_string()))
}

/// Restore the terminal.
pub(crate) fn leave(terminal: &mut Tui) -> Result<(), CliError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Wait up to `timeout` for a key press.
pub(crate) fn next_key(timeout: Duration) -> Result<Option<KeyEvent>, CliError> {
    if event::poll(timeout).map_err(|e| CliError::new(e.to_string()))?
        && let Event::Key(key) = event::read().map_err(|e| CliError::new(e.to_string()))?
        && key.kind == KeyEventKind::Press
    {
        return Ok(Some(key));
    }
    Ok(None)
}
