//! RPG command implementation - interactive TUI.

use super::keys;
use super::terminal::{self, Tui};
use super::CliError;
use arcade::rpg::{Mode, RpgCommand, RpgSession, RpgSnapshot, Tile};
use arcade::{DirStore, GameConfig, GameError, Position, SeededDice};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

/// Execute the rpg command.
///
/// # Errors
///
/// Returns an error if the save directory or the terminal is unusable.
pub(crate) fn execute(
    config: &GameConfig,
    save_dir: &Path,
    events: Option<&Path>,
) -> Result<(), CliError> {
    let store = DirStore::open(save_dir)?;
    let (notifier, rx) = super::host_notifier(events)?;
    let dice = super::session_dice(config.seed);
    let session = RpgSession::new(config.rpg.clone(), dice, store, notifier)?;
    tracing::info!(seed = ?config.seed, save_dir = %save_dir.display(), "rpg started");

    let mut terminal = terminal::enter()?;
    let result = run_tui(&mut terminal, App::new(session, rx));
    terminal::leave(&mut terminal)?;
    result
}

/// App state for the TUI.
struct App {
    session: RpgSession<SeededDice>,
    events: Receiver<String>,
    last_event: Option<String>,
    /// Last engine fault, shown until the next one.
    fault: Option<String>,
    /// Travel target being chosen, if the cursor is up.
    cursor: Option<Position>,
    last_tick: Instant,
}

impl App {
    fn new(session: RpgSession<SeededDice>, events: Receiver<String>) -> Self {
        Self {
            session,
            events,
            last_event: None,
            fault: None,
            cursor: None,
            last_tick: Instant::now(),
        }
    }

    fn tick(&mut self) {
        let elapsed = self.last_tick.elapsed();
        self.last_tick = Instant::now();
        if let Err(e) = self.session.advance(elapsed) {
            self.record_fault(&e);
        }
        if self.session.mode() != Mode::World {
            self.cursor = None;
        }
        while let Ok(event) = self.events.try_recv() {
            self.last_event = Some(event);
        }
    }

    /// Run a command; an engine fault is logged and the game goes on.
    fn dispatch(&mut self, command: RpgCommand) {
        if let Err(e) = self.session.dispatch(command) {
            self.record_fault(&e);
        }
    }

    fn record_fault(&mut self, e: &GameError) {
        tracing::error!(error = %e, "engine fault");
        self.fault = Some(e.to_string());
    }

    fn toggle_cursor(&mut self) {
        self.cursor = match self.cursor {
            Some(_) => None,
            None if self.session.mode() == Mode::World => Some(self.session.position()),
            None => None,
        };
    }

    /// Handle a key while the travel cursor is up.
    fn cursor_key(&mut self, code: KeyCode, cursor: Position) {
        let side = self.session.world().side();
        if let Some(dir) = keys::direction(code) {
            self.cursor = Some(dir.step(cursor).clamped(side));
        } else if code == KeyCode::Enter {
            self.cursor = None;
            self.dispatch(RpgCommand::Travel(cursor));
        } else if matches!(code, KeyCode::Esc | KeyCode::Char('t')) {
            self.cursor = None;
        }
    }
}

fn run_tui(terminal: &mut Tui, mut app: App) -> Result<(), CliError> {
    loop {
        app.tick();
        let snapshot = app.session.snapshot();
        terminal
            .draw(|f| ui(f, &snapshot, &app))
            .map_err(|e| CliError::new(e.to_string()))?;

        let Some(key) = terminal::next_key(Duration::from_millis(50))? else {
            continue;
        };
        if let Some(cursor) = app.cursor {
            app.cursor_key(key.code, cursor);
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                app.session.close();
                break;
            }
            KeyCode::Char('t') => app.toggle_cursor(),
            code => {
                if let Some(command) = keys::rpg_command(code, app.session.mode()) {
                    app.dispatch(command);
                }
            }
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, snapshot: &RpgSnapshot, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(14),   // Map and stats
            Constraint::Length(5), // Message
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], snapshot);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_map(f, main_chunks[0], snapshot, app.cursor);
    render_stats(f, main_chunks[1], snapshot);

    render_message(f, chunks[2], snapshot, app);
    render_footer(f, chunks[3], snapshot.mode, app.cursor.is_some());
}

fn render_header(f: &mut Frame, area: Rect, snapshot: &RpgSnapshot) {
    let mode = match snapshot.mode {
        Mode::World => "WORLD",
        Mode::Combat => "COMBAT",
        Mode::Shop => "SHOP",
        Mode::Inn => "INN",
    };
    let title = format!(
        " Arcade RPG | {mode} | Position {} | {:.1}s ",
        snapshot.position,
        Duration::from_millis(u64::try_from(snapshot.clock_ms).unwrap_or(u64::MAX)).as_secs_f64()
    );
    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_map(f: &mut Frame, area: Rect, snapshot: &RpgSnapshot, cursor: Option<Position>) {
    let mut lines = Vec::with_capacity(snapshot.grid.len());
    for (y, row) in (0..).zip(&snapshot.grid) {
        let mut spans = Vec::with_capacity(row.len() * 2);
        for (x, &tile) in (0..).zip(row) {
            let pos = Position::new(x, y);
            let (ch, color) = if pos == snapshot.position {
                ("@", Color::Yellow)
            } else if Some(pos) == cursor {
                ("X", Color::White)
            } else if Some(pos) == snapshot.destination {
                ("*", Color::White)
            } else {
                tile_glyph(tile)
            };
            spans.push(Span::styled(ch, Style::default().fg(color)));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    let map = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Map "));
    f.render_widget(map, area);
}

const fn tile_glyph(tile: Tile) -> (&'static str, Color) {
    match tile {
        Tile::Grass => (".", Color::Green),
        Tile::Enemy => ("G", Color::Red),
        Tile::Shop => ("$", Color::Cyan),
        Tile::Inn => ("I", Color::Magenta),
    }
}

fn render_stats(f: &mut Frame, area: Rect, snapshot: &RpgSnapshot) {
    let p = &snapshot.player;
    let mut lines = vec![
        Line::from(Span::styled(
            p.name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("  HP: {}/{}", p.hp, p.max_hp)),
        Line::from(format!("  Attack: {}", p.attack)),
        Line::from(format!("  Gold: {}", p.gold)),
        Line::from(format!("  Level: {}", p.level)),
        Line::from(format!("  XP: {}/{}", p.xp, snapshot.xp_to_next_level)),
        Line::from(""),
    ];

    if let Some(enemy) = &snapshot.enemy {
        lines.push(Line::from(Span::styled(
            enemy.name.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(format!("  HP: {}/{}", enemy.hp, enemy.max_hp)));
        lines.push(Line::from(format!("  Attack: {}", enemy.attack)));
    }

    let stats = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Character "))
        .wrap(Wrap { trim: false });
    f.render_widget(stats, area);
}

fn render_message(f: &mut Frame, area: Rect, snapshot: &RpgSnapshot, app: &App) {
    let mut lines = vec![Line::from(snapshot.message.clone())];
    if let Some(fault) = &app.fault {
        lines.push(Line::from(Span::styled(
            format!("error: {fault}"),
            Style::default().fg(Color::Red),
        )));
    }
    if let Some(event) = &app.last_event {
        lines.push(Line::from(Span::styled(
            format!("host <- {event}"),
            Style::default().fg(Color::DarkGray),
        )));
    }
    let message = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(message, area);
}

fn render_footer(f: &mut Frame, area: Rect, mode: Mode, choosing: bool) {
    let controls = if choosing {
        " [←↑↓→] Cursor  [Enter] Travel  [t/Esc] Cancel "
    } else {
        match mode {
            Mode::World => " [q] Quit  [←↑↓→] Move  [t] Travel ",
            Mode::Combat => " [q] Quit  [a] Attack  [d] Defend  [f] Flee ",
            Mode::Shop => " [q] Quit  [p] Potion (10g)  [s] Sword (50g)  [l] Leave ",
            Mode::Inn => " [q] Quit  [r] Rest (20g)  [l] Leave ",
        }
    };
    let footer = Paragraph::new(controls)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}
