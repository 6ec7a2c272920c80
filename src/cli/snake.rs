//! Snake command implementation - interactive TUI.

use super::keys;
use super::terminal::{self, Tui};
use super::CliError;
use arcade::{GameConfig, Position, SeededDice, SnakeSession, SnakeSnapshot};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

/// Execute the snake command.
///
/// # Errors
///
/// Returns an error if the terminal is unusable.
pub(crate) fn execute(config: &GameConfig, events: Option<&Path>) -> Result<(), CliError> {
    let (notifier, rx) = super::host_notifier(events)?;
    let session = SnakeSession::new(config.snake, super::session_dice(config.seed), notifier)?;
    tracing::info!(seed = ?config.seed, "snake started");

    let mut terminal = terminal::enter()?;
    let result = run_tui(&mut terminal, session, &rx);
    terminal::leave(&mut terminal)?;
    result
}

fn run_tui(
    terminal: &mut Tui,
    mut session: SnakeSession<SeededDice>,
    events: &Receiver<String>,
) -> Result<(), CliError> {
    let mut last_tick = Instant::now();
    let mut last_event = None;

    loop {
        session.advance(last_tick.elapsed());
        last_tick = Instant::now();
        while let Ok(event) = events.try_recv() {
            last_event = Some(event);
        }

        let snapshot = session.snapshot();
        terminal
            .draw(|f| ui(f, &snapshot, last_event.as_deref()))
            .map_err(|e| CliError::new(e.to_string()))?;

        let Some(key) = terminal::next_key(Duration::from_millis(20))? else {
            continue;
        };
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                session.close();
                break;
            }
            KeyCode::Char(' ') => session.start(),
            KeyCode::Char('s') => session.stop(),
            code => {
                if let Some(dir) = keys::direction(code) {
                    session.set_direction(dir);
                }
            }
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, snapshot: &SnakeSnapshot, last_event: Option<&str>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Board
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], snapshot);
    render_board(f, chunks[1], snapshot);
    render_footer(f, chunks[2], last_event);
}

fn render_header(f: &mut Frame, area: Rect, snapshot: &SnakeSnapshot) {
    let status = if !snapshot.alive {
        "GAME OVER"
    } else if snapshot.running {
        "RUNNING"
    } else {
        "STOPPED"
    };
    let title = format!(
        " Arcade Snake | Score {} | Length {} | {status} ",
        snapshot.score,
        snapshot.body.len()
    );
    let color = if snapshot.alive { Color::Cyan } else { Color::Red };
    let header = Paragraph::new(title)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_board(f: &mut Frame, area: Rect, snapshot: &SnakeSnapshot) {
    let head = snapshot.body.first().copied();
    let body: HashSet<Position> = snapshot.body.iter().copied().collect();
    let side = snapshot.board_side;

    let mut lines = Vec::new();
    for y in 0..side {
        let mut spans = Vec::new();
        for x in 0..side {
            let pos = Position::new(x, y);
            let (ch, color) = if Some(pos) == head {
                ("@", Color::LightGreen)
            } else if body.contains(&pos) {
                ("o", Color::Green)
            } else if pos == snapshot.food {
                ("*", Color::Red)
            } else {
                ("·", Color::DarkGray)
            };
            spans.push(Span::styled(ch, Style::default().fg(color)));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    let board = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Board "));
    f.render_widget(board, area);
}

fn render_footer(f: &mut Frame, area: Rect, last_event: Option<&str>) {
    let mut spans = vec![Span::raw(" [q] Quit  [Space] Start  [s] Stop  [←↑↓→] Steer ")];
    if let Some(event) = last_event {
        spans.push(Span::styled(
            format!(" host <- {event}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let footer = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}
