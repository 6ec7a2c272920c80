//! Output formatting utilities for CLI.

// Rates are display-only
#![allow(clippy::cast_precision_loss)]

use arcade::soak::SoakStats;
use serde::Serialize;
use std::fmt::Write;
use std::time::Duration;

/// JSON-serializable soak report.
#[derive(Debug, Serialize)]
pub(super) struct JsonSoakReport<'a> {
    /// Seed of the first session.
    pub(super) seed: u64,
    /// Inputs per session.
    pub(super) steps: u32,
    /// Wall-clock duration in seconds.
    pub(super) duration_secs: f64,
    /// Whether every invariant held.
    pub(super) clean: bool,
    /// Aggregated counters and recorded violations.
    pub(super) stats: &'a SoakStats,
}

/// Format a soak report as human-readable text.
pub(super) fn format_soak_text(stats: &SoakStats, seed: u64, steps: u32, duration: Duration) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Soak Results (seeds {seed}.., {steps} steps each)");
    let _ = writeln!(output, "  Sessions: {}", stats.sessions);
    let _ = writeln!(output);
    let _ = writeln!(output, "  RPG");
    let _ = writeln!(output, "    Steps:      {}", stats.rpg_steps);
    let _ = writeln!(output, "    Encounters: {}", stats.encounters);
    let _ = writeln!(output, "    Kills:      {}", stats.kills);
    let _ = writeln!(output, "    Defeats:    {}", stats.defeats);
    let _ = writeln!(output, "    Level-ups:  {}", stats.level_ups);
    let _ = writeln!(output, "    Max level:  {}", stats.max_level);
    let _ = writeln!(output);
    let _ = writeln!(output, "  Snake");
    let _ = writeln!(output, "    Runs:       {}", stats.snake_runs);
    let _ = writeln!(output, "    Frames:     {}", stats.snake_frames);
    let _ = writeln!(output, "    Best score: {}", stats.best_score);
    let _ = writeln!(output);

    if stats.is_clean() {
        let _ = writeln!(output, "  Invariants: all held");
    } else {
        let _ = writeln!(output, "  Invariants: {} violations", stats.violation_count);
        for v in &stats.violations {
            let _ = writeln!(output, "    [{} seed {} step {}] {}", v.game, v.seed, v.step, v.message);
        }
        let hidden = stats.violation_count.saturating_sub(stats.violations.len() as u64);
        if hidden > 0 {
            let _ = writeln!(output, "    ... and {hidden} more");
        }
    }

    let secs = duration.as_secs_f64();
    let per_sec = if secs > 0.0 {
        stats.sessions as f64 / secs
    } else {
        0.0
    };
    let _ = writeln!(output);
    let _ = writeln!(output, "Duration: {secs:.2}s ({per_sec:.0} sessions/sec)");

    output
}
