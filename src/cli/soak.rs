//! Soak command implementation.

// Rates are display-only
#![allow(clippy::cast_precision_loss)]

use super::output::{format_soak_text, JsonSoakReport};
use super::{CliError, SoakFormat};
use arcade::soak::{run_soak, SoakConfig};
use arcade::GameConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Soak run options from the command line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SoakArgs {
    pub(crate) sessions: u64,
    pub(crate) steps: u32,
    pub(crate) threads: Option<usize>,
    pub(crate) format: SoakFormat,
    pub(crate) progress: bool,
}

/// Execute the soak command.
///
/// # Errors
///
/// Returns an error if any invariant was violated or the report cannot be
/// serialized.
pub(crate) fn execute(config: &GameConfig, args: SoakArgs) -> Result<(), CliError> {
    let seed = config.seed.unwrap_or_else(rand::random);
    if let Some(num_threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let soak = SoakConfig {
        sessions: args.sessions,
        steps: args.steps,
        seed,
        rpg: config.rpg.clone(),
        snake: config.snake,
    };

    let pb = if args.progress {
        let pb = ProgressBar::new(args.sessions);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sessions ({per_sec})")
            .map_err(|e| CliError::new(format!("Bad progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    tracing::info!(seed, sessions = args.sessions, steps = args.steps, "soak started");
    let start = Instant::now();
    let stats = run_soak(&soak, || {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    });
    let duration = start.elapsed();
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    match args.format {
        SoakFormat::Text => {
            println!();
            print!("{}", format_soak_text(&stats, seed, args.steps, duration));
        }
        SoakFormat::Json => {
            let report = JsonSoakReport {
                seed,
                steps: args.steps,
                duration_secs: duration.as_secs_f64(),
                clean: stats.is_clean(),
                stats: &stats,
            };
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    if stats.is_clean() {
        Ok(())
    } else {
        Err(CliError::new(format!(
            "{} invariant violations",
            stats.violation_count
        )))
    }
}
