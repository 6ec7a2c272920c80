//! Arcade CLI - play the RPG and Snake in the terminal, or soak-test both
//! engines headlessly.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Arcade - a grid RPG and a toroidal Snake
#[derive(Parser, Debug)]
#[command(name = "arcade")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Random seed (default: config, then random)
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Append log lines to this file
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the RPG in an interactive TUI
    Rpg {
        /// Directory holding saved progress
        #[arg(long, default_value = ".arcade")]
        save_dir: PathBuf,

        /// Append host notifications to this file, one per line
        #[arg(long)]
        events: Option<PathBuf>,
    },

    /// Play Snake in an interactive TUI
    Snake {
        /// Append host notifications to this file, one per line
        #[arg(long)]
        events: Option<PathBuf>,
    },

    /// Run many random-input sessions in parallel and check invariants
    Soak {
        /// Number of seeds to run (default: 1000)
        #[arg(short = 'n', long, default_value = "1000")]
        sessions: u64,

        /// Inputs per session (default: 500)
        #[arg(short = 't', long, default_value = "500")]
        steps: u32,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::SoakFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Print the default configuration as TOML
    Config,
}

fn run(args: Args) -> Result<(), cli::CliError> {
    let target = match args.command {
        Commands::Rpg { .. } | Commands::Snake { .. } => cli::LogTarget::FileOnly,
        Commands::Soak { .. } | Commands::Config => cli::LogTarget::Stderr,
    };
    cli::init_logging(args.log.as_deref(), target)?;

    let config = cli::load_config(args.config.as_deref(), args.seed)?;

    match args.command {
        Commands::Rpg { save_dir, events } => {
            cli::rpg::execute(&config, &save_dir, events.as_deref())
        }

        Commands::Snake { events } => cli::snake::execute(&config, events.as_deref()),

        Commands::Soak {
            sessions,
            steps,
            threads,
            format,
            progress,
        } => cli::soak::execute(
            &config,
            cli::soak::SoakArgs {
                sessions,
                steps,
                threads,
                format,
                progress,
            },
        ),

        Commands::Config => {
            let toml = config
                .to_toml()
                .map_err(|e| cli::CliError::new(format!("TOML serialization failed: {e}")))?;
            print!("{toml}");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
