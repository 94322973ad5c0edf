//! CLI frontend for the CYOA rules engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use commands::play::PlayOptions;

#[derive(Parser)]
#[command(
    name = "cyoa",
    about = "Play and check choose-your-own-adventure story documents",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine decisions (overrides CYOA_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a story document for authoring mistakes
    Check {
        /// Story JSON file
        story: PathBuf,
    },

    /// Play a story, interactively or from a list of choices
    Play {
        /// Story JSON file
        story: PathBuf,

        /// Seed for replayable dice rolls
        #[arg(short, long)]
        seed: Option<String>,

        /// Starting stat override, as name=value (repeatable)
        #[arg(long = "stat", value_name = "NAME=VALUE")]
        stats: Vec<String>,

        /// Comma-separated choice indices to take without prompting
        #[arg(short, long, value_delimiter = ',')]
        choices: Option<Vec<usize>>,

        /// Write the final state to this file
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,

        /// Resume from a saved state instead of starting over
        #[arg(long, value_name = "FILE")]
        load: Option<PathBuf>,

        /// Engine configuration file (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Player id for a new game (default: random)
        #[arg(long)]
        player: Option<String>,

        /// Save slot for a new game (default: random)
        #[arg(long)]
        slot: Option<String>,
    },

    /// Roll a dice formula such as 2d6+3
    Roll {
        /// Dice formula
        formula: String,

        /// Difficulty to meet or beat
        #[arg(long)]
        dc: Option<i64>,

        /// Seed for a replayable roll
        #[arg(short, long)]
        seed: Option<String>,
    },

    /// Show the stats, wallets, inventory, and progress of a save
    Status {
        /// Story JSON file
        story: PathBuf,

        /// Saved state JSON file
        save: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("CYOA_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Check { story } => commands::check::run(&story),
        Commands::Play {
            story,
            seed,
            stats,
            choices,
            save,
            load,
            config,
            player,
            slot,
        } => commands::play::run(
            &story,
            &PlayOptions {
                seed,
                stats,
                choices,
                save,
                load,
                config,
                player,
                slot,
            },
        ),
        Commands::Roll { formula, dc, seed } => commands::roll::run(&formula, dc, seed.as_deref()),
        Commands::Status { story, save } => commands::status::run(&story, &save),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
