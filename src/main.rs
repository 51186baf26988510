//! Xenspectra CLI
//!
//! Command-line interface for spectrum generation and dissonance analysis.

use anyhow::Result;
use clap::Parser;

use xenspectra::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    tracing::debug!("Xenspectra v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Xenspectra v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Series {
            kind,
            count,
            slope,
            pseudo_octave_cents,
            divisions,
            stretch,
        } => commands::series(kind, count, slope, pseudo_octave_cents, divisions, stretch),
        Commands::Spectrum { settings, seed } => commands::spectrum(settings.as_deref(), seed),
        Commands::Tuning {
            settings,
            precision,
        } => commands::tuning(settings.as_deref(), precision),
        Commands::Curve {
            settings,
            points,
            fundamental,
            multi_octave,
            tsv,
            minima,
        } => commands::curve(
            settings.as_deref(),
            points,
            fundamental,
            multi_octave,
            tsv,
            minima,
        ),
        Commands::PrintSettings { settings } => commands::print_settings(settings.as_deref()),
    }
}
