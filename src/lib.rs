pub mod analysis;
pub mod cli;
pub mod commands;
pub mod error;
pub mod models;

use clap::Parser;
use cli::{Cli, Commands};
use commands::{
    analyzer::analyze_all,
    extract::extract_all,
    settings::{load_settings_from_disk, Settings},
    snapshot::download_all,
};
use error::Result;

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run_cli(&cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run_cli(cli: &Cli) -> Result<()> {
    let settings = load_settings_from_disk(&cli.config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_stage(cli.command, &settings))
}

/// Run one stage, or all three in order.
pub async fn run_stage(command: Commands, settings: &Settings) -> Result<()> {
    if matches!(command, Commands::Download | Commands::Pipeline) {
        let summary = download_all(settings).await?;
        log::info!(
            "Download finished: {} snapshots, {} repositories failed",
            summary.snapshots.len(),
            summary.failed_repositories.len()
        );
    }

    if matches!(command, Commands::Analyze | Commands::Pipeline) {
        let summary = analyze_all(settings).await?;
        log::info!(
            "Analysis finished: {} snapshots analyzed, {} skipped",
            summary.analyzed.len(),
            summary.skipped
        );
    }

    if matches!(command, Commands::Extract | Commands::Pipeline) {
        let settings = settings.clone();
        let summary = tokio::task::spawn_blocking(move || extract_all(&settings)).await??;
        log::info!(
            "Extraction finished: {} reports, {} snapshots skipped, {} series files",
            summary.reports.len(),
            summary.failed_snapshots,
            summary.series.len()
        );
    }

    Ok(())
}
