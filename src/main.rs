use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use vidlib_migrate::{
    logging, write_manifest, Config, MigrateOptions, MigrationReport, Migrator, OnItemError, OsFs,
};

#[derive(Parser)]
#[command(name = "vidlib-migrate")]
#[command(version, author = "TigreRoll")]
#[command(about = "Migrate a legacy video archive into a video library tree")]
struct Cli {
    /// Directory containing the legacy videos
    source_root: PathBuf,

    /// Directory the library tree is written to
    destination_root: PathBuf,

    /// Copy the video files instead of writing placeholders
    #[arg(long)]
    hot: bool,

    /// Compare MD5 digests of copied videos (with --hot)
    #[arg(long, requires = "hot")]
    verify: bool,

    /// Keep going when a single video cannot be migrated
    #[arg(long)]
    skip_errors: bool,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write items.json into the destination after the run
    #[arg(long)]
    manifest: bool,

    /// Write a JSON run report to FILE
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = Config::resolve(cli.config.as_deref())?;
    if cli.verbose {
        info!("{}", config.summary());
    }

    let migrator = Migrator::new(config).context("Invalid configuration")?;

    let mut options = MigrateOptions::from_config(migrator.config())
        .hot(cli.hot)
        .verify(cli.verify);
    if cli.skip_errors {
        options = options.on_item_error(OnItemError::Skip);
    }

    let started_at = Utc::now();
    let start_time = std::time::Instant::now();
    let summary = migrator
        .run(&OsFs, &cli.source_root, &cli.destination_root, &options)
        .await
        .context("Migration failed")?;
    let duration = start_time.elapsed();

    info!("🎉 Migration completed in {:.2}s", duration.as_secs_f64());
    info!("✅ Migrated: {}", summary.migrated);
    info!("📝 With sidecar: {}", summary.with_sidecar);
    if summary.collisions > 0 {
        info!("🔀 Renamed after title collision: {}", summary.collisions);
    }

    if cli.manifest {
        let config = migrator.config();
        write_manifest(&cli.destination_root, &config.manifest, &config.output, None)
            .context("Failed to write manifest")?;
    }

    if let Some(report_path) = &cli.report {
        let report = MigrationReport {
            started_at,
            finished_at: Utc::now(),
            source_root: cli.source_root.clone(),
            destination_root: cli.destination_root.clone(),
            hot: cli.hot,
            total_size: summary.total_size_formatted(),
            summary,
        };
        report
            .save(report_path)
            .await
            .context("Failed to write report")?;
    }

    Ok(())
}
