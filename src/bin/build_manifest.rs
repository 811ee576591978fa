use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use vidlib_migrate::{logging, write_manifest, Config};

#[derive(Parser)]
#[command(name = "build-manifest")]
#[command(about = "Regenerate items.json for a migrated video library")]
struct Cli {
    /// Root of a migrated library tree
    destination_root: PathBuf,

    /// Output file (default: <DESTINATION_ROOT>/items.json)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// URL path prefix for video sources
    #[arg(long, value_name = "PREFIX")]
    src_prefix: Option<String>,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(prefix) = cli.src_prefix {
        config.manifest.src_prefix = prefix;
    }

    write_manifest(
        &cli.destination_root,
        &config.manifest,
        &config.output,
        cli.output.as_deref(),
    )
    .with_context(|| {
        format!(
            "Failed to build manifest for {}",
            cli.destination_root.display()
        )
    })?;

    Ok(())
}
