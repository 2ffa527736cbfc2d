use anyhow::{Context, Result};
use clap::Parser;
use command_once::config::DEFAULT_CONFIG_FILE;
use command_once::executor::builtin::builtin_registry;
use command_once::{ConsoleSink, OnceConfig, run_configured};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "command-once")]
#[command(about = "Execute commands only once.")]
struct Cli {
    /// Force the operation to run: forget every recorded version first.
    #[arg(long)]
    force: bool,

    /// Configuration file with the `execs` map
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Ledger directory, overrides `ledger.data_dir` from the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("command_once=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = OnceConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration '{}'", cli.config.display()))?;
    if let Some(data_dir) = cli.data_dir {
        config.ledger = config.ledger.data_dir(data_dir);
    }

    // Failed operations are reported but never change the exit code.
    let summary = run_configured(&config, builtin_registry(), cli.force, ConsoleSink::new())
        .with_context(|| format!("Ledger at '{}' is unusable", config.ledger.data_dir.display()))?;

    tracing::info!(
        executed = summary.executed(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "command-once finished"
    );
    Ok(())
}
