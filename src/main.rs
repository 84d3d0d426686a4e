//! Firebase Test Lab game-loop runner
//!
//! CI entry point: discovers built APKs, runs each on Firebase Test Lab,
//! and validates the artifacts the runs leave in the results bucket.

use clap::Parser;
use std::path::PathBuf;

use testlab::common::config::FileConfig;
use testlab::common::{logging, Config};
use testlab::tools::GcloudTools;
use testlab::{runner, Result};

#[derive(Parser)]
#[command(name = "testlab", about = "Run Android game-loop tests on Firebase Test Lab")]
#[command(version, long_about = None)]
struct Cli {
    /// The engine variant to run tests for
    #[arg(long)]
    variant: Option<String>,

    /// A unique build identifier for this test, used to sort results in
    /// the GCS bucket (default: $SWARMING_TASK_ID, else "local_test")
    #[arg(long)]
    build_id: Option<String>,

    /// Build output root containing <variant>/firebase_apks/
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// TOML config file overriding bucket/project/device defaults
    /// (default: ci/testlab.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let file = FileConfig::load(cli.config.as_deref())?;
    let config = Config::resolve(cli.variant, cli.build_id, cli.out_dir, file);

    GcloudTools::preflight()?;
    let tools = GcloudTools::new(config.clone());

    runner::run(&config, &tools).await
}
