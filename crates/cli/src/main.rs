use boltdesk_bolt::BoltService;
use boltdesk_config::{BoltConfig, BoltConfigBuilder, ConfigLoader, ConfigSource};
use clap::Parser;
use eyre::WrapErr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

mod commands;
mod execute;
mod output;

use commands::Commands;

#[derive(Parser)]
#[command(name = "boltdesk")]
#[command(about = "Run bolt against your fleet and get typed JSON back")]
#[command(long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Bolt project directory
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Bolt executable to run
    #[arg(long, global = true, value_name = "PATH")]
    bolt: Option<String>,

    /// Deadline for each bolt invocation, in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    timeout: Option<u64>,

    /// Log filter, e.g. `debug` or `boltdesk_bolt=trace` (defaults to RUST_LOG, then info)
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    /// Echo bolt's output to stderr while it runs
    #[arg(long, global = true)]
    stream: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Defaults, then the config file, then the environment, then flags
    fn load_config(&self) -> eyre::Result<BoltConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.file(path);
        }
        let loaded = loader.load().wrap_err("failed to load configuration")?;

        let mut builder = BoltConfigBuilder::from_config(loaded);
        let mut overridden = false;
        if let Some(project) = &self.project {
            builder = builder.project_path(project);
            overridden = true;
        }
        if let Some(binary) = &self.bolt {
            builder = builder.binary(binary);
            overridden = true;
        }
        if let Some(timeout) = self.timeout {
            builder = builder.execution_timeout(Duration::from_millis(timeout));
            overridden = true;
        }
        if overridden {
            builder = builder.source(ConfigSource::CommandLine);
        }

        builder.build().wrap_err("invalid command line configuration")
    }
}

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    color_eyre::install()?;

    // Parse command-line arguments
    let cli = Cli::parse();

    boltdesk_utils::init(cli.log_level.as_deref())
        .map_err(|e| eyre::eyre!("failed to initialise logging: {e}"))?;

    let config = cli.load_config()?;
    let service = BoltService::new(config);

    cli.command.execute(&service, cli.stream).await
}
