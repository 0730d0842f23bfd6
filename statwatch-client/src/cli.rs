use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Config, ENDPOINT_ENV};
use crate::monitor;
use crate::util::logging::init_tracing;
use crate::util::shutdown::SHUTDOWN;

#[derive(Parser)]
#[command(name = "statwatch")]
#[command(version, about = "Polls a server statistics endpoint and reports threshold breaches", long_about = None)]
struct Cli {
    /// Path to the config file (defaults to the user config directory)
    #[arg(long = "config", global = true)]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the endpoint until interrupted
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Milliseconds between polls
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Fetch and evaluate statistics once
    Check {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show version information
    Version,
}

#[derive(Args)]
struct TargetArgs {
    /// Statistics endpoint URL
    #[arg(short, long, env = ENDPOINT_ENV)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file if none exists
    Init,
    /// Remove the configuration file
    Clear,
}

pub async fn cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = match cli.config_file {
        Some(path) => path,
        None => Config::config_file_path()?,
    };

    match cli.command {
        Commands::Run {
            target,
            interval_ms,
        } => {
            let config = Config::load_from(&config_path)?.with_overrides(
                target.endpoint,
                interval_ms,
                target.timeout_secs,
            );
            init_tracing(&config.log_level);
            monitor::run(config, &SHUTDOWN).await?
        }
        Commands::Check { target } => {
            let config = Config::load_from(&config_path)?.with_overrides(
                target.endpoint,
                None,
                target.timeout_secs,
            );
            init_tracing(&config.log_level);
            monitor::check(&config).await?
        }
        Commands::Config(cmd) => {
            init_tracing("info");
            match cmd {
                ConfigCommands::Show => {
                    let config = Config::load_from(&config_path)?;
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigCommands::Init => {
                    if config_path.exists() {
                        println!("Config already exists at {}", config_path.display());
                    } else {
                        Config::default().save_to(&config_path)?;
                    }
                }
                ConfigCommands::Clear => Config::clear_at(&config_path)?,
            }
        }
        Commands::Version => {
            println!("statwatch version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
