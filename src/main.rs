use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use flashpool::config::AppConfig;
use flashpool::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display persisted per-asset pool state
    Status,
    /// Quote the current fee for borrowing an amount of an asset
    Quote { asset: String, amount: u128 },
    /// Dry-run the accounting engine against an in-process token
    Simulate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => run_command(cmd, cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

async fn run_command(cmd: Commands, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    match cmd {
        Commands::Status => flashpool::cli::status::run(&config).await,
        Commands::Quote { asset, amount } => {
            flashpool::cli::quote::run(&config, &asset, amount).await
        }
        Commands::Simulate => flashpool::cli::simulate::run(&config).await,
        Commands::Setup => unreachable!("Setup command is handled separately"),
    }
}

/// An explicit --config-path must exist; the default location falls back to
/// built-in defaults when no file was set up yet.
fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => {
            if AppConfig::default_config_path()?.exists() {
                AppConfig::load()
            } else {
                Ok(AppConfig::default())
            }
        }
    }
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
fee_fraction_bps: 30
settlement_policy: balance-delta
callback_deadline_secs: 30

oracle:
  base_url: "http://127.0.0.1:8645"

assets:
  - id: "DEMO"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
