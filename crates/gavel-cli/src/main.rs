//! Gavel CLI
//!
//! Command-line entry point for the Gavel Telegram bot

mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gavel_config::Config;
use gavel_core::{Dispatcher, TelegramChatPort};
use gavel_providers::Providers;
use gavel_telegram::TelegramApi;
use tracing::{info, warn};

const DEFAULT_CONFIG_FILE: &str = "gavel.toml";

#[derive(Parser)]
#[command(name = "gavel")]
#[command(about = "Telegram group moderation and utility bot", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Directory for rotated log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve,

    /// Load and validate configuration, then exit
    CheckConfig,

    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            let _logging_guard = logging::init_logging(&cli.log_dir, &cli.log_level)?;
            let config = load_config(cli.config.as_deref())?;
            for key in config.providers.unset_keys() {
                warn!(key, "provider API key not set, dependent commands will fail upstream");
            }

            let api = TelegramApi::new(&config.telegram.bot_token);
            let me = api
                .get_me()
                .await
                .context("bot token was rejected by the platform")?;
            info!(
                bot_id = me.id,
                username = me.username.as_deref().unwrap_or("unknown"),
                "bot authenticated"
            );

            let chat = Arc::new(TelegramChatPort::new(api, me.id));
            let providers = Arc::new(Providers::new(config.providers.clone()));
            let dispatcher = Arc::new(Dispatcher::new(chat, providers));

            gavel_core::server::serve(
                dispatcher,
                config.server.port,
                &config.server.webhook_path,
            )
            .await?;
        }

        Commands::CheckConfig => match load_config(cli.config.as_deref()) {
            Ok(config) => {
                println!("Configuration is valid.");
                let unset = config.providers.unset_keys();
                if !unset.is_empty() {
                    println!("Unset provider keys: {}", unset.join(", "));
                }
            }
            Err(e) => {
                eprintln!("Configuration is invalid: {:#}", e);
                std::process::exit(1);
            }
        },

        Commands::Version => {
            println!("gavel {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                Config::load(default)
            } else {
                Config::from_env()
            }
        }
    }
}
