use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tiny_ircbot::commands::builtin_registry;
use tiny_ircbot::config::DEFAULT_CONFIG_PATH;
use tiny_ircbot::{Bot, Config, Connection};

#[derive(Debug, Parser)]
#[command(version, about = "A tiny IRC bot")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "IRCBOT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// More logging, repeat for trace output (RUST_LOG takes precedence)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    tracing::info!(
        server = %config.server.host,
        port = config.server.port,
        nickname = %config.bot.nickname,
        channels = ?config.bot.channels,
        "configuration loaded"
    );

    let config = Arc::new(config);
    let connection = Connection::connect(
        &config.server.host,
        config.server.port,
        config.limits.outbound_queue,
    )
    .await
    .with_context(|| format!("connecting to {}:{}", config.server.host, config.server.port))?;

    let registry = builtin_registry(&config);
    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    Bot::new(config, connection, registry)
        .run(shutdown)
        .await
        .context("session ended")?;

    tracing::info!("disconnected");
    Ok(())
}
