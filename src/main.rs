use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use m3u_curator::{
    config::{Config, defaults::DEFAULT_CONFIG_PATH},
    pipeline::Curator,
};

#[derive(Parser)]
#[command(name = "m3u-curator")]
#[command(version)]
#[command(about = "Collects target channels from public IPTV playlists into one M3U file")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path; built-in lists are used when it does not exist
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Output playlist path (overrides config file)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("m3u_curator={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting M3U Curator v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(output) = cli.output {
        config.output.path = output;
    }

    let summary = Curator::from_config(config)?.run().await?;
    info!("Playlist written to {}", summary.output_path.display());

    Ok(())
}
