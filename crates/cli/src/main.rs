use std::{path::PathBuf, sync::Arc};

use {
    clap::Parser,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use postdesk_source::{EmbedSource, FsPostCache};

#[derive(Parser)]
#[command(name = "postdesk", about = "Postdesk — link ingestion and report bot")]
struct Cli {
    /// Config file path (overrides discovery).
    #[arg(long, env = "POSTDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Base directory for reports and the post cache (overrides config).
    #[arg(long, env = "POSTDESK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "postdesk starting");

    let mut config = match &cli.config {
        Some(path) => postdesk_config::load_config(path)?,
        None => postdesk_config::discover_and_load(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.report.dir = data_dir.join("reports");
        config.report.cache_dir = data_dir.join("cache/posts");
    }

    let source = Arc::new(EmbedSource::new(reqwest::Client::new()));
    let cache = Arc::new(FsPostCache::new(config.report.cache_dir.clone()));

    let cancel = postdesk_telegram::start_polling(config, source, cache).await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            cancel.cancel();
        },
        _ = cancel.cancelled() => {
            info!("polling loop stopped");
        },
    }

    Ok(())
}
