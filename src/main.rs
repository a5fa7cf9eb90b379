use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::time::{sleep, Duration};

use batch_uploader::config;
use batch_uploader::uploader::{ChannelNotifier, HttpUploader, NotificationRequest};
use batch_uploader::{Orchestrator, UploadItem};

#[derive(Debug, Parser)]
#[command(name = "batch-uploader", about = "Upload a batch of media files")]
struct Cli {
    /// Files to upload, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Upload endpoint, overriding the configured one
    #[arg(long)]
    endpoint: Option<String>,

    /// Automatic retry rounds, overriding the configured count
    #[arg(long)]
    max_retries: Option<u32>,

    /// Read configuration from this file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging comes up first so config load warnings are visible
    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    let mut builder = env_logger::Builder::from_default_env();
    if !rust_log_set {
        builder.filter_level(log::LevelFilter::Trace);
    }
    builder.init();
    if !rust_log_set {
        log::set_max_level(log::LevelFilter::Info);
    }

    let mut config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .context("Failed to load configuration")?;

    if !rust_log_set {
        log::set_max_level(config::log_level_filter(&config.log_level));
    }

    if let Some(endpoint) = cli.endpoint {
        config.endpoint = Some(endpoint);
    }
    if let Some(max_retries) = cli.max_retries {
        config.max_retry_attempts = max_retries;
    }
    config::validate_config(&config)?;

    log::info!("Starting batch uploader for {} file(s)", cli.files.len());

    let uploader = HttpUploader::from_config(&config)?;
    let (notifier, mut notifications) = ChannelNotifier::new();
    let orchestrator = Orchestrator::from_config(&config, Arc::new(uploader), Arc::new(notifier));

    let items = cli.files.into_iter().map(UploadItem::from_path).collect();
    let summary = orchestrator.submit(items).await;
    let mut pending = drain(&mut notifications);
    let mut remaining_failures = summary.result.failure_count();

    let mut attempt = 0;
    while attempt < config.max_retry_attempts {
        let retries: Vec<_> = pending.iter().filter_map(|n| n.retry_action.clone()).collect();
        if retries.is_empty() {
            break;
        }
        attempt += 1;
        sleep(Duration::from_millis(config.retry_delay_ms)).await;

        log::info!("Retry round {} of {}", attempt, config.max_retry_attempts);
        remaining_failures -= retries.iter().map(|r| r.retry_set().len()).sum::<usize>();
        for action in retries {
            if let Some(summary) = action.invoke().await {
                remaining_failures += summary.result.failure_count();
            }
        }
        pending = drain(&mut notifications);
    }

    if remaining_failures > 0 {
        anyhow::bail!("{} file(s) failed to upload", remaining_failures);
    }

    log::info!("All files uploaded");
    Ok(())
}

/// Print every queued notification and hand them back for retry handling.
fn drain(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<NotificationRequest>,
) -> Vec<NotificationRequest> {
    let mut received = Vec::new();
    while let Ok(request) = rx.try_recv() {
        eprintln!(
            "error: {}: {}{}",
            request.message,
            request.affected.join(", "),
            if request.has_retry() { " (retry available)" } else { "" }
        );
        received.push(request);
    }
    received
}
