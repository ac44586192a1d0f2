//! Download worker binary.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ytdl_media::{CobaltConfig, CobaltStrategy, MediaFetcher, YtDlpStrategy};
use ytdl_queue::{JobStore, QueueConfig, WorkQueue};
use ytdl_storage::{Storage, StorageConfig};
use ytdl_worker::{JobExecutor, ProcessingContext, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting ytdl-worker");

    let worker_config = WorkerConfig::from_env();
    let queue_config = QueueConfig::from_env();
    info!("Worker config: {:?}", worker_config);

    let store = match JobStore::new(&queue_config.redis_url) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create job store: {}", e);
            std::process::exit(1);
        }
    };
    let queue = match WorkQueue::new(queue_config) {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create work queue: {}", e);
            std::process::exit(1);
        }
    };

    let storage_config = match StorageConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid storage configuration: {}", e);
            std::process::exit(1);
        }
    };
    let storage = match Storage::from_config(&storage_config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create storage backend: {}", e);
            std::process::exit(1);
        }
    };

    let fetcher = MediaFetcher::new(
        Box::new(YtDlpStrategy::new()),
        Box::new(CobaltStrategy::new(CobaltConfig::from_env())),
    );

    let ctx = ProcessingContext {
        store,
        storage,
        fetcher,
        config: worker_config,
        url_expiry_minutes: storage_config.url_expiry_minutes,
    };

    let executor = JobExecutor::new(ctx, queue);
    let shutdown = executor.shutdown_handle();

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown.send(true).ok();
    });

    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::from_default_env().add_directive("ytdl=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}
