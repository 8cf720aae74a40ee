use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tokio::signal;
use tokio::sync::broadcast;

use ara_notification_renderer::asset::{
    create_asset_cache, AssetPipeline, AssetRequestConfig, Deliveries, HttpFetcher, TargetId,
};
use ara_notification_renderer::config::Settings;
use ara_notification_renderer::error;
use ara_notification_renderer::metrics::encode_metrics;
use ara_notification_renderer::notification::{
    parse_notification_list, Notification, NotificationFeed,
};
use ara_notification_renderer::render::{bind, RenderedRow, Renderer, RowOutput};
use ara_notification_renderer::tasks::EvictionTask;
use ara_notification_renderer::telemetry::init_tracing;

/// Render a notification list, loading icons through the on-disk cache
#[derive(Debug, Parser)]
#[command(name = "ara-notification-renderer", version, about)]
struct Cli {
    /// JSON notification list, or "-" to read standard input
    input: PathBuf,

    /// Print Prometheus metrics to stderr when done
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_tracing(&settings.logging)?;
    tracing::info!("Configuration loaded");

    let feed = NotificationFeed::new();
    let generation = feed.set_notification_items(read_notifications(&cli.input).await?);
    tracing::info!(generation, entries = feed.len(), "Notification list loaded");

    // Create icon pipeline
    let cache = create_asset_cache(&settings.cache).await;
    let fetcher = Arc::new(HttpFetcher::new(&settings.pipeline)?);
    let (pipeline, mut deliveries) = AssetPipeline::new(
        cache.clone(),
        fetcher,
        AssetRequestConfig::from_settings(&settings.pipeline),
    );

    // Start cache eviction in background
    let (shutdown_tx, _) = broadcast::channel(1);
    let eviction_task = EvictionTask::new(
        cache.clone(),
        Duration::from_secs(settings.cache.eviction_interval_secs),
        shutdown_tx.subscribe(),
    );
    let eviction_handle = tokio::spawn(async move {
        eviction_task.run().await;
    });

    // Bind every row
    let renderer = Renderer::new(&settings.render);
    let placeholder = pipeline.config().placeholder_image.clone();
    let mut rows: Vec<RenderedRow> = feed
        .snapshot()
        .iter()
        .enumerate()
        .map(|(index, notification)| {
            let mut row = RenderedRow::new(TargetId(index as u64), placeholder.clone());
            bind(&renderer.build(notification), &mut row, &pipeline);
            row
        })
        .collect();

    wait_for_icons(&pipeline, &mut deliveries, &mut rows).await;

    let output: Vec<RowOutput> = rows.iter().map(RenderedRow::to_output).collect();
    println!("{}", serde_json::to_string_pretty(&output)?);

    if cli.metrics {
        eprintln!("{}", encode_metrics()?);
    }

    let _ = shutdown_tx.send(());
    let _ = eviction_handle.await;

    tracing::info!("Render complete");
    Ok(())
}

async fn read_notifications(input: &Path) -> error::Result<Vec<Notification>> {
    let json = if input == Path::new("-") {
        let mut buffer = String::new();
        tokio::io::stdin().read_to_string(&mut buffer).await?;
        buffer
    } else {
        tokio::fs::read_to_string(input).await?
    };
    Ok(parse_notification_list(&json)?)
}

/// Apply icon deliveries until every row has its final icon or Ctrl+C
async fn wait_for_icons(
    pipeline: &AssetPipeline,
    deliveries: &mut Deliveries,
    rows: &mut [RenderedRow],
) {
    while pipeline.in_flight() > 0 {
        tokio::select! {
            delivery = deliveries.recv() => {
                let Some(delivery) = delivery else {
                    break;
                };
                if let Some(row) = rows.get_mut(delivery.target.0 as usize) {
                    delivery.apply(row);
                }
            }
            _ = signal::ctrl_c() => {
                tracing::info!(
                    in_flight = pipeline.in_flight(),
                    "Received Ctrl+C, printing rows as they are"
                );
                break;
            }
        }
    }
}
