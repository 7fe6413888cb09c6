use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use snailtrack::{
    config::{SensorConfig, ServerConfig, SourceConfig, TrackingConfig},
    render::{self, CameraFeedFactory, Overlay},
    sensor,
    server::{self, AppState},
    stream::FeedHub,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "server", about = "Stream the tracked camera feed and sensor readings over HTTP")]
struct Args {
    #[command(flatten)]
    source: SourceConfig,

    #[command(flatten)]
    tracking: TrackingConfig,

    #[command(flatten)]
    server: ServerConfig,

    #[command(flatten)]
    sensor: SensorConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();

    // the seed region is settled before any request is served
    let seed = match args.tracking.roi {
        Some(region) => region,
        None => render::select_seed(&args.source, "select object")
            .context("no --roi given and interactive selection failed")?,
    };
    info!("seed region {}", seed);

    let factory = CameraFeedFactory {
        source: args.source.clone(),
        tracker: args.tracking.tracker,
        seed,
        overlay: Overlay::stream(),
        jpeg_quality: args.server.jpeg_quality,
    };

    let feeds = FeedHub::new(
        Arc::new(factory),
        args.server.feed_mode,
        args.server.broadcast_capacity,
    );
    let state = AppState::new(feeds, sensor::from_config(&args.sensor));

    server::serve(&args.server, state).await?;

    Ok(())
}
