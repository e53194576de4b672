//! # actiflowd — actiflow daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialise logging
//! - Build the virtual board and load the activity graph
//! - Construct the instance, spawn its runner and one sensor feed per
//!   watched sensor
//! - Build the axum router over the instance handle and the event bus
//! - Bind to a TCP port and serve until Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no engine logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use actiflow_adapter_http_axum::state::AppState;
use actiflow_adapter_virtual::VirtualRemote;
use actiflow_app::event_bus::InProcessEventBus;
use actiflow_app::executor::Instance;
use actiflow_app::poller::spawn_sensor_feed;
use actiflow_app::ports::HandleRegistry;
use actiflow_app::runner;
use actiflow_app::sampling::Sampler;
use actiflow_domain::id::CapabilityName;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    init_tracing(&config.logging.filter);

    // Board and graph
    let board = config.board.build()?;
    let graph = config.graph.load()?;
    tracing::info!(graph = %graph.name, entry = %graph.entry, activities = graph.activities.len(), "graph loaded");

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));

    // Instance
    let instance = Instance::new(
        graph,
        &board,
        VirtualRemote::default(),
        Arc::clone(&event_bus),
        Sampler::new(config.engine.sample_poll()),
    )?
    .with_send_timeout(config.engine.send_timeout());
    let watched: Vec<CapabilityName> = instance
        .graph()
        .watched_sensors()
        .into_iter()
        .cloned()
        .collect();
    let handle = runner::spawn(instance, config.engine.queue_capacity);

    // Sensor feeds
    for name in watched {
        let sensor = board.sensor(&name)?;
        spawn_sensor_feed(name, sensor, config.engine.feed_interval(), handle.clone());
    }

    let observer = handle.clone();
    tokio::spawn(async move {
        match observer.wait_until_finished().await {
            Ok(state) => tracing::info!(instance_id = %observer.id(), %state, "instance finished"),
            Err(err) => tracing::warn!(instance_id = %observer.id(), %err, "instance stopped"),
        }
    });

    if config.engine.autostart {
        handle.start().await?;
    }

    // HTTP
    let state = AppState::new(handle.clone(), event_bus);
    let app = actiflow_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, instance_id = %handle.id(), "actiflowd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(state = %handle.state(), "actiflowd stopped");
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
