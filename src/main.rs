//! gdl90-relay: relays traffic updates as a GDL90 stream
//!
//! Receives canonical traffic updates as NDJSON over TCP, keeps them in a
//! target store and broadcasts GDL90 frames over UDP at a fixed interval.

mod config;
mod error;
mod network;

use std::sync::Arc;

use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gdl90_relay::store::TrafficStore;
use gdl90_relay::update::TrafficUpdate;

use crate::config::Config;

const UPDATE_QUEUE_LEN: usize = 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_args();

    let filter = if config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!("gdl90-relay starting...");
    info!("Configuration: {:?}", config);

    let store = Arc::new(TrafficStore::new(config.store_config()));

    // Channel for parsed updates
    let (update_tx, update_rx): (Sender<TrafficUpdate>, Receiver<TrafficUpdate>) =
        bounded(UPDATE_QUEUE_LEN);

    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let net_handle = {
            let store = Arc::clone(&store);
            let cfg = config.clone();
            tokio::spawn(async move {
                if let Err(e) = network::run_servers(cfg, store, update_tx).await {
                    error!("Network error: {}", e);
                }
            })
        };

        // Apply worker; blocks on the channel so it gets its own thread.
        let _apply_worker = {
            let store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || apply_updates(update_rx, &store))
        };

        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down, {} targets tracked", store.len());

        net_handle.abort();
    });
    // The apply worker may still be parked on the channel.
    rt.shutdown_background();

    Ok(())
}

fn apply_updates(rx: Receiver<TrafficUpdate>, store: &TrafficStore) {
    while let Ok(update) = rx.recv() {
        store.apply(Utc::now(), update);
    }
}
