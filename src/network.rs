//! Network side of the relay
//!
//! TCP input of NDJSON traffic updates, the broadcast tick, and UDP output
//! of GDL90 frames.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use crossbeam_channel::{Sender, TrySendError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use gdl90_relay::broadcast::{tick_frames, TickInput};
use gdl90_relay::decode::FrameSummary;
use gdl90_relay::report::Traffic;
use gdl90_relay::store::TrafficStore;
use gdl90_relay::update::TrafficUpdate;

use crate::config::Config;
use crate::error::{RelayError, Result};

const BROADCAST_CAPACITY: usize = 1024;

pub async fn run_servers(
    config: Config,
    store: Arc<TrafficStore>,
    update_tx: Sender<TrafficUpdate>,
) -> Result<()> {
    let (frame_tx, _) = broadcast::channel::<Bytes>(BROADCAST_CAPACITY);

    let input_handle = {
        let port = config.listen_port;
        tokio::spawn(async move {
            if let Err(e) = run_update_input_server(port, update_tx).await {
                error!("Update input server error: {}", e);
            }
        })
    };

    // Subscribe before the first tick so no frame is lost.
    let output_handle = {
        let rx = frame_tx.subscribe();
        let dest = config.dest.clone();
        tokio::spawn(async move {
            if let Err(e) = run_udp_output(dest, rx).await {
                error!("UDP output error: {}", e);
            }
        })
    };

    let tick_handle = {
        let cfg = config.clone();
        let tx = frame_tx.clone();
        tokio::spawn(async move {
            run_broadcast_tick(cfg, store, tx).await;
        })
    };

    tokio::select! {
        _ = input_handle => {}
        _ = output_handle => {}
        _ = tick_handle => {}
    }

    Ok(())
}

/// Decode one NDJSON line.
pub fn parse_update_line(line: &str) -> Result<TrafficUpdate> {
    Ok(serde_json::from_str(line)?)
}

async fn run_update_input_server(port: u16, update_tx: Sender<TrafficUpdate>) -> Result<()> {
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Update input server listening on port {}", port);

    loop {
        let (socket, addr) = listener.accept().await?;
        debug!("Update input client connected: {}", addr);

        let tx = update_tx.clone();

        tokio::spawn(async move {
            let reader = BufReader::new(socket);
            let mut lines = reader.lines();

            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let update = match parse_update_line(line) {
                    Ok(u) => u,
                    Err(e) => {
                        warn!("Skipping line from {}: {}", addr, e);
                        continue;
                    }
                };
                match tx.try_send(update) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => warn!("Update queue full, dropping update"),
                    Err(TrySendError::Disconnected(_)) => {
                        error!("{}", RelayError::ChannelClosed);
                        break;
                    }
                }
            }
            debug!("Update input client disconnected: {}", addr);
        });
    }
}

async fn run_broadcast_tick(
    config: Config,
    store: Arc<TrafficStore>,
    tx: broadcast::Sender<Bytes>,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(config.interval_ms));
    let identity = config.identity();
    let ownship = config.ownship();

    loop {
        interval.tick().await;
        let now = Utc::now();

        let traffic: Vec<Traffic> = store
            .snapshot(now)
            .into_iter()
            .filter(Traffic::has_position)
            .collect();
        let input = TickInput {
            identity: identity.clone(),
            ownship: ownship.clone(),
            traffic,
            ..Default::default()
        };

        let frames = tick_frames(now, &input);
        if tracing::enabled!(tracing::Level::DEBUG) {
            let summary = FrameSummary::from_frames(&frames);
            debug!(
                targets = input.traffic.len(),
                frames = summary.frames,
                "Broadcast tick"
            );
        }
        for frame in frames {
            // No receivers only means output is not up yet.
            let _ = tx.send(frame);
        }
    }
}

async fn run_udp_output(dest: String, mut rx: broadcast::Receiver<Bytes>) -> Result<()> {
    let dest: SocketAddr = dest.parse()?;
    let bind = if dest.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(bind).await?;
    socket.set_broadcast(true)?;
    info!("Sending GDL90 to {}", dest);

    loop {
        match rx.recv().await {
            Ok(frame) => {
                if let Err(e) = socket.send_to(&frame, dest).await {
                    warn!("UDP send to {} failed: {}", dest, e);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("UDP output lagged, skipped {} frames", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    Ok(())
}
