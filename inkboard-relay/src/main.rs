//! Inkboard relay: serves one shared board over WebSocket.
//!
//! Configured from the environment (`INKBOARD_BIND`, `INKBOARD_MAX_PEERS`,
//! `INKBOARD_BROADCAST_CAPACITY`); log level from `RUST_LOG`.

use std::process::ExitCode;

use inkboard_collab::relay::{RelayConfig, RelayServer};
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Starting Inkboard relay on {} (max {} peers, {} buffered frames)",
        config.bind_addr, config.max_peers, config.broadcast_capacity
    );
    let server = RelayServer::new(config);

    tokio::select! {
        result = server.run() => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Relay stopped: {e}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            let stats = server.stats().await;
            info!(
                "Shutting down after {} connections, {} frames relayed, {} rejected",
                stats.total_connections, stats.total_frames, stats.rejected_frames
            );
            ExitCode::SUCCESS
        }
    }
}
