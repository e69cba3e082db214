//! Ctrl+C handling.
//!
//! Before a sync runner is registered, Ctrl+C exits at once: nothing is
//! buffered in memory yet. Afterwards it asks the runner to flush and stop.

use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;

use crate::sync::SyncMsg;

/// Shutdown channel of the running sync runner
static SHUTDOWN_TX: OnceLock<mpsc::Sender<SyncMsg>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
pub fn setup_shutdown_handler() -> Result<()> {
    ctrlc::set_handler(|| match SHUTDOWN_TX.get() {
        Some(tx) => {
            crate::log!("watch"; "shutting down...");
            // A full queue or a runner already gone: nothing left to wait for
            if tx.try_send(SyncMsg::Shutdown).is_err() {
                std::process::exit(1);
            }
        }
        None => std::process::exit(130),
    })
    .map_err(|e| anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Route Ctrl+C to a sync runner
pub fn register_runner(tx: mpsc::Sender<SyncMsg>) {
    let _ = SHUTDOWN_TX.set(tx);
}
