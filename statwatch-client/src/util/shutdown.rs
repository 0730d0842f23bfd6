//! Process-wide shutdown signal.

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Cancelled once Ctrl+C is received; the monitor loop watches it.
pub static SHUTDOWN: Lazy<CancellationToken> = Lazy::new(CancellationToken::new);

/// Spawn a task that cancels [`SHUTDOWN`] on Ctrl+C.
pub fn listen_for_ctrl_c() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping");
            SHUTDOWN.cancel();
        }
    });
}
