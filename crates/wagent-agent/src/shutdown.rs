// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process shutdown on SIGINT or SIGTERM.
//!
//! The returned token is the root of every agent's event-loop token and of
//! the run poller's, so a signal stops live sessions and ends pending polls
//! with `Cancelled`.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawns a task that cancels the returned token on the first signal.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!(signal = "SIGINT", "stopping agents"),
                        _ = sigterm.recv() => info!(signal = "SIGTERM", "stopping agents"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "could not install SIGTERM handler, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!(signal = "SIGINT", "stopping agents");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!(signal = "ctrl-c", "stopping agents");
        }

        trigger.cancel();
        debug!("shutdown token cancelled");
    });

    token
}
