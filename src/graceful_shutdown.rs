use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Resolves with the name of the first termination signal received.
///
/// If the handlers cannot be registered this never resolves, so the seed run
/// goes on without signal handling instead of being cut short.
pub async fn wait_for_signal() -> &'static str {
    let (mut sigterm, mut sigint) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (Err(e), _) | (_, Err(e)) => {
            error!("Unable to register shutdown handler: {}", e);
            return std::future::pending().await;
        }
    };
    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT"
    };
    // The following does not print in docker-compose setups but it does when run individually.
    info!("Received signal ({signal}) - aborting seed run.");
    signal
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn stays_pending_without_a_signal() {
        let waited = tokio::time::timeout(Duration::from_millis(50), wait_for_signal()).await;
        assert!(waited.is_err());
    }
}
