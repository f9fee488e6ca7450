use std::time::Duration;

use tokio_util::sync::CancellationToken;

use beacon_core::group::{ReadySignal, RunFuture, Runnable};
use beacon_core::registry::Registerable;
use beacon_core::Result;

/// Poller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// First registration has not completed.
    NotReady,
    /// Registered at least once; re-registering on every interval.
    Running,
    /// Stop requested and honoured.
    Stopped,
}

impl PollerState {
    /// Convert to string for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReady => "not-ready",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// Periodically re-runs a registration action until cancelled.
///
/// The first invocation happens synchronously on start. If it fails the
/// poller returns that error without ever signalling readiness. Later
/// failures are logged and the next cycle proceeds as scheduled, so a
/// single missed cycle does not drop the instances from the registry as
/// long as the interval stays well under the registry lease.
pub struct RegistrationPoller<R> {
    action: R,
    interval: Duration,
}

impl<R: Registerable> RegistrationPoller<R> {
    /// Create a new poller.
    pub fn new(action: R, interval: Duration) -> Self {
        Self { action, interval }
    }

    /// Register once, signal readiness, then keep registering until `shutdown`.
    ///
    /// Cancellation is observed between cycles only; a cycle in flight
    /// always completes.
    pub async fn poll(&self, shutdown: CancellationToken, ready: ReadySignal) -> Result<()> {
        let mut state = PollerState::NotReady;
        tracing::debug!(state = state.as_str(), "Registration poller starting");

        self.action.register_all().await?;

        state = PollerState::Running;
        ready.notify();
        tracing::info!(
            interval = ?self.interval,
            state = state.as_str(),
            "Registration poller started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    state = PollerState::Stopped;
                    tracing::info!(state = state.as_str(), "Registration poller shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.action.register_all().await {
                        tracing::warn!(error = %e, "Registration cycle failed");
                    }
                }
            }
        }
    }
}

impl<R: Registerable> Runnable for RegistrationPoller<R> {
    fn run(self: Box<Self>, shutdown: CancellationToken, ready: ReadySignal) -> RunFuture {
        Box::pin(async move { self.poll(shutdown, ready).await })
    }
}
