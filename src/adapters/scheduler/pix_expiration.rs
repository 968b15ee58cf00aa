//! PixExpirationSweeper - Periodically expires unpaid PIX signups.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::application::handlers::ExpirePixSubscriptionsHandler;

/// Background task running the PIX expiry handler on an interval.
pub struct PixExpirationSweeper {
    handler: Arc<ExpirePixSubscriptionsHandler>,
    interval: Duration,
}

impl PixExpirationSweeper {
    pub fn new(handler: Arc<ExpirePixSubscriptionsHandler>, interval: Duration) -> Self {
        Self { handler, interval }
    }

    /// Run the sweep loop until shutdown signal is received.
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("pix expiration sweeper stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.handler.handle().await {
                        tracing::warn!(error = %e, "pix expiration sweep failed");
                    }
                }
            }
        }
    }
}
