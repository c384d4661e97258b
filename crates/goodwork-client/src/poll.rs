//! Background reachability polling.
//!
//! The poll runs independently of user-initiated requests and is not
//! synchronised with them; both feed the same tracker.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::api::GoodWorkApi;

/// Spawns the periodic ping task.
#[derive(Debug)]
pub struct ReachabilityPoller;

impl ReachabilityPoller {
    /// Start probing `GET /api/ping` every `interval`, beginning immediately.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(api: GoodWorkApi, interval: Duration) -> PollHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        match api.check_backend().await {
                            Ok(reachable) => debug!(reachable, "reachability probe finished"),
                            Err(err) => warn!(error = %err, "reachability probe could not be issued"),
                        }
                    }
                }
            }
            debug!("reachability poller stopped");
        });
        PollHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a running poll task.
#[derive(Debug)]
pub struct PollHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop polling and wait for the task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(err) = (&mut self.task).await {
            warn!(error = %err, "reachability poller ended abnormally");
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if self.shutdown.is_some() {
            self.task.abort();
        }
    }
}
