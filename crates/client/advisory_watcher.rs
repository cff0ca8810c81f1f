//! Periodic expiry check for a signed-in member.
//!
//! The watcher lives as long as the session: it checks once at start, then on
//! every tick, and pushes advisories to whoever holds the receiver.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tokio::{sync::mpsc, task::JoinHandle, time::interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    client::api_client::MySubscriptionsSource,
    domain::value_objects::advisories::{Advisory, advisories_for},
};

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub struct AdvisoryWatcher {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl AdvisoryWatcher {
    pub fn start<S>(source: Arc<S>, check_interval: Duration, sender: mpsc::Sender<Advisory>) -> Self
    where
        S: MySubscriptionsSource + Send + Sync + 'static,
    {
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            // The first tick completes immediately.
            let mut ticker = interval(check_interval);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !check_once(source.as_ref(), &sender).await {
                            debug!("advisory_watcher: receiver dropped, stopping");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            cancel_token,
            handle,
        }
    }

    /// Cancels the watcher and waits for the task to finish.
    pub async fn stop(self) {
        self.cancel_token.cancel();
        self.handle.await.ok();
    }
}

/// Returns `false` once nobody is listening anymore.
async fn check_once<S>(source: &S, sender: &mpsc::Sender<Advisory>) -> bool
where
    S: MySubscriptionsSource + Send + Sync,
{
    let subscriptions = match source.fetch_my_subscriptions().await {
        Ok(subscriptions) => subscriptions,
        Err(err) => {
            warn!(error = ?err, "advisory_watcher: failed to fetch subscriptions, skipping check");
            return !sender.is_closed();
        }
    };

    let subscriptions: Vec<_> = subscriptions
        .into_iter()
        .map(|entry| entry.subscription)
        .collect();

    for advisory in advisories_for(&subscriptions, Utc::now()) {
        if sender.send(advisory).await.is_err() {
            return false;
        }
    }

    true
}
