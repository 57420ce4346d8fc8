//! Fixed-interval polling of a queued batch job.
//!
//! One poller owns at most one timer task. The task stops itself on the
//! first terminal observation; for completed batches it fetches the
//! results page exactly once before exiting, and never for failed ones.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::api::ApiClient;
use crate::types::EngineEvent;
use client_logging::{client_info, client_warn};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Page size for the single results fetch of a completed batch.
    pub results_page_limit: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            results_page_limit: 100,
        }
    }
}

pub struct BatchProgressPoller {
    api: Arc<ApiClient>,
    config: PollerConfig,
    events: mpsc::Sender<EngineEvent>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl BatchProgressPoller {
    pub fn new(
        api: Arc<ApiClient>,
        config: PollerConfig,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            api,
            config,
            events,
            task: None,
        }
    }

    /// Starts watching a batch. Any previous timer is stopped first, so
    /// at most one poll loop exists at a time.
    pub fn start(&mut self, handle: &tokio::runtime::Handle, batch_id: String) {
        self.stop();
        client_info!("polling batch {batch_id} every {:?}", self.config.interval);
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        let interval = self.config.interval;
        let page_limit = self.config.results_page_limit;
        self.task = Some(handle.spawn(poll_loop(api, batch_id, interval, page_limit, events)));
    }

    /// Idempotent: safe whether or not a poll loop is active.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for BatchProgressPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    api: Arc<ApiClient>,
    batch_id: String,
    interval: Duration,
    page_limit: u64,
    events: mpsc::Sender<EngineEvent>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let job = match api.batch_status(&batch_id).await {
            Ok(job) => job,
            Err(error) => {
                // A failed poll is retried on the next tick; the batch
                // itself has not failed.
                client_warn!("status poll for batch {batch_id} failed: {error}");
                continue;
            }
        };
        let status = job.status;
        if events.send(EngineEvent::BatchStatus(job)).is_err() {
            return;
        }
        if !status.is_terminal() {
            continue;
        }
        if status.has_results() {
            let result = api.batch_results(&batch_id, 0, page_limit).await;
            let _ = events.send(EngineEvent::BatchResults {
                batch_id: batch_id.clone(),
                result,
            });
        }
        client_info!("batch {batch_id} reached {status}; polling stopped");
        return;
    }
}
