//! Collection poller
//!
//! Drives a scoring job to completion: one status request, then a status
//! request every interval while the job is pending. Each start gets its own
//! cancellation token; at most one loop per poller is ever live.

use std::sync::Arc;
use std::time::Duration;

use flipper_core::{
    CollectionEvent, CollectionRequest, CollectionStatus, JobStatus, RankedItem, SessionState,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::PollerConfig;
use crate::error::Result;
use crate::scoring::ScoringService;

/// Reason given when the service says the wallet has nothing to rank
pub const MISSING_TOKEN_REASON: &str = "You don't have needed NFT token in your wallet";

/// Reason given when the first status request could not be made at all
pub const RESCRAPE_REASON: &str = "Started rescrapping";

const EVENT_BUFFER: usize = 8;

/// The caller's side of a running collection.
///
/// Dropping the handle cancels the collection.
pub struct CollectionHandle {
    token: CancellationToken,
    events: mpsc::Receiver<CollectionEvent>,
}

impl CollectionHandle {
    /// Next event, or `None` once the collection has finished or was cancelled
    pub async fn next_event(&mut self) -> Option<CollectionEvent> {
        self.events.recv().await
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for CollectionHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub struct CollectionPoller {
    service: Arc<dyn ScoringService>,
    interval: Duration,
    active: Option<CancellationToken>,
}

impl CollectionPoller {
    pub fn new(service: Arc<dyn ScoringService>, config: &PollerConfig) -> Self {
        Self::with_interval(service, config.interval())
    }

    pub fn with_interval(service: Arc<dyn ScoringService>, interval: Duration) -> Self {
        Self {
            service,
            interval,
            active: None,
        }
    }

    /// Start collecting rankings for `session`, cancelling any previous run.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_collection(&mut self, session: &SessionState) -> CollectionHandle {
        self.cancel();

        let token = CancellationToken::new();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        self.active = Some(token.clone());

        tracing::info!(
            wallet = %session.wallet_address,
            contract = %session.contract_address,
            "Starting collection"
        );

        tokio::spawn(run_collection(
            Arc::clone(&self.service),
            session.collection_request(),
            self.interval,
            token.clone(),
            tx,
        ));

        CollectionHandle { token, events: rx }
    }

    /// Cancel the live collection, if any.
    pub fn cancel(&mut self) {
        if let Some(token) = self.active.take() {
            if !token.is_cancelled() {
                tracing::debug!("Cancelling previous collection");
            }
            token.cancel();
        }
    }

    /// Whether a polling loop is still live
    pub fn is_polling(&self) -> bool {
        self.active.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    /// Single retrieval of a ready payload. Never retried here.
    pub async fn fetch_payload(&self, data_url: &str) -> Result<Vec<RankedItem>> {
        self.service.fetch_payload(data_url).await
    }
}

impl Drop for CollectionPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Send `event` unless the collection was cancelled first.
async fn emit(
    tx: &mpsc::Sender<CollectionEvent>,
    token: &CancellationToken,
    event: CollectionEvent,
) -> bool {
    if token.is_cancelled() {
        return false;
    }
    tracing::debug!(?event, "Collection event");
    tokio::select! {
        _ = token.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}

/// Status request that gives up as soon as the token is cancelled.
async fn check_status(
    service: &dyn ScoringService,
    request: &CollectionRequest,
    token: &CancellationToken,
) -> Option<Result<CollectionStatus>> {
    let result = tokio::select! {
        _ = token.cancelled() => return None,
        result = service.check_status(request) => result,
    };
    // a response that lands after cancellation is discarded
    if token.is_cancelled() {
        return None;
    }
    Some(result)
}

fn ready_event(status: CollectionStatus) -> CollectionEvent {
    match status.data_url {
        Some(data_url) if !data_url.is_empty() => CollectionEvent::DataReady { data_url },
        _ => CollectionEvent::Failed {
            message: "scoring service reported ready without a data url".to_string(),
        },
    }
}

async fn run_collection(
    service: Arc<dyn ScoringService>,
    request: CollectionRequest,
    interval: Duration,
    token: CancellationToken,
    tx: mpsc::Sender<CollectionEvent>,
) {
    // the token ends up cancelled however this task exits
    let _guard = token.clone().drop_guard();

    let status = match check_status(service.as_ref(), &request, &token).await {
        None => return,
        Some(Ok(status)) => status,
        Some(Err(e)) => {
            tracing::warn!(error = %e, wallet = %request.wallet_address, "Initial status request failed");
            emit(&tx, &token, CollectionEvent::NoData { reason: RESCRAPE_REASON.into() }).await;
            return;
        }
    };

    if status.is_no_data() {
        tracing::info!(
            status_code = ?status.status_code,
            message = ?status.message,
            "No data for wallet"
        );
        emit(&tx, &token, CollectionEvent::NoData { reason: MISSING_TOKEN_REASON.into() }).await;
        return;
    }

    if status.is_ready() {
        emit(&tx, &token, ready_event(status)).await;
        return;
    }

    if !emit(&tx, &token, CollectionEvent::Pending).await {
        return;
    }

    let mut attempt: u32 = 0;
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!(attempt, "Polling cancelled");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
        attempt += 1;

        let status = match check_status(service.as_ref(), &request, &token).await {
            None => return,
            Some(Ok(status)) => status,
            Some(Err(e)) => {
                tracing::warn!(error = %e, attempt, "Status poll failed, retrying");
                continue;
            }
        };

        match status.status {
            JobStatus::Ready => {
                tracing::info!(attempt, "Collection ready");
                emit(&tx, &token, ready_event(status)).await;
                return;
            }
            JobStatus::Error => {
                let message = status
                    .message
                    .unwrap_or_else(|| "scoring job failed".to_string());
                tracing::warn!(attempt, message = %message, "Scoring job failed");
                emit(&tx, &token, CollectionEvent::Failed { message }).await;
                return;
            }
            JobStatus::Pending if status.is_no_data() => {
                tracing::info!(attempt, status_code = ?status.status_code, "Collection disappeared while pending");
                emit(&tx, &token, CollectionEvent::NoData { reason: MISSING_TOKEN_REASON.into() }).await;
                return;
            }
            JobStatus::Pending => {
                tracing::debug!(attempt, "Collection still pending");
            }
        }
    }
}
