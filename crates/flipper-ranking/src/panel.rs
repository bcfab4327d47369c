//! Ranking panel controller
//!
//! Owns the poller, the fetched collection and the view selections for one
//! ranking panel. Notifications that the page would show as dialogs or
//! toasts are queued as [`Notice`]s.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use flipper_core::{
    CollectionEvent, RankedCollection, SessionState, SortOrder, ViewResult, ViewState,
};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::{RankingError, Result};
use crate::poller::{CollectionHandle, CollectionPoller, RESCRAPE_REASON};
use crate::scoring::ScoringService;

/// A user-visible notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Blocking dialog, shown until dismissed
    Modal { title: String, description: String },
    /// Transient notification
    Toast { message: String },
}

/// Clears the loading flag when a refresh ends, including when its future is dropped.
struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct RankingPanel {
    poller: CollectionPoller,
    view: ViewState,
    collection: Option<RankedCollection>,
    loading: Arc<AtomicBool>,
    modal: Option<Notice>,
    toasts: VecDeque<Notice>,
    page_change_delay: Duration,
}

impl RankingPanel {
    pub fn new(service: Arc<dyn ScoringService>, config: &AppConfig) -> Result<Self> {
        Ok(Self {
            poller: CollectionPoller::new(service, &config.poller),
            view: ViewState::new(config.view.page_size)?,
            collection: None,
            loading: Arc::new(AtomicBool::new(false)),
            modal: None,
            toasts: VecDeque::new(),
            page_change_delay: config.view.page_change_delay(),
        })
    }

    /// Run one collection for `session` to completion.
    ///
    /// Any previous collection is cancelled first. Returns the terminal event,
    /// or `None` if the collection was cancelled. Dropping the returned
    /// future cancels the collection.
    pub async fn refresh(&mut self, session: &SessionState) -> Option<CollectionEvent> {
        let _loading = LoadingGuard(Arc::clone(&self.loading));
        self.set_loading(false);
        let mut handle = self.poller.start_collection(session);

        self.drive(&mut handle, session).await
    }

    fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
    }

    async fn drive(
        &mut self,
        handle: &mut CollectionHandle,
        session: &SessionState,
    ) -> Option<CollectionEvent> {
        while let Some(event) = handle.next_event().await {
            match event {
                CollectionEvent::Pending => {
                    self.modal = None;
                    self.set_loading(true);
                }
                CollectionEvent::DataReady { data_url } => {
                    self.modal = None;
                    self.load_payload(&data_url, &session.contract_address).await;
                    return Some(CollectionEvent::DataReady { data_url });
                }
                CollectionEvent::NoData { reason } => {
                    self.show_no_data(&reason);
                    return Some(CollectionEvent::NoData { reason });
                }
                CollectionEvent::Failed { message } => {
                    self.toast(message.clone());
                    return Some(CollectionEvent::Failed { message });
                }
            }
        }
        None
    }

    async fn load_payload(&mut self, data_url: &str, contract_address: &str) {
        self.set_loading(true);

        match self.poller.fetch_payload(data_url).await {
            Ok(items) => {
                tracing::info!(
                    contract = %contract_address,
                    items = items.len(),
                    "Collection payload loaded"
                );
                self.collection = Some(RankedCollection::new(contract_address, items));
            }
            Err(e) => {
                tracing::warn!(error = %e, data_url = %data_url, "Payload fetch failed");
                self.toast(e.to_string());
            }
        }

        self.set_loading(false);
    }

    fn show_no_data(&mut self, reason: &str) {
        let title = if reason == RESCRAPE_REASON { "Not found" } else { "Error" };
        self.modal = Some(Notice::Modal {
            title: title.to_string(),
            description: reason.to_string(),
        });
    }

    fn toast(&mut self, message: String) {
        self.toasts.push_back(Notice::Toast { message });
    }

    /// Stop any live collection (panel teardown).
    pub fn close(&mut self) {
        self.poller.cancel();
        self.set_loading(false);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_polling()
    }

    pub fn collection(&self) -> Option<&RankedCollection> {
        self.collection.as_ref()
    }

    /// The loaded collection, or the error that kept a refresh from loading one.
    pub fn require_collection(
        &self,
        outcome: Option<&CollectionEvent>,
    ) -> Result<&RankedCollection> {
        match outcome {
            Some(CollectionEvent::DataReady { .. }) => self.collection.as_ref().ok_or_else(|| {
                RankingError::FetchFailed("collection payload could not be loaded".into())
            }),
            Some(CollectionEvent::NoData { reason }) => Err(RankingError::NoData(reason.clone())),
            Some(CollectionEvent::Failed { message }) => {
                Err(RankingError::TerminalJob(message.clone()))
            }
            Some(CollectionEvent::Pending) | None => Err(RankingError::Cancelled),
        }
    }

    /// The no-data dialog, if showing
    pub fn modal(&self) -> Option<&Notice> {
        self.modal.as_ref()
    }

    pub fn dismiss_modal(&mut self) {
        self.modal = None;
    }

    /// Drain queued toasts
    pub fn take_toasts(&mut self) -> Vec<Notice> {
        self.toasts.drain(..).collect()
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    /// Page currently selected over the fetched collection
    pub fn view(&mut self) -> ViewResult {
        let items = self
            .collection
            .as_ref()
            .map(|c| c.items.as_slice())
            .unwrap_or(&[]);
        self.view.view(items)
    }

    pub fn set_token_filter(&mut self, token_filter: Option<String>) {
        self.view.set_token_filter(token_filter);
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.view.set_sort_order(sort_order);
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        self.view.set_page_size(page_size)?;
        Ok(())
    }

    pub fn set_page(&mut self, page: usize) {
        self.view.set_page(page);
    }

    /// Page change as requested from the pager, applied after the configured delay.
    pub async fn request_page(&mut self, page: usize) {
        if !self.page_change_delay.is_zero() {
            tokio::time::sleep(self.page_change_delay).await;
        }
        self.view.set_page(page);
    }
}
