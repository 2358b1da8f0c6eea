//! Client-side item state and the request orchestration around it.
//!
//! The controller owns the cached item list, the form draft, the edit target,
//! the refresh state and the single active error. Remote state is only ever
//! taken from a refresh; mutations never patch the local list.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use shared::{
    domain::{Item, ItemId, SyncState},
    error::SyncFailure,
    protocol::{Draft, ItemPayload},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{config::ClientSettings, ItemsApi};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Keep the draft and edit target when a create/update request fails.
    pub keep_draft_on_failure: bool,
    /// Drop list results from refreshes overtaken by a newer one.
    pub discard_stale_refreshes: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            keep_draft_on_failure: false,
            discard_stale_refreshes: true,
        }
    }
}

impl From<&ClientSettings> for ControllerOptions {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            keep_draft_on_failure: settings.keep_draft_on_failure,
            discard_stale_refreshes: settings.discard_stale_refreshes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ControllerSnapshot {
    pub items: Vec<Item>,
    pub draft: Draft,
    /// Bumped whenever the controller replaces the draft on its own.
    pub draft_revision: u64,
    pub edit_target: Option<ItemId>,
    pub sync_state: SyncState,
    pub error: Option<SyncFailure>,
}

impl ControllerSnapshot {
    pub fn is_editing(&self) -> bool {
        self.edit_target.is_some()
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.error.map(SyncFailure::message)
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Changed(ControllerSnapshot),
    Failed(SyncFailure),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("draft is missing a name, description or price")]
    IncompleteDraft,
    #[error(transparent)]
    Failed(#[from] SyncFailure),
}

#[derive(Default)]
struct ControllerState {
    items: Vec<Item>,
    draft: Draft,
    draft_revision: u64,
    edit_target: Option<ItemId>,
    error: Option<SyncFailure>,
    next_refresh_token: u64,
    applied_refresh_token: u64,
}

impl ControllerState {
    fn snapshot(&self, sync_state: SyncState) -> ControllerSnapshot {
        ControllerSnapshot {
            items: self.items.clone(),
            draft: self.draft.clone(),
            draft_revision: self.draft_revision,
            edit_target: self.edit_target.clone(),
            sync_state,
            error: self.error,
        }
    }

    fn replace_draft(&mut self, draft: Draft, edit_target: Option<ItemId>) {
        self.draft = draft;
        self.edit_target = edit_target;
        self.draft_revision += 1;
    }
}

/// One outstanding refresh. Dropping it settles the count, including when the
/// refresh future is cancelled mid-request.
struct RefreshInFlight<'a> {
    controller: &'a SyncController,
    completed: bool,
}

impl<'a> RefreshInFlight<'a> {
    fn enter(controller: &'a SyncController) -> Self {
        controller.refreshes_in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            controller,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for RefreshInFlight<'_> {
    fn drop(&mut self) {
        self.controller
            .refreshes_in_flight
            .fetch_sub(1, Ordering::SeqCst);
        if !self.completed {
            debug!("refresh dropped before completion");
            // Whoever holds the lock publishes on release.
            if let Ok(inner) = self.controller.inner.try_lock() {
                self.controller.publish(&inner);
            }
        }
    }
}

pub struct SyncController {
    api: Arc<dyn ItemsApi>,
    options: ControllerOptions,
    inner: Mutex<ControllerState>,
    refreshes_in_flight: AtomicUsize,
    events: broadcast::Sender<ControllerEvent>,
}

impl SyncController {
    pub fn new(api: Arc<dyn ItemsApi>) -> Arc<Self> {
        Self::with_options(api, ControllerOptions::default())
    }

    pub fn with_options(api: Arc<dyn ItemsApi>, options: ControllerOptions) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            api,
            options,
            inner: Mutex::new(ControllerState::default()),
            refreshes_in_flight: AtomicUsize::new(0),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let inner = self.inner.lock().await;
        inner.snapshot(self.sync_state())
    }

    fn sync_state(&self) -> SyncState {
        if self.refreshes_in_flight.load(Ordering::SeqCst) > 0 {
            SyncState::Loading
        } else {
            SyncState::Idle
        }
    }

    /// Fetch the whole collection and replace the cached list.
    ///
    /// The returned result describes this request. Its effect on state is
    /// dropped when a newer refresh has already been applied.
    pub async fn refresh(&self) -> Result<(), SyncFailure> {
        let (token, in_flight) = {
            let mut inner = self.inner.lock().await;
            inner.next_refresh_token += 1;
            let in_flight = RefreshInFlight::enter(self);
            self.publish(&inner);
            (inner.next_refresh_token, in_flight)
        };

        let result = self.api.list_items().await;

        let mut inner = self.inner.lock().await;
        in_flight.complete();
        let stale = self.options.discard_stale_refreshes && token < inner.applied_refresh_token;

        let outcome = match result {
            Ok(items) if stale => {
                debug!(token, count = items.len(), "discarding stale item list");
                Ok(())
            }
            Ok(items) => {
                inner.applied_refresh_token = token;
                inner.items = items;
                inner.error = None;
                Ok(())
            }
            Err(err) => {
                warn!("fetch items failed: {err:#}");
                if stale {
                    debug!(token, "ignoring stale fetch failure");
                } else {
                    inner.applied_refresh_token = token;
                    inner.error = Some(SyncFailure::Fetch);
                }
                Err(SyncFailure::Fetch)
            }
        };

        self.publish(&inner);
        if let Err(failure) = outcome {
            if !stale {
                let _ = self.events.send(ControllerEvent::Failed(failure));
            }
        }
        outcome
    }

    /// Route the current draft to create or update, then refresh.
    ///
    /// The draft and edit target are reset after the request completes. Unless
    /// `keep_draft_on_failure` is set this happens even when the request fails.
    pub async fn submit(&self) -> Result<(), SubmitError> {
        let (payload, edit_target) = {
            let inner = self.inner.lock().await;
            let Some(payload) = inner.draft.payload() else {
                return Err(SubmitError::IncompleteDraft);
            };
            (payload, inner.edit_target.clone())
        };

        let outcome = match &edit_target {
            Some(id) => self.request_update(id, &payload).await,
            None => self.request_create(&payload).await,
        };

        if outcome.is_ok() || !self.options.keep_draft_on_failure {
            let mut inner = self.inner.lock().await;
            inner.replace_draft(Draft::default(), None);
            self.publish(&inner);
        }

        outcome?;
        self.refresh().await?;
        Ok(())
    }

    /// POST a new item and refresh on success.
    pub async fn create(&self, payload: ItemPayload) -> Result<(), SyncFailure> {
        self.request_create(&payload).await?;
        self.refresh().await
    }

    /// PUT over an existing item and refresh on success.
    pub async fn update(&self, id: &ItemId, payload: ItemPayload) -> Result<(), SyncFailure> {
        self.request_update(id, &payload).await?;
        self.refresh().await
    }

    /// DELETE an item. Refreshes only when the delete succeeded.
    pub async fn delete(&self, id: &ItemId) -> Result<(), SyncFailure> {
        match self.api.delete_item(id).await {
            Ok(()) => {
                info!(%id, "item deleted");
                self.refresh().await
            }
            Err(err) => {
                warn!(%id, "delete item failed: {err:#}");
                self.record_failure(SyncFailure::Delete).await;
                Err(SyncFailure::Delete)
            }
        }
    }

    pub async fn begin_edit(&self, item: &Item) {
        let mut inner = self.inner.lock().await;
        if !inner.items.iter().any(|cached| cached.id == item.id) {
            warn!(id = %item.id, "editing an item missing from the last fetched list");
        }
        inner.replace_draft(Draft::from(item), Some(item.id.clone()));
        self.publish(&inner);
    }

    /// Begin editing a cached item by id. Returns `false` when the id is not
    /// in the last fetched list.
    pub async fn begin_edit_by_id(&self, id: &ItemId) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(item) = inner.items.iter().find(|item| &item.id == id).cloned() else {
            return false;
        };
        inner.replace_draft(Draft::from(&item), Some(item.id));
        self.publish(&inner);
        true
    }

    pub async fn cancel_edit(&self) {
        let mut inner = self.inner.lock().await;
        inner.replace_draft(Draft::default(), None);
        self.publish(&inner);
    }

    pub async fn set_draft_name(&self, name: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.draft.name = name.into();
        self.publish(&inner);
    }

    pub async fn set_draft_description(&self, description: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.draft.description = description.into();
        self.publish(&inner);
    }

    pub async fn set_draft_price(&self, price: Option<f64>) {
        let mut inner = self.inner.lock().await;
        inner.draft.price = price;
        self.publish(&inner);
    }

    /// Overwrite the draft fields. Keeps the edit target and does not bump the
    /// draft revision.
    pub async fn replace_draft(&self, draft: Draft) {
        let mut inner = self.inner.lock().await;
        inner.draft = draft;
        self.publish(&inner);
    }

    /// Apply a draft typed against `base_revision`. Edits made before the
    /// controller last replaced the draft are dropped; returns whether the
    /// edit was applied.
    pub async fn edit_draft(&self, draft: Draft, base_revision: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if base_revision != inner.draft_revision {
            debug!(
                base_revision,
                current = inner.draft_revision,
                "dropping draft edit from an older revision"
            );
            return false;
        }
        inner.draft = draft;
        self.publish(&inner);
        true
    }

    async fn request_create(&self, payload: &ItemPayload) -> Result<(), SyncFailure> {
        match self.api.create_item(payload).await {
            Ok(()) => {
                info!(name = %payload.name, "item created");
                Ok(())
            }
            Err(err) => {
                warn!(name = %payload.name, "create item failed: {err:#}");
                self.record_failure(SyncFailure::Create).await;
                Err(SyncFailure::Create)
            }
        }
    }

    async fn request_update(&self, id: &ItemId, payload: &ItemPayload) -> Result<(), SyncFailure> {
        match self.api.update_item(id, payload).await {
            Ok(()) => {
                info!(%id, "item updated");
                Ok(())
            }
            Err(err) => {
                warn!(%id, "update item failed: {err:#}");
                self.record_failure(SyncFailure::Update).await;
                Err(SyncFailure::Update)
            }
        }
    }

    async fn record_failure(&self, failure: SyncFailure) {
        let mut inner = self.inner.lock().await;
        inner.error = Some(failure);
        self.publish(&inner);
        let _ = self.events.send(ControllerEvent::Failed(failure));
    }

    fn publish(&self, inner: &ControllerState) {
        let _ = self
            .events
            .send(ControllerEvent::Changed(inner.snapshot(self.sync_state())));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
