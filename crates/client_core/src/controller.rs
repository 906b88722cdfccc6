//! Fetch pipeline of a single collection view.
//!
//! Intents mutate the [`ViewState`] synchronously and then run a fetch. Every
//! fetch is tagged with a monotonically increasing [`RequestTag`]; only the
//! fetch holding the newest tag may commit results or clear `is_loading`.
//! Superseded fetches also have their cancellation token fired so transports
//! that honour it can stop early.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{SortDirection, Sorting},
    protocol::{SearchRequest, SearchResult},
};
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    columns::ColumnDef,
    config::ControllerSettings,
    error::{FailureKind, FetchFailure, FetchOutcome, TransportError},
    notify::Notifier,
    transport::CollectionTransport,
    view_state::{Seed, ViewState},
};

pub type RequestTag = u64;

struct InflightFetch {
    tag: RequestTag,
    cancel: CancellationToken,
}

struct PendingSearch {
    ticket: u64,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct FetchSlot {
    last_tag: RequestTag,
    inflight: Option<InflightFetch>,
    last_ticket: u64,
    pending_search: Option<PendingSearch>,
    shut_down: bool,
}

impl FetchSlot {
    /// Invalidates whatever fetch is outstanding and returns a fresh tag.
    fn supersede(&mut self) -> RequestTag {
        if let Some(previous) = self.inflight.take() {
            debug!(tag = previous.tag, "superseding in-flight fetch");
            previous.cancel.cancel();
        }
        self.last_tag += 1;
        self.last_tag
    }

    fn cancel_pending_search(&mut self) {
        if let Some(pending) = self.pending_search.take() {
            debug!(ticket = pending.ticket, "dropping pending search");
            pending.timer.abort();
        }
    }

    fn owns(&self, tag: RequestTag) -> bool {
        self.inflight.as_ref().is_some_and(|fetch| fetch.tag == tag)
    }
}

/// Clears the loading flag of its fetch when dropped, so a caller that
/// abandons an intent future never leaves the view stuck in loading.
struct LoadingGuard<'a, R> {
    controller: &'a CollectionController<R>,
    tag: RequestTag,
}

impl<R> Drop for LoadingGuard<'_, R> {
    fn drop(&mut self) {
        self.controller.finish(self.tag, |_| {});
    }
}

pub struct CollectionController<R> {
    transport: Arc<dyn CollectionTransport<R>>,
    notifier: Arc<dyn Notifier>,
    settings: ControllerSettings,
    state: watch::Sender<ViewState<R>>,
    slot: Mutex<FetchSlot>,
}

impl<R> CollectionController<R> {
    pub fn subscribe(&self) -> watch::Receiver<ViewState<R>> {
        self.state.subscribe()
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Cancels the in-flight fetch and any pending search. Nothing is
    /// committed afterwards and later intents resolve to `Superseded`.
    pub fn shutdown(&self) {
        let mut slot = self.lock_slot();
        if slot.shut_down {
            return;
        }
        slot.shut_down = true;
        slot.cancel_pending_search();
        slot.supersede();
        self.state.send_modify(|state| state.is_loading = false);
        debug!("collection controller shut down");
    }

    fn lock_slot(&self) -> MutexGuard<'_, FetchSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Terminal step of fetch `tag`. Applies `commit` and releases the
    /// loading flag only if `tag` still owns the slot; returns whether it did.
    fn finish(&self, tag: RequestTag, commit: impl FnOnce(&mut ViewState<R>)) -> bool {
        let mut slot = self.lock_slot();
        if !slot.owns(tag) {
            return false;
        }
        slot.inflight = None;
        self.state.send_modify(|state| {
            commit(state);
            state.is_loading = false;
            state.initialized = true;
        });
        true
    }
}

impl<R> CollectionController<R>
where
    R: Clone + Send + Sync + 'static,
{
    pub fn new(
        transport: Arc<dyn CollectionTransport<R>>,
        notifier: Arc<dyn Notifier>,
        settings: ControllerSettings,
    ) -> Arc<Self> {
        let initial = ViewState::new(&settings);
        Self::build(transport, notifier, settings, initial)
    }

    /// Builds a controller from server-rendered data; no fetch is issued
    /// until the first intent.
    pub fn with_seed(
        transport: Arc<dyn CollectionTransport<R>>,
        notifier: Arc<dyn Notifier>,
        settings: ControllerSettings,
        seed: Seed<R>,
    ) -> Arc<Self> {
        let initial = ViewState::seeded(&settings, seed);
        Self::build(transport, notifier, settings, initial)
    }

    fn build(
        transport: Arc<dyn CollectionTransport<R>>,
        notifier: Arc<dyn Notifier>,
        settings: ControllerSettings,
        initial: ViewState<R>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(initial);
        Arc::new(Self {
            transport,
            notifier,
            settings,
            state,
            slot: Mutex::new(FetchSlot::default()),
        })
    }

    pub fn snapshot(&self) -> ViewState<R> {
        self.state.borrow().clone()
    }

    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        let page = page.max(self.settings.first_page());
        if !self.apply_intent(|state| state.current_page = page) {
            return FetchOutcome::Superseded;
        }
        self.fetch_users().await
    }

    pub async fn set_page_size(&self, size: u32) -> FetchOutcome {
        let size = size.max(1);
        if !self.apply_intent(|state| state.page_size = size) {
            return FetchOutcome::Superseded;
        }
        self.fetch_users().await
    }

    pub async fn set_sort(
        &self,
        field: impl Into<String>,
        direction: SortDirection,
    ) -> FetchOutcome {
        let sorting = Sorting::new(field, direction);
        if !self.apply_intent(|state| state.sorting = sorting) {
            return FetchOutcome::Superseded;
        }
        self.fetch_users().await
    }

    /// Same field flips the direction; a new field starts ascending.
    pub async fn toggle_sort(&self, field: &str) -> FetchOutcome {
        let applied = self.apply_intent(|state| {
            state.sorting = if state.sorting.field == field {
                Sorting::new(field, state.sorting.direction.flipped())
            } else {
                Sorting::ascending(field)
            };
        });
        if !applied {
            return FetchOutcome::Superseded;
        }
        self.fetch_users().await
    }

    /// Header-click helper; non-sortable columns issue no fetch.
    pub async fn sort_by_column(&self, column: &ColumnDef) -> Option<FetchOutcome> {
        if !column.sortable {
            return None;
        }
        Some(self.toggle_sort(column.key).await)
    }

    pub async fn next_page(&self) -> Option<FetchOutcome> {
        let target = {
            let state = self.state.borrow();
            state.has_next_page().then(|| state.current_page + 1)
        };
        let page = target?;
        Some(self.set_page(page).await)
    }

    pub async fn previous_page(&self) -> Option<FetchOutcome> {
        let target = {
            let state = self.state.borrow();
            state.has_previous_page().then(|| state.current_page - 1)
        };
        let page = target?;
        Some(self.set_page(page).await)
    }

    /// Updates the search text, resets to the first page and fetches once the
    /// debounce window passes without another search. Calls whose window was
    /// restarted, or pre-empted by an immediate intent, resolve to `Superseded`.
    pub async fn set_search(self: &Arc<Self>, text: &str) -> FetchOutcome {
        let search = text.trim().to_string();
        let (done_tx, done_rx) = oneshot::channel();
        {
            let mut slot = self.lock_slot();
            if slot.shut_down {
                return FetchOutcome::Superseded;
            }
            let first_page = self.settings.first_page();
            self.state.send_modify(|state| {
                state.search = search;
                state.current_page = first_page;
                state.is_loading = true;
            });
            slot.supersede();
            slot.cancel_pending_search();

            slot.last_ticket += 1;
            let ticket = slot.last_ticket;
            let controller = Arc::downgrade(self);
            let window = self.settings.search_debounce;
            let timer = tokio::spawn(async move {
                tokio::time::sleep(window).await;
                let Some(controller) = controller.upgrade() else {
                    return;
                };
                let outcome = controller.run_fetch(Some(ticket)).await;
                let _ = done_tx.send(outcome);
            });
            slot.pending_search = Some(PendingSearch { ticket, timer });
        }
        done_rx.await.unwrap_or(FetchOutcome::Superseded)
    }

    /// Fetches the current configuration immediately, bypassing debounce.
    pub async fn reload(&self) -> FetchOutcome {
        self.fetch_users().await
    }

    /// First load of a view mounted without seed data.
    pub async fn load_if_needed(&self) -> Option<FetchOutcome> {
        let initialized = self.state.borrow().initialized;
        if initialized {
            return None;
        }
        Some(self.reload().await)
    }

    /// Returns false, leaving the state untouched, once the controller is shut down.
    fn apply_intent(&self, mutate: impl FnOnce(&mut ViewState<R>)) -> bool {
        let mut slot = self.lock_slot();
        if slot.shut_down {
            return false;
        }
        self.state.send_modify(mutate);
        slot.supersede();
        true
    }

    /// Starts a fetch under a single slot lock. An immediate fetch (`ticket`
    /// is `None`) drops any pending search; a debounced one only proceeds
    /// while its ticket is still the pending search.
    fn begin_fetch(
        &self,
        ticket: Option<u64>,
    ) -> Option<(RequestTag, CancellationToken, SearchRequest)> {
        let mut slot = self.lock_slot();
        if slot.shut_down {
            return None;
        }
        match ticket {
            Some(ticket) => {
                let current = slot
                    .pending_search
                    .as_ref()
                    .is_some_and(|pending| pending.ticket == ticket);
                if !current {
                    return None;
                }
                slot.pending_search = None;
            }
            None => slot.cancel_pending_search(),
        }
        let tag = slot.supersede();
        let cancel = CancellationToken::new();
        slot.inflight = Some(InflightFetch {
            tag,
            cancel: cancel.clone(),
        });
        let request = self.state.borrow().request();
        self.state.send_modify(|state| state.is_loading = true);
        Some((tag, cancel, request))
    }

    async fn fetch_users(&self) -> FetchOutcome {
        self.run_fetch(None).await
    }

    async fn run_fetch(&self, ticket: Option<u64>) -> FetchOutcome {
        let Some((tag, cancel, request)) = self.begin_fetch(ticket) else {
            return FetchOutcome::Superseded;
        };
        let _guard = LoadingGuard {
            controller: self,
            tag,
        };
        debug!(
            tag,
            page = request.page,
            size = request.size,
            search = %request.search,
            sort = %request.sort,
            "submitting collection fetch"
        );

        let result = self.transport.submit(request, cancel).await;
        let messages = &self.settings.messages;
        match result {
            Ok(SearchResult::Success { users, pagination }) => {
                let total_items = pagination.total_items;
                if !self.finish(tag, |state| state.commit_page(users, pagination)) {
                    debug!(tag, "discarding stale fetch result");
                    return FetchOutcome::Superseded;
                }
                info!(tag, total_items, "committed collection page");
                FetchOutcome::Loaded {
                    total_items,
                    message: messages.loaded.clone(),
                }
            }
            Ok(SearchResult::Failure { error }) => {
                if !self.finish(tag, |_| {}) {
                    debug!(tag, "discarding stale failure result");
                    return FetchOutcome::Superseded;
                }
                let message = error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| messages.load_failed.clone());
                self.notifier.notify_error(&message);
                FetchOutcome::Failed(FetchFailure {
                    kind: FailureKind::Application,
                    message,
                })
            }
            Err(TransportError::Cancelled) => {
                debug!(tag, "collection fetch cancelled");
                self.finish(tag, |_| {});
                FetchOutcome::Superseded
            }
            Err(TransportError::Failed(error)) => {
                if !self.finish(tag, |_| {}) {
                    debug!(tag, %error, "discarding stale transport failure");
                    return FetchOutcome::Superseded;
                }
                warn!(tag, error = %format!("{error:#}"), "collection fetch failed");
                let message = messages.unexpected_error.clone();
                self.notifier.notify_error(&message);
                FetchOutcome::Failed(FetchFailure {
                    kind: FailureKind::Transport,
                    message,
                })
            }
        }
    }
}

impl<R> Drop for CollectionController<R> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
