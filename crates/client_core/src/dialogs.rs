//! Modal, edit and delete-confirmation state that sits next to a collection view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{UserId, UserRecord},
    protocol::{ActionResult, DeleteRequest},
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::Messages,
    error::{ActionOutcome, TransportError},
    notify::Notifier,
    transport::DeleteTransport,
};

pub trait RecordKey {
    fn record_id(&self) -> UserId;
}

impl RecordKey for UserRecord {
    fn record_id(&self) -> UserId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordModalState<R> {
    pub record: Option<R>,
    pub open: bool,
    pub editing: bool,
    pub saving: bool,
}

impl<R> Default for RecordModalState<R> {
    fn default() -> Self {
        Self {
            record: None,
            open: false,
            editing: false,
            saving: false,
        }
    }
}

pub struct RecordModal<R> {
    notifier: Arc<dyn Notifier>,
    default_success: String,
    state: RecordModalState<R>,
}

impl<R> RecordModal<R> {
    pub fn new(notifier: Arc<dyn Notifier>, messages: &Messages) -> Self {
        Self {
            notifier,
            default_success: messages.saved.clone(),
            state: RecordModalState::default(),
        }
    }

    pub fn state(&self) -> &RecordModalState<R> {
        &self.state
    }

    pub fn open_for_edit(&mut self, record: R) {
        self.open_with(record, true);
    }

    pub fn open_for_delete(&mut self, record: R) {
        self.open_with(record, false);
    }

    fn open_with(&mut self, record: R, editing: bool) {
        self.state = RecordModalState {
            record: Some(record),
            open: true,
            editing,
            saving: false,
        };
    }

    pub fn start_saving(&mut self) {
        self.state.saving = true;
    }

    pub fn handle_success(&mut self, message: Option<&str>) {
        self.notifier
            .notify_success(message.unwrap_or(&self.default_success));
        self.close();
    }

    /// Keeps the modal open so the user can retry.
    pub fn handle_error(&mut self, message: &str) {
        self.notifier.notify_error(message);
        self.state.saving = false;
    }

    pub fn close(&mut self) {
        self.state = RecordModalState::default();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditDialog<R> {
    selected: Option<R>,
    visible: bool,
    edit_mode: bool,
}

impl<R> Default for EditDialog<R> {
    fn default() -> Self {
        Self {
            selected: None,
            visible: false,
            edit_mode: false,
        }
    }
}

impl<R> EditDialog<R> {
    pub fn selected(&self) -> Option<&R> {
        self.selected.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn open_create(&mut self) {
        self.selected = None;
        self.edit_mode = false;
        self.visible = true;
    }

    pub fn open_edit(&mut self, record: R) {
        self.selected = Some(record);
        self.edit_mode = true;
        self.visible = true;
    }

    /// Hides the dialog; the selection is kept until the next open.
    pub fn close(&mut self) {
        self.visible = false;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteDialogState<R> {
    pub open: bool,
    pub deleting: bool,
    pub selected: Option<R>,
}

impl<R> Default for DeleteDialogState<R> {
    fn default() -> Self {
        Self {
            open: false,
            deleting: false,
            selected: None,
        }
    }
}

#[derive(Default)]
struct DeleteSlot {
    last_seq: u64,
    inflight: Option<(u64, CancellationToken)>,
}

impl DeleteSlot {
    fn cancel_inflight(&mut self) {
        if let Some((seq, cancel)) = self.inflight.take() {
            debug!(seq, "cancelling in-flight delete");
            cancel.cancel();
        }
    }
}

pub struct DeleteDialog<R> {
    transport: Arc<dyn DeleteTransport>,
    messages: Messages,
    state: watch::Sender<DeleteDialogState<R>>,
    slot: Mutex<DeleteSlot>,
}

impl<R> DeleteDialog<R>
where
    R: RecordKey + Clone + Send + Sync,
{
    pub fn new(transport: Arc<dyn DeleteTransport>, messages: Messages) -> Self {
        let (state, _) = watch::channel(DeleteDialogState::default());
        Self {
            transport,
            messages,
            state,
            slot: Mutex::new(DeleteSlot::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DeleteDialogState<R>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DeleteDialogState<R> {
        self.state.borrow().clone()
    }

    pub fn open(&self, record: R) {
        self.state.send_modify(|state| {
            state.selected = Some(record);
            state.open = true;
        });
    }

    /// Closes the dialog and cancels a delete that is still outstanding.
    pub fn close(&self) {
        self.lock_slot().cancel_inflight();
        self.state.send_modify(|state| {
            state.open = false;
            state.deleting = false;
            state.selected = None;
        });
    }

    pub async fn confirm(&self) -> ActionOutcome {
        let selected = self
            .state
            .borrow()
            .selected
            .as_ref()
            .map(RecordKey::record_id);
        let Some(id) = selected else {
            return ActionOutcome::aborted(&self.messages.nothing_selected);
        };

        let (seq, cancel) = {
            let mut slot = self.lock_slot();
            slot.cancel_inflight();
            slot.last_seq += 1;
            let seq = slot.last_seq;
            let cancel = CancellationToken::new();
            slot.inflight = Some((seq, cancel.clone()));
            (seq, cancel)
        };
        self.state.send_modify(|state| state.deleting = true);
        debug!(seq, %id, "submitting delete");

        let result = self.transport.delete(DeleteRequest { id }, cancel).await;

        {
            let mut slot = self.lock_slot();
            if slot.inflight.as_ref().is_some_and(|(current, _)| *current == seq) {
                slot.inflight = None;
                self.state.send_modify(|state| state.deleting = false);
            }
        }

        match result {
            Ok(ActionResult::Success) => ActionOutcome::succeeded(&self.messages.deleted),
            Ok(ActionResult::Failure { error }) => ActionOutcome::failed(
                error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| self.messages.delete_failed.clone()),
            ),
            Err(TransportError::Cancelled) => ActionOutcome::aborted(&self.messages.cancelled),
            Err(TransportError::Failed(error)) => {
                warn!(seq, %id, error = %format!("{error:#}"), "delete failed");
                ActionOutcome::failed(&self.messages.delete_unexpected_error)
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, DeleteSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/dialogs_tests.rs"]
mod tests;
