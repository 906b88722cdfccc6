//! Client-side controller for remotely backed, paginated, sortable and
//! searchable collection views.

pub mod columns;
pub mod config;
pub mod controller;
pub mod dialogs;
pub mod error;
pub mod notify;
pub mod transport;
pub mod view_state;

pub use config::{load_settings, ControllerSettings, Messages};
pub use controller::{CollectionController, RequestTag};
pub use error::{ActionOutcome, FailureKind, FetchFailure, FetchOutcome, TransportError};
pub use notify::{LogNotifier, Notifier, Toast, ToastLevel, ToastQueue};
pub use transport::{CollectionTransport, DeleteTransport, HttpCollectionTransport};
pub use view_state::{Seed, ViewState};

/// Controller over the user directory rows served by the bundled backend.
pub type UsersTable = CollectionController<shared::domain::UserRecord>;

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod transport_tests;
