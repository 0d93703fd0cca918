pub mod api;
pub mod config;
pub mod dashboard;
pub mod edit_session;
pub mod error;
pub mod notifications;
pub mod store;
pub mod transport;

pub use api::ActionsApi;
pub use config::ClientSettings;
pub use dashboard::{Dashboard, DashboardView};
pub use edit_session::{EditMode, EditSession, FormValues, SubmitOutcome};
pub use error::{normalize, ErrorKind, NormalizedError};
pub use notifications::{CloseReason, Notification, NotificationQueue, Severity};
pub use store::{ActionStore, StoreState};
pub use transport::{ActionTransport, FailedResponse, HttpTransport, TransportFailure};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
