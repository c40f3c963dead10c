//! Promptdesk engine: HTTP boundary, poll timer and effect execution.
mod backend;
mod client;
mod credentials;
mod driver;
mod notify;
mod persist;
mod status;
mod timer;
mod types;

pub use backend::Backend;
pub use client::{ApiClient, ApiSettings};
pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use driver::{Driver, DriverHandle};
pub use notify::{ChannelNotificationSink, NotificationSink};
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use status::report_from_error;
pub use timer::PollTimer;
pub use types::{ApiError, FailureKind};
