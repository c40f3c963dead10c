//! Promptdesk core: pure state machine for document job tracking, sessions
//! and the prompt cache.
mod effect;
mod msg;
mod reconcile;
mod registry;
mod scheduler;
mod session;
mod state;
mod types;
mod update;
mod view_model;

pub use effect::{Effect, Notification};
pub use msg::Msg;
pub use reconcile::{reconcile, Transition};
pub use registry::JobRegistry;
pub use scheduler::{PollScheduler, PollSettings, TimerId, DEFAULT_MAX_POLLS, DEFAULT_POLL_PERIOD};
pub use session::{AuthAttempt, SessionEpoch, SessionState};
pub use state::AppState;
pub use types::{
    DocumentInfo, DocumentReceipt, DocumentUpload, HistoryEntry, Job, JobId, JobStatus,
    PasswordChange, Principal, ProfileUpdate, Prompt, PromptDraft, PromptId, Registration,
    StatusReport,
};
pub use update::update;
pub use view_model::{
    AppViewModel, HistoryRowView, JobRowView, ProfileView, PromptRowView, StatusIndicator,
};
