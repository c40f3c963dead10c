use chrono::{DateTime, Utc};

use crate::{JobId, JobStatus, PromptId};

/// Icon shown next to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    Spinner,
    Done,
    Alert,
}

impl StatusIndicator {
    pub fn for_status(status: JobStatus) -> Self {
        match status {
            JobStatus::Queued | JobStatus::Processing => StatusIndicator::Spinner,
            JobStatus::Complete => StatusIndicator::Done,
            JobStatus::Error => StatusIndicator::Alert,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub session: &'static str,
    pub signed_in: bool,
    /// A restore or login is in flight.
    pub auth_pending: bool,
    pub user: Option<String>,
    pub polling: bool,
    /// The prompt list has been fetched at least once this session.
    pub prompts_loaded: bool,
    pub prompts: Vec<PromptRowView>,
    pub jobs: Vec<JobRowView>,
    pub profile: Option<ProfileView>,
    /// The profile has been fetched from the account endpoint this session.
    pub profile_loaded: bool,
    /// Newest first.
    pub history: Vec<HistoryRowView>,
    pub history_loaded: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRowView {
    pub id: i64,
    pub prompt_id: PromptId,
    /// Known only when the prompt list is loaded and still holds the prompt.
    pub prompt_name: Option<String>,
    pub conversation: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRowView {
    pub id: PromptId,
    pub name: String,
    pub prompt: String,
    pub document: Option<String>,
    /// Only present while a tracked job is attached.
    pub indicator: Option<StatusIndicator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub owner_id: PromptId,
    pub filename: String,
    pub status: JobStatus,
    pub indicator: StatusIndicator,
    pub message: Option<String>,
}
