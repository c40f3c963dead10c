use std::fmt;

use chrono::{DateTime, Utc};

pub type PromptId = i64;

/// Opaque job identifier assigned by the document service at upload time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for JobId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Processing,
    Complete,
    Error,
}

impl JobStatus {
    /// `Complete` and `Error` never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "complete" => Some(JobStatus::Complete),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Complete => "complete",
            JobStatus::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a job's status, either fetched or synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    pub message: Option<String>,
}

impl StatusReport {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub job_id: JobId,
    pub owner_id: PromptId,
    pub filename: String,
    pub book_reference: String,
    pub status: JobStatus,
    /// Only populated while `status` is `Error`.
    pub message: Option<String>,
    /// Diagnostics only.
    pub last_observed_at: Option<DateTime<Utc>>,
    /// Status requests issued for this job so far.
    pub polls: u32,
    /// A status request is outstanding; the next pass skips this job.
    pub in_flight: bool,
}

impl Job {
    /// A freshly accepted upload, waiting for its first status poll.
    pub fn queued(receipt: &DocumentReceipt) -> Self {
        Self {
            job_id: receipt.job_id.clone(),
            owner_id: receipt.owner_id,
            filename: receipt.filename.clone(),
            book_reference: receipt.book_reference.clone(),
            status: JobStatus::Queued,
            message: None,
            last_observed_at: None,
            polls: 0,
            in_flight: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Document metadata as the prompt endpoint reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub job_id: JobId,
    pub filename: String,
    pub book_reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub id: PromptId,
    pub name: String,
    pub prompt: String,
    pub document: Option<DocumentInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDraft {
    pub name: String,
    pub prompt: String,
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A document the user wants attached to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub owner_id: PromptId,
    pub filename: String,
    pub book_reference: String,
    pub bytes: Vec<u8>,
}

/// What the document service returns for an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReceipt {
    pub job_id: JobId,
    pub owner_id: PromptId,
    pub filename: String,
    pub book_reference: String,
}

/// A new account, as submitted on the sign-up form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// Partial profile edit; `None` leaves the field as it is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// An empty string clears the stored phone number.
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// One recorded tutoring conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: i64,
    pub prompt_id: PromptId,
    pub conversation: String,
    pub created_at: DateTime<Utc>,
}
