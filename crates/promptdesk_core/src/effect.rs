use std::time::Duration;

use crate::{
    DocumentUpload, JobId, PasswordChange, ProfileUpdate, PromptDraft, PromptId, Registration,
    TimerId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the recurring poll timer; any other timer must already be cancelled.
    StartTimer { timer: TimerId, period: Duration },
    CancelTimer { timer: TimerId },
    FetchStatus { job_id: JobId },
    /// Pull authoritative prompt data from the CRUD boundary.
    RefreshEntities,
    Notify(Notification),
    UploadDocument(DocumentUpload),
    DeleteDocument { job_id: JobId },
    CreatePrompt(PromptDraft),
    UpdatePrompt { id: PromptId, prompt: String },
    DeletePrompt { id: PromptId },
    RestoreSession { token: String },
    Login { email: String, password: String },
    /// Persist and start using the credential.
    StoreCredential { token: String },
    /// Start using an already persisted credential.
    ActivateCredential { token: String },
    DiscardCredential,
    Register(Registration),
    FetchProfile,
    UpdateProfile(ProfileUpdate),
    ChangePassword(PasswordChange),
    FetchHistory,
}

/// User-visible outcomes, rendered as toasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    JobCompleted { job_id: JobId, owner_id: PromptId },
    JobFailed { job_id: JobId, message: String },
    UploadAccepted { job_id: JobId },
    UploadFailed { message: String },
    DocumentDeleted { job_id: JobId },
    PromptSaved { id: PromptId },
    PromptDeleted { id: PromptId },
    PromptActionFailed { message: String },
    LoginFailed { message: String },
    /// A login was requested while signed in or while another attempt was
    /// still in flight.
    LoginRejected { message: String },
    Registered { email: String },
    ProfileUpdated,
    PasswordChanged,
    AccountActionFailed { message: String },
}
