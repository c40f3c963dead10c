use chrono::{DateTime, Utc};

use crate::{
    DocumentReceipt, DocumentUpload, HistoryEntry, JobId, PasswordChange, Principal,
    ProfileUpdate, Prompt, PromptDraft, PromptId, Registration, SessionEpoch, StatusReport,
    TimerId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The poll timer fired.
    Tick { timer: TimerId, at: DateTime<Utc> },
    /// A status request resolved (successfully or with a synthesized error).
    StatusFetched {
        job_id: JobId,
        report: StatusReport,
        at: DateTime<Utc>,
    },
    /// The owning view is going away; stop the timer.
    StopPolling,

    UploadRequested(DocumentUpload),
    UploadSucceeded(DocumentReceipt),
    UploadFailed { message: String },
    DeleteDocumentRequested { job_id: JobId },
    DocumentDeleted { job_id: JobId },
    DocumentDeleteFailed { job_id: JobId, message: String },

    /// Authoritative prompt list from the CRUD boundary.
    EntitiesRefreshed(Vec<Prompt>),
    EntitiesRefreshFailed { message: String },
    PromptCreateRequested(PromptDraft),
    PromptUpdateRequested { id: PromptId, prompt: String },
    PromptDeleteRequested { id: PromptId },
    PromptSaved(Prompt),
    PromptDeleted { id: PromptId },
    PromptActionFailed { message: String },

    /// Startup: restore from the persisted credential, if any.
    RestoreRequested { credential: Option<String> },
    SessionRestored { principal: Principal },
    SessionRestoreFailed,
    LoginRequested { email: String, password: String },
    LoginSucceeded { principal: Principal, token: String },
    LoginFailed { message: String },
    LogoutRequested,

    RegisterRequested(Registration),
    Registered { principal: Principal },
    ProfileRequested,
    ProfileLoaded(Principal),
    ProfileUpdateRequested(ProfileUpdate),
    ProfileUpdated(Principal),
    PasswordChangeRequested(PasswordChange),
    PasswordChanged,
    HistoryRequested,
    HistoryLoaded(Vec<HistoryEntry>),
    AccountActionFailed { message: String },

    /// A request reply tagged with the session epoch it was issued under.
    SessionReply { epoch: SessionEpoch, reply: Box<Msg> },

    NoOp,
}
