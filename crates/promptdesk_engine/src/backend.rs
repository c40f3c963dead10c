use promptdesk_core::{
    DocumentReceipt, DocumentUpload, HistoryEntry, JobId, PasswordChange, Principal,
    ProfileUpdate, Prompt, PromptDraft, PromptId, Registration, StatusReport,
};

use crate::ApiError;

/// Everything the driver needs from the remote service.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Never fails: transport and service errors come back as an `error`
    /// report so one job cannot stall polling for the others.
    async fn fetch_status(&self, job_id: &JobId) -> StatusReport;

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<DocumentReceipt, ApiError>;

    async fn delete_document(&self, job_id: &JobId) -> Result<(), ApiError>;

    async fn list_prompts(&self) -> Result<Vec<Prompt>, ApiError>;

    async fn create_prompt(&self, draft: &PromptDraft) -> Result<Prompt, ApiError>;

    async fn update_prompt(&self, id: PromptId, prompt: &str) -> Result<Prompt, ApiError>;

    async fn delete_prompt(&self, id: PromptId) -> Result<(), ApiError>;

    /// Resolves the principal behind `token` without adopting it.
    async fn current_principal(&self, token: &str) -> Result<Principal, ApiError>;

    /// Exchanges credentials for a token and the matching principal.
    async fn login(&self, email: &str, password: &str) -> Result<(Principal, String), ApiError>;

    /// Creates an account. Does not sign in.
    async fn register(&self, registration: &Registration) -> Result<Principal, ApiError>;

    async fn profile(&self) -> Result<Principal, ApiError>;

    async fn update_profile(&self, changes: &ProfileUpdate) -> Result<Principal, ApiError>;

    async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError>;

    async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    /// Bearer token for subsequent requests; `None` signs requests out.
    fn set_credential(&self, token: Option<String>);
}
