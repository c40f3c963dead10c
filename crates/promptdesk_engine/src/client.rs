use std::sync::Mutex;
use std::time::Duration;

use promptdesk_core::{
    DocumentReceipt, DocumentUpload, HistoryEntry, JobId, PasswordChange, Principal,
    ProfileUpdate, Prompt, PromptDraft, PromptId, Registration, StatusReport,
};
use promptdesk_logging::{desk_debug, desk_trace};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::status::report_from_error;
use crate::types::{
    ErrorBody, HistoryPayload, PasswordChangeBody, PrincipalPayload, ProfileUpdateBody,
    PromptCreateBody, PromptPayload, PromptUpdateBody, ReceiptPayload, RegisterBody,
    StatusPayload, TokenPayload,
};
use crate::{ApiError, Backend, FailureKind};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// reqwest-backed [`Backend`] for the learning platform API.
#[derive(Debug)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    credential: Mutex<Option<String>>,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base} cannot be used as a base url"),
            ));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            base,
            http,
            credential: Mutex::new(None),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn bearer(&self) -> Option<String> {
        self.credential.lock().ok().and_then(|guard| guard.clone())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        desk_trace!("{} -> {}", response.url(), status);
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .into_message()
            .unwrap_or_else(|| status.to_string());
        Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            message,
        ))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        response.json::<T>().await.map_err(|err| {
            if err.is_decode() {
                ApiError::new(FailureKind::Decode, err.to_string())
            } else {
                map_reqwest_error(err)
            }
        })
    }

    pub(crate) async fn try_fetch_status(&self, job_id: &JobId) -> Result<StatusReport, ApiError> {
        let url = self.endpoint(&["documents", job_id.as_str(), "status"])?;
        let payload: StatusPayload = self.send_json(self.authorized(self.http.get(url))).await?;
        Ok(payload.into_report())
    }
}

#[async_trait::async_trait]
impl Backend for ApiClient {
    async fn fetch_status(&self, job_id: &JobId) -> StatusReport {
        match self.try_fetch_status(job_id).await {
            Ok(report) => report,
            Err(err) => report_from_error(job_id, &err),
        }
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<DocumentReceipt, ApiError> {
        let url = self.endpoint(&["documents"])?;
        let file = Part::bytes(upload.bytes.clone())
            .file_name(upload.filename.clone())
            .mime_str("application/pdf")
            .map_err(map_reqwest_error)?;
        let form = Form::new()
            .text("owner_id", upload.owner_id.to_string())
            .text("book_reference", upload.book_reference.clone())
            .part("file", file);
        desk_debug!(
            "uploading {} ({} bytes) for prompt {}",
            upload.filename,
            upload.bytes.len(),
            upload.owner_id
        );

        let payload: ReceiptPayload = self
            .send_json(self.authorized(self.http.post(url).multipart(form)))
            .await?;
        Ok(payload.into())
    }

    async fn delete_document(&self, job_id: &JobId) -> Result<(), ApiError> {
        let url = self.endpoint(&["documents", job_id.as_str()])?;
        self.send(self.authorized(self.http.delete(url))).await?;
        Ok(())
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>, ApiError> {
        let url = self.endpoint(&["prompts"])?;
        let payload: Vec<PromptPayload> =
            self.send_json(self.authorized(self.http.get(url))).await?;
        Ok(payload.into_iter().map(Prompt::from).collect())
    }

    async fn create_prompt(&self, draft: &PromptDraft) -> Result<Prompt, ApiError> {
        let url = self.endpoint(&["prompts"])?;
        let body = PromptCreateBody {
            name: &draft.name,
            prompt: &draft.prompt,
        };
        let payload: PromptPayload = self
            .send_json(self.authorized(self.http.post(url).json(&body)))
            .await?;
        Ok(payload.into())
    }

    async fn update_prompt(&self, id: PromptId, prompt: &str) -> Result<Prompt, ApiError> {
        let url = self.endpoint(&["prompts", &id.to_string()])?;
        let payload: PromptPayload = self
            .send_json(self.authorized(self.http.put(url).json(&PromptUpdateBody { prompt })))
            .await?;
        Ok(payload.into())
    }

    async fn delete_prompt(&self, id: PromptId) -> Result<(), ApiError> {
        let url = self.endpoint(&["prompts", &id.to_string()])?;
        self.send(self.authorized(self.http.delete(url))).await?;
        Ok(())
    }

    async fn current_principal(&self, token: &str) -> Result<Principal, ApiError> {
        let url = self.endpoint(&["session", "me"])?;
        let payload: PrincipalPayload = self.send_json(self.http.get(url).bearer_auth(token)).await?;
        Ok(payload.into())
    }

    async fn login(&self, email: &str, password: &str) -> Result<(Principal, String), ApiError> {
        let url = self.endpoint(&["token"])?;
        let form = Form::new()
            .text("username", email.to_string())
            .text("password", password.to_string());
        let token: TokenPayload = self.send_json(self.http.post(url).multipart(form)).await?;
        let principal = self.current_principal(&token.access_token).await?;
        Ok((principal, token.access_token))
    }

    async fn register(&self, registration: &Registration) -> Result<Principal, ApiError> {
        let url = self.endpoint(&["register"])?;
        let body = RegisterBody::from(registration);
        let payload: PrincipalPayload = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(payload.into())
    }

    async fn profile(&self) -> Result<Principal, ApiError> {
        let url = self.endpoint(&["users", "profile"])?;
        let payload: PrincipalPayload = self.send_json(self.authorized(self.http.get(url))).await?;
        Ok(payload.into())
    }

    async fn update_profile(&self, changes: &ProfileUpdate) -> Result<Principal, ApiError> {
        let url = self.endpoint(&["users", "profile"])?;
        let body = ProfileUpdateBody::from(changes);
        let payload: PrincipalPayload = self
            .send_json(self.authorized(self.http.put(url).json(&body)))
            .await?;
        Ok(payload.into())
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), ApiError> {
        let url = self.endpoint(&["users", "change-password"])?;
        let body = PasswordChangeBody {
            current_password: &change.current_password,
            new_password: &change.new_password,
        };
        self.send(self.authorized(self.http.put(url).json(&body))).await?;
        Ok(())
    }

    async fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let url = self.endpoint(&["history"])?;
        let payload: Vec<HistoryPayload> =
            self.send_json(self.authorized(self.http.get(url))).await?;
        payload.into_iter().map(HistoryPayload::into_entry).collect()
    }

    fn set_credential(&self, token: Option<String>) {
        if let Ok(mut guard) = self.credential.lock() {
            *guard = token;
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
