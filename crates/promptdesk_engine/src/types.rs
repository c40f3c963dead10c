use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use promptdesk_core::{
    DocumentInfo, DocumentReceipt, HistoryEntry, JobId, JobStatus, Principal, ProfileUpdate,
    Prompt, Registration, StatusReport,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    /// The response arrived but its body did not match the expected shape.
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// `GET /documents/{jobId}/status`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StatusPayload {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusPayload {
    /// Unrecognised status strings become an `error` report.
    pub fn into_report(self) -> StatusReport {
        match JobStatus::parse(&self.status) {
            Some(status) => StatusReport {
                status,
                message: self.message,
            },
            None => StatusReport::error(format!("unrecognised job status '{}'", self.status)),
        }
    }
}

/// `POST /documents`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReceiptPayload {
    pub job_id: String,
    pub owner_id: i64,
    pub filename: String,
    pub book_reference: String,
}

impl From<ReceiptPayload> for DocumentReceipt {
    fn from(payload: ReceiptPayload) -> Self {
        Self {
            job_id: JobId::new(payload.job_id),
            owner_id: payload.owner_id,
            filename: payload.filename,
            book_reference: payload.book_reference,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentPayload {
    pub job_id: String,
    pub filename: String,
    pub book_reference: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PromptPayload {
    pub id: i64,
    pub name: String,
    pub prompt: String,
    #[serde(default, alias = "pdf_book")]
    pub document: Option<DocumentPayload>,
}

impl From<PromptPayload> for Prompt {
    fn from(payload: PromptPayload) -> Self {
        Self {
            id: payload.id,
            name: payload.name,
            prompt: payload.prompt,
            document: payload.document.map(|doc| DocumentInfo {
                job_id: JobId::new(doc.job_id),
                filename: doc.filename,
                book_reference: doc.book_reference,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PromptCreateBody<'a> {
    pub name: &'a str,
    pub prompt: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PromptUpdateBody<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PrincipalPayload {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl From<PrincipalPayload> for Principal {
    fn from(payload: PrincipalPayload) -> Self {
        Self {
            id: payload.id,
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
        }
    }
}

/// `POST /token`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenPayload {
    pub access_token: String,
}

/// `POST /register`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub email: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    pub password: &'a str,
}

impl<'a> From<&'a Registration> for RegisterBody<'a> {
    fn from(registration: &'a Registration) -> Self {
        Self {
            email: &registration.email,
            name: &registration.name,
            phone: registration.phone.as_deref(),
            password: &registration.password,
        }
    }
}

/// `PUT /users/profile`; omitted fields stay unchanged on the server.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProfileUpdateBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
}

impl<'a> From<&'a ProfileUpdate> for ProfileUpdateBody<'a> {
    fn from(changes: &'a ProfileUpdate) -> Self {
        Self {
            name: changes.name.as_deref(),
            email: changes.email.as_deref(),
            phone: changes.phone.as_deref(),
        }
    }
}

/// `PUT /users/change-password`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct PasswordChangeBody<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// `GET /history`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HistoryPayload {
    pub id: i64,
    pub prompt_id: i64,
    pub conversation: String,
    pub created_at: String,
}

impl HistoryPayload {
    pub fn into_entry(self) -> Result<HistoryEntry, ApiError> {
        let created_at = parse_timestamp(&self.created_at).ok_or_else(|| {
            ApiError::new(
                FailureKind::Decode,
                format!("history entry {} has timestamp '{}'", self.id, self.created_at),
            )
        })?;
        Ok(HistoryEntry {
            id: self.id,
            prompt_id: self.prompt_id,
            conversation: self.conversation,
            created_at,
        })
    }
}

/// RFC 3339, or a timestamp without offset which the server writes in UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Error bodies carry either FastAPI's `detail` or a plain `message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(detail)) => Some(detail),
            Some(other) if !other.is_null() => Some(other.to_string()),
            _ => self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::parse_timestamp;

    #[test]
    fn timestamps_with_and_without_offset_parse() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-05-01T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T10:30:00"), Some(expected));
        assert!(parse_timestamp("2024-05-01T10:30:00.123456").is_some());
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
