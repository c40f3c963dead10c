#![allow(dead_code)]

use std::sync::Once;

use chrono::{DateTime, TimeZone, Utc};
use promptdesk_core::{
    update, AppState, DocumentReceipt, Effect, JobId, JobStatus, Msg, Principal, StatusReport,
    TimerId,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(promptdesk_logging::initialize_for_tests);
}

pub fn principal() -> Principal {
    Principal {
        id: 7,
        name: "Aigerim".to_string(),
        email: "aigerim@example.com".to_string(),
        phone: None,
    }
}

pub fn at(seconds: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(seconds.into())
}

/// Runs a stored-credential restore to completion.
pub fn signed_in(state: AppState) -> AppState {
    let (state, _) = update(
        state,
        Msg::RestoreRequested {
            credential: Some("stored-token".to_string()),
        },
    );
    let (state, _) = update(
        state,
        Msg::SessionRestored {
            principal: principal(),
        },
    );
    state
}

pub fn receipt(job_id: &str, owner_id: i64) -> DocumentReceipt {
    DocumentReceipt {
        job_id: JobId::from(job_id),
        owner_id,
        filename: format!("{job_id}.pdf"),
        book_reference: format!("book {job_id}"),
    }
}

pub fn uploaded(state: AppState, job_id: &str, owner_id: i64) -> (AppState, Vec<Effect>) {
    update(state, Msg::UploadSucceeded(receipt(job_id, owner_id)))
}

pub fn tick(state: AppState, timer: TimerId, second: u32) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::Tick {
            timer,
            at: at(second),
        },
    )
}

pub fn fetched(state: AppState, job_id: &str, report: StatusReport) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusFetched {
            job_id: JobId::from(job_id),
            report,
            at: at(1),
        },
    )
}

pub fn status_of(state: &AppState, job_id: &str) -> Option<JobStatus> {
    state.registry().get(&JobId::from(job_id)).map(|job| job.status)
}

pub fn notifications(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Notify(_)))
        .count()
}
