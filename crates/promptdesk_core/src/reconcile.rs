//! Merges freshly observed job statuses into the registry.
//!
//! Terminal statuses are sticky: once `Complete` or `Error` is recorded for a
//! job, later observations are discarded, so each job yields at most one
//! terminal [`Transition`].

use chrono::{DateTime, Utc};
use promptdesk_logging::desk_debug;

use crate::{JobId, JobRegistry, JobStatus, StatusReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Unknown job, or the job was already terminal.
    Ignored,
    /// Same status as before; only the observation time moved.
    Unchanged,
    /// Moved to another non-terminal status.
    Advanced(JobStatus),
    Completed,
    Failed { message: String },
}

pub fn reconcile(
    registry: &mut JobRegistry,
    job_id: &JobId,
    report: StatusReport,
    observed_at: DateTime<Utc>,
) -> Transition {
    let Some(previous) = registry.get(job_id) else {
        desk_debug!("reconcile: dropping report for unknown job {}", job_id);
        return Transition::Ignored;
    };

    if previous.status.is_terminal() {
        if report.status != previous.status {
            desk_debug!(
                "reconcile: job {} already {}, ignoring late {}",
                job_id,
                previous.status,
                report.status
            );
        }
        return Transition::Ignored;
    }

    if report.status == previous.status {
        if let Some(job) = registry.get_mut(job_id) {
            job.last_observed_at = Some(observed_at);
        }
        return Transition::Unchanged;
    }

    let mut next = previous.clone();
    next.status = report.status;
    next.last_observed_at = Some(observed_at);
    next.message = match report.status {
        JobStatus::Error => Some(
            report
                .message
                .unwrap_or_else(|| "document processing failed".to_string()),
        ),
        _ => None,
    };
    desk_debug!(
        "reconcile: job {} {} -> {}",
        job_id,
        previous.status,
        next.status
    );

    let transition = match next.status {
        JobStatus::Complete => Transition::Completed,
        JobStatus::Error => Transition::Failed {
            message: next.message.clone().unwrap_or_default(),
        },
        status => Transition::Advanced(status),
    };
    registry.upsert(next);
    transition
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{reconcile, Transition};
    use crate::{DocumentReceipt, Job, JobId, JobRegistry, JobStatus, StatusReport};

    fn registry_with(id: &str) -> JobRegistry {
        let mut registry = JobRegistry::new();
        registry.upsert(Job::queued(&DocumentReceipt {
            job_id: JobId::from(id),
            owner_id: 1,
            filename: "book.pdf".into(),
            book_reference: "book".into(),
        }));
        registry
    }

    #[test]
    fn same_status_only_touches_observation_time() {
        let mut registry = registry_with("j1");
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let id = JobId::from("j1");

        let transition = reconcile(&mut registry, &id, StatusReport::new(JobStatus::Queued), at);

        assert_eq!(transition, Transition::Unchanged);
        let job = registry.get(&id).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.last_observed_at, Some(at));
    }

    #[test]
    fn error_without_message_gets_a_default() {
        let mut registry = registry_with("j1");
        let id = JobId::from("j1");
        let report = StatusReport {
            status: JobStatus::Error,
            message: None,
        };

        let transition = reconcile(&mut registry, &id, report, Utc::now());

        assert_eq!(
            transition,
            Transition::Failed {
                message: "document processing failed".into()
            }
        );
        assert!(registry.get(&id).unwrap().message.is_some());
    }

    #[test]
    fn message_is_dropped_for_non_error_statuses() {
        let mut registry = registry_with("j1");
        let id = JobId::from("j1");
        let report = StatusReport {
            status: JobStatus::Processing,
            message: Some("page 3 of 9".into()),
        };

        reconcile(&mut registry, &id, report, Utc::now());

        assert_eq!(registry.get(&id).unwrap().message, None);
    }

    #[test]
    fn unknown_job_is_ignored() {
        let mut registry = JobRegistry::new();
        let transition = reconcile(
            &mut registry,
            &JobId::from("ghost"),
            StatusReport::new(JobStatus::Complete),
            Utc::now(),
        );
        assert_eq!(transition, Transition::Ignored);
        assert!(registry.is_empty());
    }
}
