use promptdesk_core::{JobId, StatusReport};
use promptdesk_logging::desk_warn;

use crate::ApiError;

/// A failed status request is reported as an `error` status for that job
/// alone; the poll loop keeps running for every other job.
pub fn report_from_error(job_id: &JobId, err: &ApiError) -> StatusReport {
    desk_warn!("status check for job {} failed: {}", job_id, err);
    StatusReport::error(format!("status check failed: {err}"))
}
