use std::collections::BTreeMap;

use crate::{Job, JobId, PromptId};

/// Known background jobs keyed by id. Iteration order is the `JobId` order,
/// so every pass over the registry is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobRegistry {
    jobs: BTreeMap<JobId, Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins; the stored record is replaced entirely.
    pub fn upsert(&mut self, job: Job) {
        self.jobs.insert(job.job_id.clone(), job);
    }

    pub fn get(&self, job_id: &JobId) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    /// Ids of every job still queued or processing.
    pub fn all_pending(&self) -> Vec<JobId> {
        self.jobs
            .values()
            .filter(|job| job.is_pending())
            .map(|job| job.job_id.clone())
            .collect()
    }

    pub fn remove(&mut self, job_id: &JobId) -> Option<Job> {
        self.jobs.remove(job_id)
    }

    /// Drops every job attached to `owner_id`, returning the removed ids.
    pub fn remove_owned_by(&mut self, owner_id: PromptId) -> Vec<JobId> {
        let owned: Vec<JobId> = self
            .jobs
            .values()
            .filter(|job| job.owner_id == owner_id)
            .map(|job| job.job_id.clone())
            .collect();
        for job_id in &owned {
            self.jobs.remove(job_id);
        }
        owned
    }

    /// Pending jobs with no status request outstanding.
    pub fn due_for_poll(&self) -> Vec<JobId> {
        self.jobs
            .values()
            .filter(|job| job.is_pending() && !job.in_flight)
            .map(|job| job.job_id.clone())
            .collect()
    }

    /// Counts one more status request against `job_id` and marks it
    /// outstanding.
    pub(crate) fn record_poll(&mut self, job_id: &JobId) {
        if let Some(job) = self.jobs.get_mut(job_id) {
            job.polls = job.polls.saturating_add(1);
            job.in_flight = true;
        }
    }

    /// The outstanding status request for `job_id` has answered.
    pub(crate) fn settle_poll(&mut self, job_id: &JobId) {
        if let Some(job) = self.jobs.get_mut(job_id) {
            job.in_flight = false;
        }
    }

    pub(crate) fn get_mut(&mut self, job_id: &JobId) -> Option<&mut Job> {
        self.jobs.get_mut(job_id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn job_for_owner(&self, owner_id: PromptId) -> Option<&Job> {
        self.jobs.values().find(|job| job.owner_id == owner_id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::JobRegistry;
    use crate::{DocumentReceipt, Job, JobId, JobStatus};

    fn job(id: &str, owner: i64) -> Job {
        Job::queued(&DocumentReceipt {
            job_id: JobId::from(id),
            owner_id: owner,
            filename: format!("{id}.pdf"),
            book_reference: id.to_string(),
        })
    }

    #[test]
    fn upsert_replaces_record_for_same_id() {
        let mut registry = JobRegistry::new();
        registry.upsert(job("j1", 1));
        let mut updated = job("j1", 1);
        updated.status = JobStatus::Processing;
        registry.upsert(updated);

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&JobId::from("j1")).map(|j| j.status),
            Some(JobStatus::Processing)
        );
    }

    #[test]
    fn pending_excludes_terminal_jobs() {
        let mut registry = JobRegistry::new();
        registry.upsert(job("b", 1));
        registry.upsert(job("a", 2));
        let mut done = job("c", 3);
        done.status = JobStatus::Complete;
        registry.upsert(done);

        assert_eq!(registry.all_pending(), vec![JobId::from("a"), JobId::from("b")]);
    }

    #[test]
    fn outstanding_requests_are_not_due_until_settled() {
        let mut registry = JobRegistry::new();
        registry.upsert(job("a", 1));
        registry.upsert(job("b", 2));

        registry.record_poll(&JobId::from("a"));
        assert_eq!(registry.due_for_poll(), vec![JobId::from("b")]);
        assert_eq!(registry.all_pending().len(), 2);

        registry.settle_poll(&JobId::from("a"));
        assert_eq!(registry.due_for_poll(), vec![JobId::from("a"), JobId::from("b")]);
        assert_eq!(registry.get(&JobId::from("a")).map(|j| j.polls), Some(1));
    }

    #[test]
    fn remove_owned_by_only_touches_that_owner() {
        let mut registry = JobRegistry::new();
        registry.upsert(job("a", 1));
        registry.upsert(job("b", 2));

        assert_eq!(registry.remove_owned_by(1), vec![JobId::from("a")]);
        assert!(registry.get(&JobId::from("a")).is_none());
        assert!(registry.get(&JobId::from("b")).is_some());
    }
}
