use std::collections::BTreeMap;

use crate::view_model::{
    AppViewModel, HistoryRowView, JobRowView, ProfileView, PromptRowView, StatusIndicator,
};
use crate::{
    DocumentInfo, DocumentReceipt, HistoryEntry, JobId, JobRegistry, PollScheduler, PollSettings,
    Principal, Prompt, PromptId, SessionEpoch, SessionState,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    registry: JobRegistry,
    scheduler: PollScheduler,
    session: SessionState,
    epoch: SessionEpoch,
    /// Credential being validated by an in-flight restore.
    restoring_credential: Option<String>,
    prompts: BTreeMap<PromptId, Prompt>,
    prompts_loaded: bool,
    profile_loaded: bool,
    history: Vec<HistoryEntry>,
    history_loaded: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_settings(settings: PollSettings) -> Self {
        Self {
            scheduler: PollScheduler::new(settings),
            ..Self::default()
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Bumped on every session transition.
    pub fn session_epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn prompts(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.values()
    }

    pub fn prompt(&self, id: PromptId) -> Option<&Prompt> {
        self.prompts.get(&id)
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn view(&self) -> AppViewModel {
        let prompts = self
            .prompts
            .values()
            .map(|prompt| {
                let job = self.registry.job_for_owner(prompt.id);
                PromptRowView {
                    id: prompt.id,
                    name: prompt.name.clone(),
                    prompt: prompt.prompt.clone(),
                    document: job
                        .map(|job| job.filename.clone())
                        .or_else(|| prompt.document.as_ref().map(|doc| doc.filename.clone())),
                    indicator: job.map(|job| StatusIndicator::for_status(job.status)),
                }
            })
            .collect();
        let jobs = self
            .registry
            .jobs()
            .map(|job| JobRowView {
                job_id: job.job_id.clone(),
                owner_id: job.owner_id,
                filename: job.filename.clone(),
                status: job.status,
                indicator: StatusIndicator::for_status(job.status),
                message: job.message.clone(),
            })
            .collect();
        let history = self
            .history
            .iter()
            .map(|entry| HistoryRowView {
                id: entry.id,
                prompt_id: entry.prompt_id,
                prompt_name: self.prompts.get(&entry.prompt_id).map(|p| p.name.clone()),
                conversation: entry.conversation.clone(),
                created_at: entry.created_at,
            })
            .collect();

        AppViewModel {
            session: self.session.label(),
            signed_in: self.session.is_authenticated(),
            auth_pending: self.session.is_authenticating(),
            user: self.session.principal().map(|p| p.name.clone()),
            polling: self.scheduler.is_running(),
            prompts_loaded: self.prompts_loaded,
            prompts,
            jobs,
            profile: self.session.principal().map(|p| ProfileView {
                name: p.name.clone(),
                email: p.email.clone(),
                phone: p.phone.clone(),
            }),
            profile_loaded: self.profile_loaded,
            history,
            history_loaded: self.history_loaded,
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn registry_mut(&mut self) -> &mut JobRegistry {
        &mut self.registry
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut PollScheduler {
        &mut self.scheduler
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        self.session = session;
        self.epoch = self.epoch.wrapping_add(1);
        self.dirty = true;
    }

    /// Swaps in fresh account details for the signed-in user without
    /// starting a new session. Returns `false` if `principal` is not the
    /// signed-in user.
    pub(crate) fn replace_principal(&mut self, fresh: Principal) -> bool {
        match &mut self.session {
            SessionState::Authenticated { principal, .. } if principal.id == fresh.id => {
                *principal = fresh;
                self.profile_loaded = true;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn replace_history(&mut self, mut entries: Vec<HistoryEntry>) {
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        self.history = entries;
        self.history_loaded = true;
        self.dirty = true;
    }

    pub(crate) fn set_restoring_credential(&mut self, credential: Option<String>) {
        self.restoring_credential = credential;
    }

    pub(crate) fn take_restoring_credential(&mut self) -> Option<String> {
        self.restoring_credential.take()
    }

    pub(crate) fn replace_prompts(&mut self, prompts: Vec<Prompt>) {
        self.prompts = prompts.into_iter().map(|p| (p.id, p)).collect();
        self.prompts_loaded = true;
        self.dirty = true;
    }

    pub(crate) fn upsert_prompt(&mut self, prompt: Prompt) {
        self.prompts.insert(prompt.id, prompt);
        self.dirty = true;
    }

    pub(crate) fn remove_prompt(&mut self, id: PromptId) {
        self.prompts.remove(&id);
        self.dirty = true;
    }

    pub(crate) fn attach_document(&mut self, receipt: &DocumentReceipt) {
        if let Some(prompt) = self.prompts.get_mut(&receipt.owner_id) {
            prompt.document = Some(DocumentInfo {
                job_id: receipt.job_id.clone(),
                filename: receipt.filename.clone(),
                book_reference: receipt.book_reference.clone(),
            });
        }
    }

    pub(crate) fn detach_document(&mut self, job_id: &JobId) {
        for prompt in self.prompts.values_mut() {
            if prompt
                .document
                .as_ref()
                .is_some_and(|doc| &doc.job_id == job_id)
            {
                prompt.document = None;
            }
        }
    }

    /// Drops everything that belongs to the signed-in user.
    pub(crate) fn clear_user_data(&mut self) {
        self.registry.clear();
        self.prompts.clear();
        self.prompts_loaded = false;
        self.profile_loaded = false;
        self.history.clear();
        self.history_loaded = false;
        self.restoring_credential = None;
        self.dirty = true;
    }
}
