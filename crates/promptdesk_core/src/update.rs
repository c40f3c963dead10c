use chrono::{DateTime, Utc};
use promptdesk_logging::{desk_debug, desk_info, desk_warn};

use crate::reconcile::{reconcile, Transition};
use crate::{
    AppState, AuthAttempt, DocumentUpload, Effect, Job, JobId, Msg, Notification,
    PasswordChange, ProfileUpdate, PromptDraft, Registration, SessionState, StatusReport,
};

const POLL_TIMEOUT_MESSAGE: &str = "document processing timed out";
const SIGN_IN_REQUIRED: &str = "sign in required";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Tick { timer, at } => {
            if !state.scheduler().accepts(timer) {
                desk_debug!("dropping tick from stale timer {}", timer);
                return (state, Vec::new());
            }
            poll_pass(&mut state, at)
        }
        Msg::StatusFetched { job_id, report, at } => {
            state.registry_mut().settle_poll(&job_id);
            if !state.scheduler().is_running() {
                desk_debug!("polling stopped; discarding status for {}", job_id);
                return (state, Vec::new());
            }
            apply_report(&mut state, &job_id, report, at)
        }
        Msg::StopPolling => state.scheduler_mut().stop(),

        Msg::UploadRequested(upload) => request_upload(&state, upload),
        Msg::UploadSucceeded(receipt) => {
            if !state.session().is_authenticated() {
                desk_warn!("upload {} finished after sign-out; ignoring", receipt.job_id);
                return (state, Vec::new());
            }
            let replaced = state.registry_mut().remove_owned_by(receipt.owner_id);
            if !replaced.is_empty() {
                desk_info!(
                    "prompt {} had jobs {:?}; replaced by {}",
                    receipt.owner_id,
                    replaced,
                    receipt.job_id
                );
            }
            state.registry_mut().upsert(Job::queued(&receipt));
            state.attach_document(&receipt);
            state.mark_dirty();
            let mut effects = vec![Effect::Notify(Notification::UploadAccepted {
                job_id: receipt.job_id.clone(),
            })];
            effects.extend(state.scheduler_mut().start());
            effects
        }
        Msg::UploadFailed { message } => {
            desk_warn!("upload failed: {}", message);
            vec![Effect::Notify(Notification::UploadFailed { message })]
        }
        Msg::DeleteDocumentRequested { job_id } => {
            if state.session().is_authenticated() {
                vec![Effect::DeleteDocument { job_id }]
            } else {
                vec![prompt_failure(SIGN_IN_REQUIRED)]
            }
        }
        Msg::DocumentDeleted { job_id } => {
            state.registry_mut().remove(&job_id);
            state.detach_document(&job_id);
            state.mark_dirty();
            vec![Effect::Notify(Notification::DocumentDeleted { job_id })]
        }
        Msg::DocumentDeleteFailed { job_id, message } => {
            desk_warn!("deleting document {} failed: {}", job_id, message);
            vec![prompt_failure(message)]
        }

        Msg::EntitiesRefreshed(prompts) => {
            if state.session().is_authenticated() {
                state.replace_prompts(prompts);
            }
            Vec::new()
        }
        Msg::EntitiesRefreshFailed { message } => {
            desk_warn!("prompt refresh failed: {}", message);
            vec![prompt_failure(message)]
        }
        Msg::PromptCreateRequested(draft) => request_create(&state, draft),
        Msg::PromptUpdateRequested { id, prompt } => {
            if !state.session().is_authenticated() {
                vec![prompt_failure(SIGN_IN_REQUIRED)]
            } else if prompt.trim().is_empty() {
                vec![prompt_failure("prompt text is required")]
            } else {
                vec![Effect::UpdatePrompt {
                    id,
                    prompt: prompt.trim().to_string(),
                }]
            }
        }
        Msg::PromptDeleteRequested { id } => {
            if state.session().is_authenticated() {
                vec![Effect::DeletePrompt { id }]
            } else {
                vec![prompt_failure(SIGN_IN_REQUIRED)]
            }
        }
        Msg::PromptSaved(prompt) => {
            let id = prompt.id;
            state.upsert_prompt(prompt);
            vec![Effect::Notify(Notification::PromptSaved { id })]
        }
        Msg::PromptDeleted { id } => {
            state.remove_prompt(id);
            let dropped = state.registry_mut().remove_owned_by(id);
            if !dropped.is_empty() {
                desk_debug!("prompt {} deleted; dropped jobs {:?}", id, dropped);
            }
            vec![Effect::Notify(Notification::PromptDeleted { id })]
        }
        Msg::PromptActionFailed { message } => vec![prompt_failure(message)],

        Msg::RestoreRequested { credential } => {
            let signed_out = *state.session() == SessionState::Unauthenticated;
            match credential {
                Some(token) if signed_out => {
                    state.set_session(SessionState::Authenticating(AuthAttempt::Restore));
                    state.set_restoring_credential(Some(token.clone()));
                    vec![Effect::RestoreSession { token }]
                }
                _ => Vec::new(),
            }
        }
        Msg::SessionRestored { principal } => {
            if *state.session() != SessionState::Authenticating(AuthAttempt::Restore) {
                return (state, Vec::new());
            }
            match state.take_restoring_credential() {
                Some(token) => {
                    desk_info!("session restored for {}", principal.email);
                    state.set_session(SessionState::Authenticated {
                        principal,
                        token: token.clone(),
                    });
                    vec![
                        Effect::ActivateCredential { token },
                        Effect::RefreshEntities,
                    ]
                }
                None => {
                    state.set_session(SessionState::Unauthenticated);
                    vec![Effect::DiscardCredential]
                }
            }
        }
        Msg::SessionRestoreFailed => {
            if *state.session() != SessionState::Authenticating(AuthAttempt::Restore) {
                return (state, Vec::new());
            }
            desk_info!("stored credential rejected; continuing signed out");
            state.set_restoring_credential(None);
            state.set_session(SessionState::Unauthenticated);
            vec![Effect::DiscardCredential]
        }
        Msg::LoginRequested { email, password } => {
            let rejection = match state.session() {
                SessionState::Authenticated { .. } => Some("already signed in; sign out first"),
                SessionState::Authenticating(_) => Some("a login is already in progress"),
                SessionState::Unauthenticated => None,
            };
            if let Some(message) = rejection {
                desk_warn!("login rejected: {}", message);
                vec![Effect::Notify(Notification::LoginRejected {
                    message: message.to_string(),
                })]
            } else {
                state.set_session(SessionState::Authenticating(AuthAttempt::Login));
                vec![Effect::Login { email, password }]
            }
        }
        Msg::LoginSucceeded { principal, token } => {
            if *state.session() != SessionState::Authenticating(AuthAttempt::Login) {
                return (state, Vec::new());
            }
            desk_info!("signed in as {}", principal.email);
            state.clear_user_data();
            state.set_session(SessionState::Authenticated {
                principal,
                token: token.clone(),
            });
            vec![Effect::StoreCredential { token }, Effect::RefreshEntities]
        }
        Msg::LoginFailed { message } => {
            if *state.session() != SessionState::Authenticating(AuthAttempt::Login) {
                return (state, Vec::new());
            }
            state.clear_user_data();
            state.set_session(SessionState::Unauthenticated);
            let mut effects = state.scheduler_mut().stop();
            effects.push(Effect::Notify(Notification::LoginFailed { message }));
            effects
        }
        Msg::LogoutRequested => {
            state.clear_user_data();
            state.set_session(SessionState::Unauthenticated);
            let mut effects = state.scheduler_mut().stop();
            effects.push(Effect::DiscardCredential);
            effects
        }

        Msg::RegisterRequested(registration) => request_register(&state, registration),
        Msg::Registered { principal } => {
            desk_info!("registered {}", principal.email);
            vec![Effect::Notify(Notification::Registered {
                email: principal.email,
            })]
        }
        Msg::ProfileRequested => {
            if state.session().is_authenticated() {
                vec![Effect::FetchProfile]
            } else {
                vec![account_failure(SIGN_IN_REQUIRED)]
            }
        }
        Msg::ProfileLoaded(principal) => {
            if !state.replace_principal(principal) {
                desk_debug!("profile does not belong to the signed-in user; ignoring");
            }
            Vec::new()
        }
        Msg::ProfileUpdateRequested(changes) => request_profile_update(&state, changes),
        Msg::ProfileUpdated(principal) => {
            if state.replace_principal(principal) {
                vec![Effect::Notify(Notification::ProfileUpdated)]
            } else {
                desk_debug!("updated profile does not belong to the signed-in user; ignoring");
                Vec::new()
            }
        }
        Msg::PasswordChangeRequested(change) => request_password_change(&state, change),
        Msg::PasswordChanged => vec![Effect::Notify(Notification::PasswordChanged)],
        Msg::HistoryRequested => {
            if state.session().is_authenticated() {
                vec![Effect::FetchHistory]
            } else {
                vec![account_failure(SIGN_IN_REQUIRED)]
            }
        }
        Msg::HistoryLoaded(entries) => {
            if state.session().is_authenticated() {
                state.replace_history(entries);
            }
            Vec::new()
        }
        Msg::AccountActionFailed { message } => {
            desk_warn!("account action failed: {}", message);
            vec![account_failure(message)]
        }

        Msg::SessionReply { epoch, reply } => {
            if epoch != state.session_epoch() {
                desk_debug!(
                    "dropping reply issued in session epoch {} (now {})",
                    epoch,
                    state.session_epoch()
                );
                return (state, Vec::new());
            }
            return update(state, *reply);
        }

        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// One scheduler tick: expire over-polled jobs, then fetch every pending job
/// without an outstanding request, or stop when nothing is pending.
fn poll_pass(state: &mut AppState, at: DateTime<Utc>) -> Vec<Effect> {
    let mut effects = Vec::new();

    let pending = state.registry().all_pending();
    for job_id in &pending {
        let exhausted = state
            .registry()
            .get(job_id)
            .is_some_and(|job| state.scheduler().poll_budget_exhausted(job.polls));
        if exhausted {
            desk_warn!("job {} exceeded its poll budget", job_id);
            effects.extend(apply_report(
                state,
                job_id,
                StatusReport::error(POLL_TIMEOUT_MESSAGE),
                at,
            ));
        }
    }

    if state.registry().all_pending().is_empty() {
        effects.extend(state.scheduler_mut().stop());
        state.mark_dirty();
        return effects;
    }

    for job_id in state.registry().due_for_poll() {
        state.registry_mut().record_poll(&job_id);
        effects.push(Effect::FetchStatus { job_id });
    }
    effects
}

fn apply_report(
    state: &mut AppState,
    job_id: &JobId,
    report: StatusReport,
    at: DateTime<Utc>,
) -> Vec<Effect> {
    let transition = reconcile(state.registry_mut(), job_id, report, at);
    match transition {
        Transition::Ignored | Transition::Unchanged => Vec::new(),
        Transition::Advanced(_) => {
            state.mark_dirty();
            Vec::new()
        }
        Transition::Completed => {
            state.mark_dirty();
            let owner_id = state
                .registry()
                .get(job_id)
                .map(|job| job.owner_id)
                .unwrap_or_default();
            desk_info!("job {} complete", job_id);
            vec![
                Effect::Notify(Notification::JobCompleted {
                    job_id: job_id.clone(),
                    owner_id,
                }),
                Effect::RefreshEntities,
            ]
        }
        Transition::Failed { message } => {
            state.mark_dirty();
            desk_warn!("job {} failed: {}", job_id, message);
            vec![
                Effect::Notify(Notification::JobFailed {
                    job_id: job_id.clone(),
                    message,
                }),
                Effect::RefreshEntities,
            ]
        }
    }
}

fn request_upload(state: &AppState, upload: DocumentUpload) -> Vec<Effect> {
    let rejection = if !state.session().is_authenticated() {
        Some(SIGN_IN_REQUIRED)
    } else if upload.bytes.is_empty() {
        Some("document is empty")
    } else if upload.book_reference.trim().is_empty() {
        Some("book reference is required")
    } else {
        None
    };
    match rejection {
        Some(message) => vec![Effect::Notify(Notification::UploadFailed {
            message: message.to_string(),
        })],
        None => vec![Effect::UploadDocument(upload)],
    }
}

fn request_create(state: &AppState, draft: PromptDraft) -> Vec<Effect> {
    if !state.session().is_authenticated() {
        return vec![prompt_failure(SIGN_IN_REQUIRED)];
    }
    let name = draft.name.trim();
    let prompt = draft.prompt.trim();
    if name.is_empty() || prompt.is_empty() {
        return vec![prompt_failure("name and prompt text are required")];
    }
    vec![Effect::CreatePrompt(PromptDraft {
        name: name.to_string(),
        prompt: prompt.to_string(),
    })]
}

fn prompt_failure(message: impl Into<String>) -> Effect {
    Effect::Notify(Notification::PromptActionFailed {
        message: message.into(),
    })
}

fn request_register(state: &AppState, registration: Registration) -> Vec<Effect> {
    if *state.session() != SessionState::Unauthenticated {
        return vec![account_failure("sign out before registering a new account")];
    }
    let name = registration.name.trim();
    let email = registration.email.trim();
    if name.is_empty() {
        return vec![account_failure("name is required")];
    }
    if !email.contains('@') {
        return vec![account_failure("a valid email is required")];
    }
    if registration.password.is_empty() {
        return vec![account_failure("password is required")];
    }
    vec![Effect::Register(Registration {
        name: name.to_string(),
        email: email.to_string(),
        phone: registration
            .phone
            .map(|phone| phone.trim().to_string())
            .filter(|phone| !phone.is_empty()),
        password: registration.password,
    })]
}

fn request_profile_update(state: &AppState, changes: ProfileUpdate) -> Vec<Effect> {
    if !state.session().is_authenticated() {
        return vec![account_failure(SIGN_IN_REQUIRED)];
    }
    let changes = ProfileUpdate {
        name: changes.name.map(|name| name.trim().to_string()),
        email: changes.email.map(|email| email.trim().to_string()),
        phone: changes.phone.map(|phone| phone.trim().to_string()),
    };
    if changes.is_empty() {
        return vec![account_failure("nothing to update")];
    }
    if changes.name.as_deref().is_some_and(str::is_empty) {
        return vec![account_failure("name cannot be empty")];
    }
    if changes.email.as_deref().is_some_and(|email| !email.contains('@')) {
        return vec![account_failure("a valid email is required")];
    }
    vec![Effect::UpdateProfile(changes)]
}

fn request_password_change(state: &AppState, change: PasswordChange) -> Vec<Effect> {
    if !state.session().is_authenticated() {
        vec![account_failure(SIGN_IN_REQUIRED)]
    } else if change.current_password.is_empty() || change.new_password.is_empty() {
        vec![account_failure("current and new password are required")]
    } else if change.current_password == change.new_password {
        vec![account_failure("new password must differ from the current one")]
    } else {
        vec![Effect::ChangePassword(change)]
    }
}

fn account_failure(message: impl Into<String>) -> Effect {
    Effect::Notify(Notification::AccountActionFailed {
        message: message.into(),
    })
}
