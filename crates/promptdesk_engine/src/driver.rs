//! The event loop: every `Msg` goes through one loop that owns the
//! `AppState`, so state mutation is serialised even though requests run as
//! concurrent tasks. Request tasks report back through the same channel,
//! tagged with the session epoch they were issued under.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use promptdesk_core::{update, AppState, AppViewModel, Effect, Msg};
use promptdesk_logging::{desk_debug, desk_error, desk_info};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::{ApiError, Backend, CredentialStore, NotificationSink, PollTimer};

/// Cloneable entry point for feeding the driver from other tasks.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<Msg>,
    shutdown: CancellationToken,
}

impl DriverHandle {
    /// Returns `false` once the driver has shut down.
    pub fn dispatch(&self, msg: Msg) -> bool {
        self.tx.send(msg).is_ok()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

pub struct Driver {
    state: AppState,
    backend: Arc<dyn Backend>,
    credentials: Arc<dyn CredentialStore>,
    notifier: Arc<dyn NotificationSink>,
    timer: PollTimer,
    tx: mpsc::UnboundedSender<Msg>,
    rx: mpsc::UnboundedReceiver<Msg>,
    view_tx: watch::Sender<AppViewModel>,
    shutdown: CancellationToken,
}

impl Driver {
    pub fn new(
        state: AppState,
        backend: Arc<dyn Backend>,
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (view_tx, _) = watch::channel(state.view());
        Self {
            state,
            backend,
            credentials,
            notifier,
            timer: PollTimer::new(),
            tx,
            rx,
            view_tx,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn handle(&self) -> DriverHandle {
        DriverHandle {
            tx: self.tx.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// View updates, published whenever the state turns dirty.
    pub fn subscribe(&self) -> watch::Receiver<AppViewModel> {
        self.view_tx.subscribe()
    }

    /// Starts the session restore from the credential store. The session is
    /// already `Authenticating` when this returns if a credential was found.
    /// Must be called from within a tokio runtime.
    pub fn restore_session(&mut self) {
        let credential = self.credentials.load();
        self.dispatch(Msg::RestoreRequested { credential });
    }

    /// Processes messages until shutdown, then cancels the timer and
    /// returns the final state. Replies that arrive later are dropped.
    pub async fn run(mut self) -> AppState {
        desk_info!("driver started");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                msg = self.rx.recv() => match msg {
                    Some(msg) => self.dispatch(msg),
                    None => break,
                },
            }
        }

        self.dispatch(Msg::StopPolling);
        self.timer.cancel_active();
        self.rx.close();
        desk_info!("driver stopped");
        std::mem::take(&mut self.state)
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if self.state.consume_dirty() {
            self.view_tx.send_replace(self.state.view());
        }
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::StartTimer { timer, period } => {
                self.timer.start(timer, period, self.tx.clone());
            }
            Effect::CancelTimer { timer } => self.timer.cancel(timer),
            Effect::FetchStatus { job_id } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    let report = backend.fetch_status(&job_id).await;
                    Msg::StatusFetched {
                        job_id,
                        report,
                        at: Utc::now(),
                    }
                });
            }
            Effect::RefreshEntities => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.list_prompts().await {
                        Ok(prompts) => Msg::EntitiesRefreshed(prompts),
                        Err(err) => Msg::EntitiesRefreshFailed {
                            message: err.to_string(),
                        },
                    }
                });
            }
            Effect::Notify(notification) => self.notifier.notify(&notification),
            Effect::UploadDocument(upload) => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.upload_document(&upload).await {
                        Ok(receipt) => Msg::UploadSucceeded(receipt),
                        Err(err) => Msg::UploadFailed {
                            message: err.to_string(),
                        },
                    }
                });
            }
            Effect::DeleteDocument { job_id } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.delete_document(&job_id).await {
                        Ok(()) => Msg::DocumentDeleted { job_id },
                        Err(err) => Msg::DocumentDeleteFailed {
                            job_id,
                            message: err.to_string(),
                        },
                    }
                });
            }
            Effect::CreatePrompt(draft) => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.create_prompt(&draft).await {
                        Ok(prompt) => Msg::PromptSaved(prompt),
                        Err(err) => Msg::PromptActionFailed {
                            message: err.to_string(),
                        },
                    }
                });
            }
            Effect::UpdatePrompt { id, prompt } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.update_prompt(id, &prompt).await {
                        Ok(prompt) => Msg::PromptSaved(prompt),
                        Err(err) => Msg::PromptActionFailed {
                            message: err.to_string(),
                        },
                    }
                });
            }
            Effect::DeletePrompt { id } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.delete_prompt(id).await {
                        Ok(()) => Msg::PromptDeleted { id },
                        Err(err) => Msg::PromptActionFailed {
                            message: err.to_string(),
                        },
                    }
                });
            }
            Effect::RestoreSession { token } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.current_principal(&token).await {
                        Ok(principal) => Msg::SessionRestored { principal },
                        Err(err) => {
                            desk_debug!("session restore rejected: {}", err);
                            Msg::SessionRestoreFailed
                        }
                    }
                });
            }
            Effect::Login { email, password } => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.login(&email, &password).await {
                        Ok((principal, token)) => Msg::LoginSucceeded { principal, token },
                        Err(err) => Msg::LoginFailed {
                            message: err.message,
                        },
                    }
                });
            }
            Effect::StoreCredential { token } => {
                if let Err(err) = self.credentials.save(&token) {
                    desk_error!("Failed to store credential: {}", err);
                }
                self.backend.set_credential(Some(token));
            }
            Effect::ActivateCredential { token } => self.backend.set_credential(Some(token)),
            Effect::DiscardCredential => {
                if let Err(err) = self.credentials.clear() {
                    desk_error!("Failed to discard credential: {}", err);
                }
                self.backend.set_credential(None);
            }
            Effect::Register(registration) => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.register(&registration).await {
                        Ok(principal) => Msg::Registered { principal },
                        Err(err) => account_failed(err),
                    }
                });
            }
            Effect::FetchProfile => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.profile().await {
                        Ok(principal) => Msg::ProfileLoaded(principal),
                        Err(err) => account_failed(err),
                    }
                });
            }
            Effect::UpdateProfile(changes) => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.update_profile(&changes).await {
                        Ok(principal) => Msg::ProfileUpdated(principal),
                        Err(err) => account_failed(err),
                    }
                });
            }
            Effect::ChangePassword(change) => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.change_password(&change).await {
                        Ok(()) => Msg::PasswordChanged,
                        Err(err) => account_failed(err),
                    }
                });
            }
            Effect::FetchHistory => {
                let backend = self.backend.clone();
                self.spawn_request(async move {
                    match backend.history().await {
                        Ok(entries) => Msg::HistoryLoaded(entries),
                        Err(err) => account_failed(err),
                    }
                });
            }
        }
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        let tx = self.tx.clone();
        let epoch = self.state.session_epoch();
        tokio::spawn(async move {
            let reply = Box::new(request.await);
            if tx.send(Msg::SessionReply { epoch, reply }).is_err() {
                desk_debug!("driver gone; dropping late reply");
            }
        });
    }
}

fn account_failed(err: ApiError) -> Msg {
    Msg::AccountActionFailed {
        message: err.message,
    }
}
