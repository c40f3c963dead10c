mod cli;
mod config;
mod console;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use promptdesk_core::{
    AppState, AppViewModel, DocumentUpload, JobId, Msg, Notification, PasswordChange,
    ProfileUpdate, PromptDraft, Registration,
};
use promptdesk_engine::{ApiClient, CredentialStore, Driver, DriverHandle, FileCredentialStore};
use promptdesk_logging::{desk_debug, desk_info, LogDestination};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::console::{render_history, render_profile, render_prompts, ConsoleNotificationSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    let destination = match cli.log.as_deref() {
        Some(raw) => LogDestination::parse(raw)
            .ok_or_else(|| anyhow!("unknown log destination '{raw}'"))?,
        None => config.log_destination(),
    };
    promptdesk_logging::initialize(destination, config.log_level(), None);
    desk_info!("using {}", config.api_url);

    let backend = Arc::new(ApiClient::new(config.api_settings()).context("building HTTP client")?);
    let credentials: Arc<dyn CredentialStore> =
        Arc::new(FileCredentialStore::new(&config.credential_path));
    let (notes_tx, notes) = mpsc::unbounded_channel();
    let sink = Arc::new(ConsoleNotificationSink::new(notes_tx));

    let mut driver = Driver::new(
        AppState::with_poll_settings(config.poll_settings()),
        backend,
        credentials.clone(),
        sink,
    );
    let mut session = Session {
        handle: driver.handle(),
        view: driver.subscribe(),
        notes,
        reply_window: config.api_settings().request_timeout + Duration::from_secs(5),
    };
    driver.restore_session();
    let running = tokio::spawn(driver.run());

    let interrupt = session.handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            desk_info!("interrupted");
            interrupt.shutdown();
        }
    });

    let outcome = session.settle().await;
    let outcome = match outcome {
        Ok(()) => run_command(cli.command, &mut session, credentials.as_ref()).await,
        Err(err) => Err(err),
    };

    session.handle.shutdown();
    let state = running.await.context("driver task failed")?;
    desk_debug!("{} job(s) tracked at exit", state.registry().len());
    outcome
}

/// The command's view of the running driver.
struct Session {
    handle: DriverHandle,
    view: watch::Receiver<AppViewModel>,
    notes: mpsc::UnboundedReceiver<Notification>,
    reply_window: Duration,
}

impl Session {
    /// Waits until no restore or login is in flight.
    async fn settle(&mut self) -> anyhow::Result<()> {
        let wait = self.view.wait_for(|view| !view.auth_pending);
        timeout(self.reply_window, wait)
            .await
            .context("timed out restoring the session")?
            .context("client stopped")?;
        Ok(())
    }

    fn send(&self, msg: Msg) -> anyhow::Result<()> {
        if self.handle.dispatch(msg) {
            Ok(())
        } else {
            bail!("client stopped")
        }
    }

    fn current(&self) -> AppViewModel {
        self.view.borrow().clone()
    }

    fn require_sign_in(&self) -> anyhow::Result<()> {
        if self.view.borrow().signed_in {
            Ok(())
        } else {
            bail!("not signed in; run `promptdesk login <email>` first")
        }
    }

    /// Waits for the first notification `pick` maps to an outcome.
    async fn next_outcome<T, F>(&mut self, window: Option<Duration>, mut pick: F) -> anyhow::Result<T>
    where
        F: FnMut(&Notification) -> Option<anyhow::Result<T>>,
    {
        let notes = &mut self.notes;
        let wait = async move {
            while let Some(note) = notes.recv().await {
                if let Some(outcome) = pick(&note) {
                    return outcome;
                }
            }
            Err(anyhow!("client stopped"))
        };
        match window {
            Some(window) => timeout(window, wait)
                .await
                .context("timed out waiting for the server")?,
            None => wait.await,
        }
    }

    /// Waits until `ready` holds for the view or `failure` recognises a
    /// toast as the fetch failing.
    async fn loaded<R, F>(&mut self, what: &str, ready: R, failure: F) -> anyhow::Result<AppViewModel>
    where
        R: FnMut(&AppViewModel) -> bool,
        F: Fn(&Notification) -> Option<String>,
    {
        let window = self.reply_window;
        let view = &mut self.view;
        let notes = &mut self.notes;
        let wait = async move {
            tokio::select! {
                loaded = view.wait_for(ready) => {
                    loaded.map(|view| view.clone()).context("client stopped")
                }
                failed = async {
                    while let Some(note) = notes.recv().await {
                        if let Some(message) = failure(&note) {
                            return anyhow!("could not load {what}: {message}");
                        }
                    }
                    anyhow!("client stopped")
                } => Err(failed),
            }
        };
        timeout(window, wait)
            .await
            .with_context(|| format!("timed out loading {what}"))?
    }
}

async fn run_command(
    command: Command,
    session: &mut Session,
    credentials: &dyn CredentialStore,
) -> anyhow::Result<()> {
    if command.needs_session() {
        session.require_sign_in()?;
    }
    let window = Some(session.reply_window);

    match command {
        Command::Login { email, password } => {
            if let Some(user) = session.current().user {
                bail!("already signed in as {user}; run `promptdesk logout` first");
            }
            let password = password_or_env(password, "PROMPTDESK_PASSWORD", "--password")?;
            session.send(Msg::LoginRequested { email, password })?;
            let view = &mut session.view;
            let notes = &mut session.notes;
            let wait = async move {
                tokio::select! {
                    signed_in = view.wait_for(|view| view.signed_in) => {
                        signed_in.map(|view| view.user.clone()).context("client stopped")
                    }
                    failed = async {
                        while let Some(note) = notes.recv().await {
                            match note {
                                Notification::LoginFailed { message } => {
                                    return anyhow!("login failed: {message}");
                                }
                                Notification::LoginRejected { message } => {
                                    return anyhow!("login rejected: {message}");
                                }
                                _ => {}
                            }
                        }
                        anyhow!("client stopped")
                    } => Err(failed),
                }
            };
            let user = timeout(session.reply_window, wait)
                .await
                .context("timed out signing in")??;
            println!("Signed in as {}", user.unwrap_or_default());
        }

        Command::Logout => {
            if session.current().signed_in {
                session.send(Msg::LogoutRequested)?;
                session
                    .view
                    .wait_for(|view| !view.signed_in)
                    .await
                    .context("client stopped")?;
            } else {
                credentials.clear()?;
            }
            println!("Signed out");
        }

        Command::Whoami => {
            let view = session.current();
            println!("{}", view.user.unwrap_or_default());
        }

        Command::Prompts => {
            let view = session
                .loaded("prompts", |view| view.prompts_loaded, |note| match note {
                    Notification::PromptActionFailed { message } => Some(message.clone()),
                    _ => None,
                })
                .await?;
            print!("{}", render_prompts(&view));
        }

        Command::Create { name, prompt } => {
            session.send(Msg::PromptCreateRequested(PromptDraft { name, prompt }))?;
            session.next_outcome(window, prompt_outcome).await?;
        }

        Command::Edit { id, prompt } => {
            session.send(Msg::PromptUpdateRequested { id, prompt })?;
            session.next_outcome(window, prompt_outcome).await?;
        }

        Command::Delete { id } => {
            session.send(Msg::PromptDeleteRequested { id })?;
            session.next_outcome(window, prompt_outcome).await?;
        }

        Command::Upload {
            id,
            file,
            reference,
            no_wait,
        } => {
            let upload = read_upload(id, &file, reference).await?;
            session.send(Msg::UploadRequested(upload))?;

            let job_id = session
                .next_outcome(window, |note| match note {
                    Notification::UploadAccepted { job_id } => Some(Ok(job_id.clone())),
                    Notification::UploadFailed { message } => {
                        Some(Err(anyhow!("upload failed: {message}")))
                    }
                    _ => None,
                })
                .await?;
            if no_wait {
                return Ok(());
            }

            // Processing is bounded by the poll budget, not by a request window.
            session
                .next_outcome(None, |note| match note {
                    Notification::JobCompleted { job_id: done, .. } if *done == job_id => {
                        Some(Ok(()))
                    }
                    Notification::JobFailed {
                        job_id: failed,
                        message,
                    } if *failed == job_id => Some(Err(anyhow!("processing failed: {message}"))),
                    _ => None,
                })
                .await?;
        }

        Command::DeleteDocument { job_id } => {
            let job_id = JobId::new(job_id);
            session.send(Msg::DeleteDocumentRequested {
                job_id: job_id.clone(),
            })?;
            session
                .next_outcome(window, |note| match note {
                    Notification::DocumentDeleted { job_id: deleted } if *deleted == job_id => {
                        Some(Ok(()))
                    }
                    Notification::PromptActionFailed { message } => {
                        Some(Err(anyhow!("could not delete document: {message}")))
                    }
                    _ => None,
                })
                .await?;
        }

        Command::Register {
            email,
            name,
            phone,
            password,
        } => {
            if let Some(user) = session.current().user {
                bail!("signed in as {user}; run `promptdesk logout` before registering");
            }
            let password = password_or_env(password, "PROMPTDESK_PASSWORD", "--password")?;
            session.send(Msg::RegisterRequested(Registration {
                name,
                email,
                phone,
                password,
            }))?;
            session
                .next_outcome(window, |note| match note {
                    Notification::Registered { .. } => Some(Ok(())),
                    Notification::AccountActionFailed { message } => {
                        Some(Err(anyhow!("registration failed: {message}")))
                    }
                    _ => None,
                })
                .await?;
        }

        Command::Profile { name, email, phone } => {
            let changes = ProfileUpdate { name, email, phone };
            let view = if changes.is_empty() {
                session.send(Msg::ProfileRequested)?;
                session
                    .loaded("profile", |view| view.profile_loaded, account_failure)
                    .await?
            } else {
                session.send(Msg::ProfileUpdateRequested(changes))?;
                session
                    .next_outcome(window, |note| match note {
                        Notification::ProfileUpdated => Some(Ok(())),
                        Notification::AccountActionFailed { message } => {
                            Some(Err(anyhow!("{message}")))
                        }
                        _ => None,
                    })
                    .await?;
                session.current()
            };
            print!("{}", render_profile(&view));
        }

        Command::Passwd { current, new } => {
            let current = password_or_env(current, "PROMPTDESK_PASSWORD", "--current")?;
            let new = password_or_env(new, "PROMPTDESK_NEW_PASSWORD", "--new")?;
            session.send(Msg::PasswordChangeRequested(PasswordChange {
                current_password: current,
                new_password: new,
            }))?;
            session
                .next_outcome(window, |note| match note {
                    Notification::PasswordChanged => Some(Ok(())),
                    Notification::AccountActionFailed { message } => {
                        Some(Err(anyhow!("{message}")))
                    }
                    _ => None,
                })
                .await?;
        }

        Command::History { prompt } => {
            session.send(Msg::HistoryRequested)?;
            let view = session
                .loaded("history", |view| view.history_loaded, account_failure)
                .await?;
            print!("{}", render_history(&view, prompt));
        }
    }
    Ok(())
}

fn account_failure(note: &Notification) -> Option<String> {
    match note {
        Notification::AccountActionFailed { message } => Some(message.clone()),
        _ => None,
    }
}

fn password_or_env(given: Option<String>, var: &str, flag: &str) -> anyhow::Result<String> {
    match given {
        Some(password) => Ok(password),
        None => std::env::var(var).with_context(|| format!("pass {flag} or set {var}")),
    }
}

fn prompt_outcome(note: &Notification) -> Option<anyhow::Result<()>> {
    match note {
        Notification::PromptSaved { .. } | Notification::PromptDeleted { .. } => Some(Ok(())),
        Notification::PromptActionFailed { message } => Some(Err(anyhow!("{message}"))),
        _ => None,
    }
}

async fn read_upload(
    owner_id: i64,
    file: &Path,
    reference: Option<String>,
) -> anyhow::Result<DocumentUpload> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", file.display()))?;
    let book_reference = reference.unwrap_or_else(|| filename.clone());
    Ok(DocumentUpload {
        owner_id,
        filename,
        book_reference,
        bytes,
    })
}
