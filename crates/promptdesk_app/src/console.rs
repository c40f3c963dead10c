use promptdesk_core::{AppViewModel, Notification, PromptId, StatusIndicator};
use promptdesk_engine::NotificationSink;
use promptdesk_logging::desk_debug;
use tokio::sync::mpsc;

/// Prints toasts to the terminal and forwards them to the running command.
pub struct ConsoleNotificationSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ConsoleNotificationSink {
    pub fn new(tx: mpsc::UnboundedSender<Notification>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ConsoleNotificationSink {
    fn notify(&self, notification: &Notification) {
        match notification {
            Notification::JobFailed { .. }
            | Notification::UploadFailed { .. }
            | Notification::PromptActionFailed { .. }
            | Notification::LoginFailed { .. }
            | Notification::LoginRejected { .. }
            | Notification::AccountActionFailed { .. } => eprintln!("{}", describe(notification)),
            _ => println!("{}", describe(notification)),
        }
        if self.tx.send(notification.clone()).is_err() {
            desk_debug!("no listener for {:?}", notification);
        }
    }
}

pub fn describe(notification: &Notification) -> String {
    match notification {
        Notification::JobCompleted { job_id, owner_id } => {
            format!("Document {job_id} for prompt {owner_id} is ready")
        }
        Notification::JobFailed { job_id, message } => {
            format!("Document {job_id} failed: {message}")
        }
        Notification::UploadAccepted { job_id } => format!("Upload accepted as job {job_id}"),
        Notification::UploadFailed { message } => format!("Upload failed: {message}"),
        Notification::DocumentDeleted { job_id } => format!("Document {job_id} deleted"),
        Notification::PromptSaved { id } => format!("Prompt {id} saved"),
        Notification::PromptDeleted { id } => format!("Prompt {id} deleted"),
        Notification::PromptActionFailed { message } => format!("Prompt action failed: {message}"),
        Notification::LoginFailed { message } => format!("Login failed: {message}"),
        Notification::LoginRejected { message } => format!("Login rejected: {message}"),
        Notification::Registered { email } => {
            format!("Registered {email}; sign in with `promptdesk login {email}`")
        }
        Notification::ProfileUpdated => "Profile updated".to_string(),
        Notification::PasswordChanged => "Password changed".to_string(),
        Notification::AccountActionFailed { message } => format!("Account action failed: {message}"),
    }
}

fn indicator_label(indicator: Option<StatusIndicator>) -> &'static str {
    match indicator {
        Some(StatusIndicator::Spinner) => "[..]",
        Some(StatusIndicator::Done) => "[ok]",
        Some(StatusIndicator::Alert) => "[!!]",
        None => "    ",
    }
}

pub fn render_prompts(view: &AppViewModel) -> String {
    if view.prompts.is_empty() {
        return "No prompts.\n".to_string();
    }
    let mut out = String::new();
    for row in &view.prompts {
        out.push_str(&format!(
            "{} {:>5}  {}\n",
            indicator_label(row.indicator),
            row.id,
            row.name
        ));
        if let Some(document) = &row.document {
            out.push_str(&format!("            document: {document}\n"));
        }
        if let Some(job) = view.jobs.iter().find(|job| job.owner_id == row.id) {
            match &job.message {
                Some(message) => out.push_str(&format!(
                    "            job {} {}: {}\n",
                    job.job_id,
                    job.status.as_str(),
                    message
                )),
                None => out.push_str(&format!(
                    "            job {} {}\n",
                    job.job_id,
                    job.status.as_str()
                )),
            }
        }
    }
    out
}

pub fn render_profile(view: &AppViewModel) -> String {
    match &view.profile {
        Some(profile) => format!(
            "name:  {}\nemail: {}\nphone: {}\n",
            profile.name,
            profile.email,
            profile.phone.as_deref().unwrap_or("-")
        ),
        None => "Not signed in.\n".to_string(),
    }
}

pub fn render_history(view: &AppViewModel, prompt: Option<PromptId>) -> String {
    let rows: Vec<_> = view
        .history
        .iter()
        .filter(|row| prompt.map_or(true, |id| row.prompt_id == id))
        .collect();
    if rows.is_empty() {
        return "No learning history.\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let label = match &row.prompt_name {
            Some(name) => format!("{} ({})", name, row.prompt_id),
            None => format!("prompt {}", row.prompt_id),
        };
        out.push_str(&format!(
            "{}  {}\n",
            row.created_at.format("%Y-%m-%d %H:%M"),
            label
        ));
        for line in row.conversation.lines() {
            out.push_str(&format!("    {line}\n"));
        }
    }
    out
}
