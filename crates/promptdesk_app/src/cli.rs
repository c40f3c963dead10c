use std::path::PathBuf;

use clap::{Parser, Subcommand};
use promptdesk_core::PromptId;

#[derive(Debug, Parser)]
#[command(name = "promptdesk", version, about = "Manage prompts and their source documents")]
pub struct Cli {
    /// Configuration file (defaults to ./promptdesk.ron when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log destination: terminal, file or both.
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and remember the session.
    Login {
        email: String,
        /// Falls back to PROMPTDESK_PASSWORD.
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// List prompts and their documents.
    Prompts,
    /// Create a prompt.
    Create { name: String, prompt: String },
    /// Replace the text of a prompt.
    Edit { id: PromptId, prompt: String },
    /// Delete a prompt together with its document.
    Delete { id: PromptId },
    /// Attach a document to a prompt and wait until it is processed.
    Upload {
        id: PromptId,
        file: PathBuf,
        /// Book reference stored with the document (defaults to the file name).
        #[arg(long)]
        reference: Option<String>,
        /// Return once the upload is accepted instead of following processing.
        #[arg(long)]
        no_wait: bool,
    },
    /// Delete the document behind a processing job.
    DeleteDocument { job_id: String },
    /// Create an account; sign in with `login` afterwards.
    Register {
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        /// Falls back to PROMPTDESK_PASSWORD.
        #[arg(long)]
        password: Option<String>,
    },
    /// Show the account profile, or change it when any field is given.
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// An empty value removes the phone number.
        #[arg(long)]
        phone: Option<String>,
    },
    /// Change the account password.
    Passwd {
        /// Falls back to PROMPTDESK_PASSWORD.
        #[arg(long)]
        current: Option<String>,
        /// Falls back to PROMPTDESK_NEW_PASSWORD.
        #[arg(long)]
        new: Option<String>,
    },
    /// List past tutoring conversations, newest first.
    History {
        /// Only conversations held with this prompt.
        #[arg(long)]
        prompt: Option<PromptId>,
    },
}

impl Command {
    pub fn needs_session(&self) -> bool {
        !matches!(
            self,
            Command::Login { .. } | Command::Logout | Command::Register { .. }
        )
    }
}
