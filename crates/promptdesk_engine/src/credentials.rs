//! Persisted bearer credential.
//!
//! The stored credential is only a hint: the session is restored by asking
//! the service who the token belongs to, and a rejected token is discarded.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use promptdesk_logging::{desk_info, desk_warn};
use serde::{Deserialize, Serialize};

use crate::{AtomicFileWriter, PersistError};

pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), PersistError>;
    fn clear(&self) -> Result<(), PersistError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    access_token: String,
}

/// Keeps the credential in a small JSON file, replaced atomically on save.
pub struct FileCredentialStore {
    dir: PathBuf,
    filename: String,
}

impl FileCredentialStore {
    pub fn new(path: &Path) -> Self {
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "credentials.json".to_string());
        Self { dir, filename }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<String> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                desk_warn!("Failed to read stored credential from {:?}: {}", path, err);
                return None;
            }
        };

        match serde_json::from_str::<StoredCredential>(&content) {
            Ok(stored) if !stored.access_token.is_empty() => Some(stored.access_token),
            Ok(_) => None,
            Err(err) => {
                desk_warn!("Failed to parse stored credential from {:?}: {}", path, err);
                None
            }
        }
    }

    fn save(&self, token: &str) -> Result<(), PersistError> {
        let content = serde_json::to_string(&StoredCredential {
            access_token: token.to_string(),
        })
        .map_err(|err| PersistError::Encode(err.to_string()))?;
        AtomicFileWriter::new(self.dir.clone()).write(&self.filename, &content)?;
        desk_info!("Stored credential at {:?}", self.path());
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        AtomicFileWriter::new(self.dir.clone()).remove(&self.filename)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Mutex::new(token),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, token: &str) -> Result<(), PersistError> {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistError> {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
        Ok(())
    }
}
