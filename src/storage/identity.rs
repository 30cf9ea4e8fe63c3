use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::Identity;

#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
    username: String,
}

/// The username chosen on the login screen, kept on disk between runs.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<Identity> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                log::warn!("Failed to read {}: {err}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<StoredIdentity>(&content) {
            Ok(stored) => Identity::new(&stored.username),
            Err(err) => {
                log::warn!("Ignoring malformed {}: {err}", self.path.display());
                None
            }
        }
    }

    pub fn save(&self, identity: &Identity) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let stored = StoredIdentity {
            username: identity.as_str().to_string(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, json)
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}
