/// Flat-file user store for the login screen.
///
/// Accounts live in a JSON file next to the game. A missing or corrupt
/// file just starts an empty store. Failed logins are counted per account
/// and lock it after too many; a successful login resets the counter.
/// Unknown usernames get the same answer as wrong passwords so the prompt
/// does not leak which accounts exist.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failed attempts before the account locks.
const MAX_FAILED: u32 = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account is locked after too many failed attempts")]
    Locked,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("username and password must not be empty")]
    EmptyField,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct UserRecord {
    password: String,
    #[serde(default)]
    failed_attempts: u32,
}

pub struct UserStore {
    path: PathBuf,
    users: HashMap<String, UserRecord>,
}

impl UserStore {
    /// Open the store at `path`. Missing or unreadable files start empty.
    pub fn load(path: &Path) -> Self {
        let users = std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        UserStore {
            path: path.to_path_buf(),
            users,
        }
    }

    pub fn register(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::EmptyField);
        }
        if self.users.contains_key(username) {
            return Err(AuthError::UsernameTaken);
        }
        self.users.insert(
            username.to_string(),
            UserRecord {
                password: password.to_string(),
                failed_attempts: 0,
            },
        );
        self.save();
        Ok(())
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        let Some(record) = self.users.get_mut(username) else {
            // Same answer as a wrong password
            return Err(AuthError::InvalidCredentials);
        };
        if record.failed_attempts >= MAX_FAILED {
            return Err(AuthError::Locked);
        }
        if record.password != password {
            record.failed_attempts += 1;
            self.save();
            return Err(AuthError::InvalidCredentials);
        }
        record.failed_attempts = 0;
        self.save();
        Ok(())
    }

    /// Best-effort write-back; the game keeps running if it fails.
    fn save(&self) {
        if let Ok(text) = serde_json::to_string_pretty(&self.users) {
            if let Err(e) = std::fs::write(&self.path, text) {
                eprintln!("Warning: could not write {}: {e}", self.path.display());
            }
        }
    }
}
