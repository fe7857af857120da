use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::error::CredentialsError;
use super::password::{generate_salt, generate_secret, hash_password};

pub const CREDENTIALS_FILE: &str = "credentials";
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Contents of `<config dir>/credentials`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredentials {
    pub login: String,
    pub password_hash: String,
    pub salt: String,
    pub secret: String,
    pub created_at: String,
}

/// File-backed admin credentials, written once by setup
#[derive(Debug, Clone)]
pub struct CredentialStore {
    dir: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }

    pub fn is_configured(&self) -> bool {
        self.path().exists()
    }

    /// `Ok(None)` when no file has been written yet
    pub fn load(&self) -> Result<Option<StoredCredentials>, CredentialsError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|source| CredentialsError::Io { path, source })?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Validate, hash and persist. Fails if a file already exists.
    pub fn save(&self, login: &str, password: &str) -> Result<StoredCredentials, CredentialsError> {
        if self.is_configured() {
            return Err(CredentialsError::AlreadyConfigured);
        }
        validate_new_credentials(login, password)?;

        fs::create_dir_all(&self.dir).map_err(|source| CredentialsError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let salt = generate_salt();
        let stored = StoredCredentials {
            login: login.to_string(),
            password_hash: hash_password(password, &salt),
            salt,
            secret: generate_secret(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let path = self.path();
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&path, content).map_err(|source| CredentialsError::Io { path: path.clone(), source })?;
        tracing::info!("Saved admin credentials to {}", path.display());

        self.ignore_in_git();
        Ok(stored)
    }

    /// Returns whether a file was removed
    pub fn delete(&self) -> Result<bool, CredentialsError> {
        let path = self.path();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|source| CredentialsError::Io { path, source })?;
        Ok(true)
    }

    /// Append the config dir to a sibling `.gitignore` that does not list it
    fn ignore_in_git(&self) {
        let root = self
            .dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let gitignore = root.join(".gitignore");

        let Ok(existing) = fs::read_to_string(&gitignore) else { return };
        let entry = self
            .dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".prada".to_string());

        if existing.contains(&entry) {
            return;
        }
        if let Err(e) = fs::write(&gitignore, format!("{}\n{}/\n", existing, entry)) {
            tracing::warn!("Could not update {}: {}", gitignore.display(), e);
        }
    }
}

pub fn validate_new_credentials(login: &str, password: &str) -> Result<(), CredentialsError> {
    if login.is_empty() || password.is_empty() {
        return Err(CredentialsError::MissingFields);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CredentialsError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }
    Ok(())
}
