//! Credential file.
//!
//! Persists the granted app token so the next run can skip the LCD dance.
//! Storage location: `freebox_credentials.json` in the working directory
//! unless configured otherwise. The token is stored in plaintext; the file
//! is restricted to the current user on Unix.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::StorageError;

/// On-disk format.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub app_id: String,
    pub app_name: String,
    pub app_version: String,
    pub app_token: String,
    /// Host the token was issued by. Older files call it `freebox_ip`.
    #[serde(alias = "freebox_ip")]
    pub host: String,
    pub api_version: String,
}

impl StoredCredentials {
    fn validate(&self) -> Result<(), StorageError> {
        for (field, value) in [
            ("app_token", &self.app_token),
            ("host", &self.host),
            ("api_version", &self.api_version),
        ] {
            if value.trim().is_empty() {
                return Err(StorageError::Invalid(format!("{field} is empty")));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("app_id", &self.app_id)
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .field("app_token", &"<redacted>")
            .field("host", &self.host)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// The part of a credentials file a new run picks up. Identity fields are
/// left out: they always come from the running binary.
#[derive(Clone, PartialEq, Eq)]
pub struct LoadedCredentials {
    pub app_token: String,
    pub api_version: String,
    pub host: String,
}

impl fmt::Debug for LoadedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedCredentials")
            .field("app_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("host", &self.host)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No credentials file yet.
    NotFound,
    Found(LoadedCredentials),
}

/// Reads and writes one credentials file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    file_path: PathBuf,
}

impl CredentialStore {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Replace the credentials file.
    ///
    /// The JSON is written to a temporary file next to the target and renamed
    /// over it, so readers see either the old file or the complete new one.
    pub fn save(&self, credentials: &StoredCredentials) -> Result<(), StorageError> {
        let dir = match self.file_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut content = serde_json::to_string_pretty(credentials)?;
        content.push('\n');

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
        }

        tmp.persist(&self.file_path).map_err(|e| e.error)?;
        tracing::debug!(path = %self.file_path.display(), "credentials saved");
        Ok(())
    }

    /// Read the credentials file. A missing file is `LoadOutcome::NotFound`,
    /// not an error; anything unreadable or incomplete is.
    pub fn load(&self) -> Result<LoadOutcome, StorageError> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.file_path.display(), "no credentials file");
                return Ok(LoadOutcome::NotFound);
            }
            Err(err) => return Err(err.into()),
        };

        let stored: StoredCredentials = serde_json::from_str(&content)?;
        stored.validate()?;

        Ok(LoadOutcome::Found(LoadedCredentials {
            app_token: stored.app_token,
            api_version: stored.api_version,
            host: stored.host,
        }))
    }
}
