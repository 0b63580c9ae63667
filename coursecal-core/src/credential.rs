//! OAuth credential and where it is kept between runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Treat tokens this close to expiry as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn from_expires_in(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Credential {
            access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(EXPIRY_SKEW_SECS)
    }

    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Apply a refresh response. Google usually omits the refresh token on
    /// refresh, in which case the current one is kept.
    pub fn refreshed(&self, access_token: String, refresh_token: String, expires_in: i64) -> Self {
        let refresh_token = if refresh_token.is_empty() {
            self.refresh_token.clone()
        } else {
            refresh_token
        };

        Credential::from_expires_in(access_token, refresh_token, expires_in)
    }
}

/// Persistence for the cached credential.
pub trait CredentialStore {
    /// `Ok(None)` when nothing usable is stored.
    fn load(&self) -> AuthResult<Option<Credential>>;

    /// Overwrites whatever was stored before.
    fn save(&self, credential: &Credential) -> AuthResult<()>;
}

/// Stores the credential as TOML in a single file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> AuthResult<Option<Credential>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(AuthError::CacheUnreadable {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match toml::from_str::<Credential>(&contents) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring malformed credential cache"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, credential: &Credential) -> AuthResult<()> {
        let persist_err = |message: String| AuthError::Persist {
            path: self.path.clone(),
            message,
        };

        let contents = toml::to_string_pretty(credential)
            .map_err(|e| persist_err(format!("failed to serialize credential: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    persist_err(format!("failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        std::fs::write(&self.path, contents).map_err(|e| persist_err(e.to_string()))?;

        // Owner-only since the file holds OAuth tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| persist_err(format!("failed to set permissions: {}", e)))?;
        }

        tracing::debug!(path = %self.path.display(), "saved credential");
        Ok(())
    }
}
