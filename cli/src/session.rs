use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vitality_core::{IdentityRef, SessionContext};

use crate::config::restrict_permissions;

/// What `login` records in `session.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub identity: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Session backed by the credential file, read once per process.
#[derive(Debug, Default)]
pub struct FileSession {
    credential: Option<Credential>,
    local_only: bool,
}

impl FileSession {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let credential = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid session file: {}", path.display()))?;
        Ok(Self {
            credential: Some(credential),
            local_only: false,
        })
    }

    /// Keep the identity for local scoping but never allow remote calls,
    /// for when no remote is configured.
    #[must_use]
    pub fn local_only(mut self) -> Self {
        self.local_only = true;
        self
    }

    pub fn store(path: &Path, credential: &Credential) -> Result<()> {
        let body = serde_json::to_string_pretty(credential)?;
        std::fs::write(path, body)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        restrict_permissions(path)
    }

    /// Returns whether a session file was removed.
    pub fn clear(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        Ok(true)
    }

    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Bearer token, only while the credential is still valid.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.credential
            .as_ref()
            .filter(|c| !c.is_expired())
            .map(|c| c.token.as_str())
    }
}

impl SessionContext for FileSession {
    fn is_authenticated(&self) -> bool {
        !self.local_only && self.token().is_some()
    }

    fn current_identity(&self) -> Option<IdentityRef> {
        self.credential.as_ref().map(|c| c.identity.clone())
    }
}
