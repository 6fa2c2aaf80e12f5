use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use vitality_core::SyncOptions;

const DATA_DIR_ENV: &str = "VITALITY_DATA_DIR";

/// User-editable settings, read from `config.json` in the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of a `vitality serve` instance. Unset means local-only.
    pub remote_url: Option<String>,
    pub remote_timeout_secs: u64,
    pub detach_remote_writes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote_url: None,
            remote_timeout_secs: 10,
            detach_remote_writes: false,
        }
    }
}

pub struct Config {
    pub data_dir: PathBuf,
    /// On-device store.
    pub db_path: PathBuf,
    /// Document database hosted by `serve`.
    pub server_db_path: PathBuf,
    pub session_path: PathBuf,
    pub settings: Settings,
}

impl Config {
    pub fn load() -> Result<Self> {
        let data_dir = if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            PathBuf::from(dir)
        } else {
            let proj_dirs = ProjectDirs::from("", "", "vitality")
                .context("Could not determine home directory")?;
            proj_dirs.data_dir().to_path_buf()
        };
        Self::at(&data_dir)
    }

    pub fn at(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let config_path = data_dir.join("config.json");
        let settings = if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid config file: {}", config_path.display()))?
        } else {
            Settings::default()
        };

        Ok(Config {
            db_path: data_dir.join("vitality.db"),
            server_db_path: data_dir.join("server.db"),
            session_path: data_dir.join("session.json"),
            data_dir: data_dir.to_path_buf(),
            settings,
        })
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            remote_timeout: Duration::from_secs(self.settings.remote_timeout_secs.max(1)),
            detach_remote_writes: self.settings.detach_remote_writes,
        }
    }

    /// Load the API key from disk, or generate a new one.
    ///
    /// Returns `(key, newly_created)` where `newly_created` is true when a
    /// fresh key was just generated (first run).
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if !key.is_empty() {
                if key.len() < 32 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
                    anyhow::bail!(
                        "API key in {} must be at least 32 hex characters; delete it to generate a new one",
                        path.display()
                    );
                }
                return Ok((key, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        restrict_permissions(&path)?;
        eprintln!("Generated new API key: {key}");
        eprintln!("Sign in on each device with: vitality login <identity> --token {key}");
        Ok((key, true))
    }
}

/// Owner-only access for files holding credentials.
pub fn restrict_permissions(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
