//! Deployment configuration, read from a RON file.
//!
//! ```ron
//! (
//!     manifest: Some("files.txt"),
//!     read_only: true,
//!     users: { "alice": "secret" },
//!     realm: "media",
//! )
//! ```
//!
//! Every field is optional; omitted ones take the defaults below.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use textdav_vfs::VfsConfig;

use crate::auth::CredentialGate;
use crate::constants::{DEFAULT_CONFIG_FILE, DEFAULT_REALM};

/// Error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Manifest loaded at startup.
    pub manifest: Option<PathBuf>,
    /// Refuse mutations. On by default: a fresh deployment serves a
    /// read-only catalogue until configured otherwise.
    pub read_only: bool,
    /// user -> password. Empty means anonymous access.
    pub users: BTreeMap<String, String>,
    pub realm: String,
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub log_level: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            manifest: None,
            read_only: true,
            users: BTreeMap::new(),
            realm: DEFAULT_REALM.to_string(),
            log_level: None,
        }
    }
}

impl ServerConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Load `explicit` if given, else the default file if present, else
    /// defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Core policy derived from this deployment config.
    pub fn vfs_config(&self) -> VfsConfig {
        VfsConfig {
            read_only: self.read_only,
        }
    }

    pub fn gate(&self) -> CredentialGate {
        CredentialGate::new(self.realm.clone(), self.users.clone())
    }
}
