//! Core configuration.

use serde::{Deserialize, Serialize};

/// Policy knobs for a [`VirtualFs`](crate::VirtualFs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    /// Refuse every mutation with `PermissionDenied`.
    pub read_only: bool,
}

impl VfsConfig {
    /// A configuration that refuses mutations.
    pub fn read_only() -> Self {
        Self { read_only: true }
    }
}
