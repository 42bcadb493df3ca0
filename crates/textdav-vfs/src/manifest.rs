//! Declarative bulk-load manifests.
//!
//! ```text
//! # comments and blank lines are skipped
//! /1.mkv#1024#Movie (2025)
//! /2.pdf#512
//! docs/3.txt#128#Notes
//! ```
//!
//! Each line is `path#size[#displayName]`. The path gets a leading `/` if it
//! lacks one; the display name defaults to the final path segment. Parsing is
//! all-or-nothing: the first malformed line fails the whole manifest.

use std::path::Path;
use std::str::FromStr;

use crate::error::{ManifestError, VfsResult};
use crate::path;

/// One file declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Normalized absolute path.
    pub path: String,
    /// Declared size in bytes, at most `i64::MAX`.
    pub size: u64,
    /// Explicit display name, if one was given.
    pub display_name: Option<String>,
    /// 1-based source line.
    pub line: usize,
}

/// A parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    declarations: Vec<Declaration>,
}

impl Manifest {
    /// Parse manifest text.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut declarations = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            declarations.push(parse_line(line, idx + 1)?);
        }
        Ok(Self { declarations })
    }

    /// Read and parse a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> VfsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text)?)
    }

    /// Build a manifest from already-validated declarations.
    pub fn from_declarations(declarations: Vec<Declaration>) -> Self {
        Self { declarations }
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl FromStr for Manifest {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_line(line: &str, line_no: usize) -> Result<Declaration, ManifestError> {
    let parts: Vec<&str> = line.split('#').collect();
    if parts.len() < 2 {
        return Err(ManifestError::MissingSize { line: line_no });
    }

    let raw_path = parts[0].trim();
    if raw_path.is_empty() {
        return Err(ManifestError::EmptyPath { line: line_no });
    }

    // Sizes are signed 64-bit on the wire; negative ones are invalid.
    let raw_size = parts[1].trim();
    let size = raw_size
        .parse::<i64>()
        .ok()
        .and_then(|n| u64::try_from(n).ok())
        .ok_or_else(|| ManifestError::InvalidSize {
            line: line_no,
            value: raw_size.to_string(),
        })?;

    // A display name may itself contain '#'.
    let display_name = if parts.len() > 2 {
        let name = parts[2..].join("#");
        let name = name.trim();
        if name.is_empty() {
            return Err(ManifestError::EmptyDisplayName { line: line_no });
        }
        Some(name.to_string())
    } else {
        None
    };

    let path = match path::normalize(raw_path) {
        Ok(p) if !path::is_root(&p) => p,
        _ => {
            return Err(ManifestError::InvalidPath {
                line: line_no,
                path: raw_path.to_string(),
            });
        }
    };

    Ok(Declaration {
        path,
        size,
        display_name,
        line: line_no,
    })
}
