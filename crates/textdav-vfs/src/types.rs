//! Core VFS types.
//!
//! These types are snapshots handed to the protocol engine; they are
//! serializable so an engine can ship them over whatever wire it speaks.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// Permission bits reported for this kind of entry.
    pub fn perm(&self, read_only: bool) -> u32 {
        match (self, read_only) {
            (FileType::File, true) => 0o444,
            (FileType::File, false) => 0o644,
            (FileType::Directory, true) => 0o555,
            (FileType::Directory, false) => 0o755,
        }
    }
}

/// File attributes (metadata) returned by `stat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttr {
    /// Display name. This is the same field `DAV:displayname` mirrors.
    pub name: String,
    /// Absolute path.
    pub path: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Unix permissions (e.g., 0o444).
    pub perm: u32,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl FileAttr {
    /// Attributes for a directory implied by its descendants.
    pub fn implied_directory(path: &str, read_only: bool) -> Self {
        Self {
            name: crate::path::base_name(path).to_string(),
            path: path.to_string(),
            size: 0,
            kind: FileType::Directory,
            perm: FileType::Directory.perm(read_only),
            mtime: SystemTime::now(),
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Directory entry, one per direct child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (final path segment, not full path).
    pub name: String,
    /// Absolute path of the child.
    pub path: String,
    /// Human-facing label.
    pub display_name: String,
    /// Entry type.
    pub kind: FileType,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl DirEntry {
    /// Listing entry for a directory implied by its descendants.
    pub fn implied_directory(path: &str) -> Self {
        let name = crate::path::base_name(path).to_string();
        Self {
            display_name: name.clone(),
            name,
            path: path.to_string(),
            kind: FileType::Directory,
            size: 0,
            mtime: SystemTime::now(),
        }
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Open file flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenFlags {
    /// Read access requested.
    pub read: bool,
    /// Write access requested.
    pub write: bool,
    /// Create if not exists.
    pub create: bool,
    /// Exclusive create (fail if exists).
    pub exclusive: bool,
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self {
            read: true,
            write: false,
            create: false,
            exclusive: false,
        }
    }
}

impl OpenFlags {
    /// Read-only access.
    pub fn read() -> Self {
        Self::default()
    }

    /// Write access (also enables read).
    pub fn write() -> Self {
        Self {
            read: true,
            write: true,
            ..Default::default()
        }
    }

    /// Create with write access.
    pub fn create() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            ..Default::default()
        }
    }

    /// Create exclusively (fail if exists).
    pub fn create_exclusive() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            exclusive: true,
        }
    }

    /// True if opening with these flags may mutate the store.
    pub fn mutates(&self) -> bool {
        self.write || self.create
    }
}

/// Result of a handle read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// This many bytes were copied into the buffer.
    Data(usize),
    /// The cursor is at or past the end of the content.
    Eof,
}

impl ReadOutcome {
    /// Bytes read; zero at end of sequence.
    pub fn bytes(&self) -> usize {
        match self {
            ReadOutcome::Data(n) => *n,
            ReadOutcome::Eof => 0,
        }
    }

    /// Returns true at end of sequence.
    pub fn is_eof(&self) -> bool {
        matches!(self, ReadOutcome::Eof)
    }
}
