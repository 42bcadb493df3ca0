//! Session handles: a cursor over one entry for the life of one open.
//!
//! A handle shares its entry node with the store. It sees renames and
//! writes made by others in place, and keeps working on the detached node
//! if the entry is removed while the handle is open.

use std::fmt;
use std::io::{self, SeekFrom};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entry::{EntryRef, MAX_MATERIALIZED_LEN};
use crate::error::{VfsError, VfsResult};
use crate::fs::list_children_in;
use crate::store::EntryStore;
use crate::types::{DirEntry, FileAttr, OpenFlags, ReadOutcome};

/// Chunk size for [`SessionHandle::read_to_end`].
const READ_CHUNK: usize = 8 * 1024;

/// A session handle identifier (UUIDv7).
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Create a new time-ordered ID (UUIDv7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// First 8 hex characters, for log lines only.
    pub fn short(&self) -> String {
        self.0.as_simple().to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.short())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cursor over one entry's content.
///
/// Lifecycle: `Open -> {read, seek, write}* -> Closed`. Every call after
/// [`close`](Self::close) fails with [`VfsError::HandleClosed`].
pub struct SessionHandle {
    id: SessionId,
    entry: EntryRef,
    store: Arc<EntryStore>,
    flags: OpenFlags,
    read_only: bool,
    offset: u64,
    closed: bool,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("path", &self.entry.read().path())
            .field("offset", &self.offset)
            .field("closed", &self.closed)
            .finish()
    }
}

impl SessionHandle {
    pub(crate) fn new(
        entry: EntryRef,
        store: Arc<EntryStore>,
        flags: OpenFlags,
        read_only: bool,
    ) -> Self {
        let id = SessionId::new();
        tracing::debug!(session = %id.short(), path = %entry.read().path(), "handle opened");
        Self {
            id,
            entry,
            store,
            flags,
            read_only,
            offset: 0,
            closed: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Current cursor position.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Current path of the bound entry (follows renames).
    pub fn path(&self) -> String {
        self.entry.read().path().to_string()
    }

    fn ensure_open(&self) -> VfsResult<()> {
        if self.closed {
            Err(VfsError::HandleClosed)
        } else {
            Ok(())
        }
    }

    /// Read into `buf` from the cursor.
    ///
    /// At or past the end of content this returns [`ReadOutcome::Eof`], never
    /// an error.
    pub fn read(&mut self, buf: &mut [u8]) -> VfsResult<ReadOutcome> {
        self.ensure_open()?;
        let entry = self.entry.read();
        if entry.is_dir() {
            return Err(VfsError::invalid_operation(format!(
                "read on directory {}",
                entry.path()
            )));
        }
        if !self.flags.read {
            tracing::warn!(session = %self.id.short(), path = %entry.path(), "read refused");
            return Err(VfsError::permission_denied(format!(
                "{} not open for reading",
                entry.path()
            )));
        }
        if self.offset >= entry.size() {
            return Ok(ReadOutcome::Eof);
        }
        let n = entry.read_at(self.offset, buf);
        drop(entry);
        self.offset += n as u64;
        Ok(ReadOutcome::Data(n))
    }

    /// Read from the cursor to the end of content.
    ///
    /// Fails with `InvalidArgument` if more than [`MAX_MATERIALIZED_LEN`]
    /// bytes remain; stream such files with [`read`](Self::read).
    pub fn read_to_end(&mut self) -> VfsResult<Vec<u8>> {
        self.ensure_open()?;
        let remaining = self.entry.read().size().saturating_sub(self.offset);
        if remaining > MAX_MATERIALIZED_LEN {
            return Err(VfsError::invalid_argument(format!(
                "{} bytes remain, more than the {} byte buffer limit",
                remaining, MAX_MATERIALIZED_LEN
            )));
        }
        let mut out = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            match self.read(&mut chunk)? {
                ReadOutcome::Data(n) => out.extend_from_slice(&chunk[..n]),
                ReadOutcome::Eof => return Ok(out),
            }
        }
    }

    /// Move the cursor. Past-end positions are legal; negative ones are not.
    pub fn seek(&mut self, pos: SeekFrom) -> VfsResult<u64> {
        self.ensure_open()?;
        let target: i128 = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(delta) => self.offset as i128 + delta as i128,
            SeekFrom::End(delta) => self.entry.read().size() as i128 + delta as i128,
        };
        if target < 0 {
            return Err(VfsError::invalid_argument(format!(
                "seek to negative offset {}",
                target
            )));
        }
        self.offset = u64::try_from(target)
            .map_err(|_| VfsError::invalid_argument("seek offset overflows"))?;
        Ok(self.offset)
    }

    /// Seek with a numeric whence (0 = start, 1 = current, 2 = end).
    pub fn seek_whence(&mut self, offset: i64, whence: i32) -> VfsResult<u64> {
        let pos = match whence {
            0 => {
                let start = u64::try_from(offset).map_err(|_| {
                    VfsError::invalid_argument(format!("seek to negative offset {}", offset))
                })?;
                SeekFrom::Start(start)
            }
            1 => SeekFrom::Current(offset),
            2 => SeekFrom::End(offset),
            other => {
                return Err(VfsError::invalid_argument(format!("invalid whence {}", other)));
            }
        };
        self.seek(pos)
    }

    /// Overwrite from the cursor, growing the file as needed.
    pub fn write(&mut self, data: &[u8]) -> VfsResult<usize> {
        self.ensure_open()?;
        let mut entry = self.entry.write();
        if entry.is_dir() {
            return Err(VfsError::invalid_operation(format!(
                "write on directory {}",
                entry.path()
            )));
        }
        if self.read_only || !self.flags.write {
            tracing::warn!(session = %self.id.short(), path = %entry.path(), "write refused");
            return Err(VfsError::permission_denied(format!(
                "{} not open for writing",
                entry.path()
            )));
        }
        let n = entry.write_at(self.offset, data)?;
        drop(entry);
        self.offset += n as u64;
        Ok(n)
    }

    /// List children of a directory handle.
    pub fn list_children(&self) -> VfsResult<Vec<DirEntry>> {
        self.ensure_open()?;
        let (path, is_dir) = {
            let entry = self.entry.read();
            (entry.path().to_string(), entry.is_dir())
        };
        if !is_dir {
            return Err(VfsError::invalid_operation(format!(
                "{} is not a directory",
                path
            )));
        }
        let table = self.store.read();
        list_children_in(&table, &path)
    }

    /// Current attributes of the bound entry.
    pub fn stat(&self) -> VfsResult<FileAttr> {
        self.ensure_open()?;
        Ok(self.entry.read().attr(self.read_only))
    }

    /// Close the handle. A second close fails with `HandleClosed`.
    pub fn close(&mut self) -> VfsResult<()> {
        self.ensure_open()?;
        self.closed = true;
        tracing::debug!(session = %self.id.short(), offset = self.offset, "handle closed");
        Ok(())
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if !self.closed {
            tracing::debug!(session = %self.id.short(), "handle dropped while open");
        }
    }
}

impl io::Read for SessionHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(SessionHandle::read(self, buf)?.bytes())
    }
}

impl io::Seek for SessionHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(SessionHandle::seek(self, pos)?)
    }
}

impl io::Write for SessionHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(SessionHandle::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        Ok(())
    }
}
