//! Entries: the nodes of the virtual hierarchy.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::{VfsError, VfsResult};
use crate::path;
use crate::props::{self, PropName, PropPatch, PropStatus, PropValue, Property, PropertyMap};
use crate::types::{DirEntry, FileAttr, FileType};

/// Shared handle to an entry node.
///
/// The store and any open session handles hold the same node, so handles
/// observe renames and writes in place.
pub type EntryRef = Arc<RwLock<Entry>>;

/// Largest byte run handed out as one contiguous buffer.
///
/// Declared sizes may be far larger; such files are streamed through a
/// [`SessionHandle`](crate::SessionHandle) instead.
pub const MAX_MATERIALIZED_LEN: u64 = 256 * 1024 * 1024;

/// File bytes: a synthetic base of `declared` bytes, zeros up to `len`, and
/// written ranges layered on top.
///
/// `written` keys are start offsets. Ranges never overlap or touch; a write
/// that meets existing ranges merges with them.
#[derive(Debug, Clone, PartialEq)]
struct Content {
    seed: String,
    declared: u64,
    len: u64,
    written: BTreeMap<u64, Vec<u8>>,
}

impl Content {
    fn synthetic(seed: &str, declared: u64) -> Self {
        Self {
            seed: seed.to_string(),
            declared,
            len: declared,
            written: BTreeMap::new(),
        }
    }

    fn empty() -> Self {
        Self::synthetic("", 0)
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        if offset >= self.len {
            return 0;
        }
        let n = (buf.len() as u64).min(self.len - offset) as usize;
        let out = &mut buf[..n];
        let end = offset + n as u64;

        let pattern = synthetic_pattern(&self.seed, self.declared);
        let pattern = pattern.as_bytes();
        for (i, byte) in out.iter_mut().enumerate() {
            let pos = offset + i as u64;
            *byte = if pos < self.declared {
                pattern[(pos % pattern.len() as u64) as usize]
            } else {
                0
            };
        }

        for (&start, data) in self.written.range(..end).rev() {
            let seg_end = start + data.len() as u64;
            if seg_end <= offset {
                break;
            }
            let from = start.max(offset);
            let to = seg_end.min(end);
            out[(from - offset) as usize..(to - offset) as usize]
                .copy_from_slice(&data[(from - start) as usize..(to - start) as usize]);
        }
        n
    }

    /// Layer `data` at `offset`, growing `len` as needed.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> VfsResult<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let end = u64::try_from(data.len())
            .ok()
            .and_then(|n| offset.checked_add(n))
            .ok_or_else(|| {
                VfsError::invalid_argument(format!(
                    "write of {} bytes at offset {} overflows",
                    data.len(),
                    offset
                ))
            })?;

        // Ranges that overlap or touch [offset, end).
        let touching: Vec<u64> = self
            .written
            .range(..=end)
            .rev()
            .take_while(|(start, seg)| *start + seg.len() as u64 >= offset)
            .map(|(start, _)| *start)
            .collect();

        let mut merged_start = offset;
        let mut merged_end = end;
        for start in &touching {
            let seg_len = self.written[start].len() as u64;
            merged_start = merged_start.min(*start);
            merged_end = merged_end.max(start + seg_len);
        }

        // The merged run is no longer than the ranges it absorbs plus `data`.
        let mut merged = vec![0u8; (merged_end - merged_start) as usize];
        for start in touching {
            if let Some(seg) = self.written.remove(&start) {
                let at = (start - merged_start) as usize;
                merged[at..at + seg.len()].copy_from_slice(&seg);
            }
        }
        let at = (offset - merged_start) as usize;
        merged[at..at + data.len()].copy_from_slice(data);
        self.written.insert(merged_start, merged);

        self.len = self.len.max(end);
        Ok(data.len())
    }
}

/// The text a synthetic file repeats.
fn synthetic_pattern(seed: &str, size: u64) -> String {
    format!(
        "This is the simulated content of file {}. Size: {} bytes\n",
        seed, size
    )
}

/// Deterministic placeholder content for a file of `size` bytes at `path`.
///
/// Sizes above [`MAX_MATERIALIZED_LEN`] are refused with `InvalidArgument`.
pub fn synthetic_content(path: &str, size: u64) -> VfsResult<Vec<u8>> {
    if size > MAX_MATERIALIZED_LEN {
        return Err(VfsError::invalid_argument(format!(
            "{} bytes exceeds the {} byte buffer limit",
            size, MAX_MATERIALIZED_LEN
        )));
    }
    let mut data = vec![0u8; size as usize];
    Content::synthetic(path, size).read_at(0, &mut data);
    Ok(data)
}

/// A node in the hierarchy, file or directory.
#[derive(Debug, Clone)]
pub struct Entry {
    path: String,
    display_name: String,
    kind: FileType,
    content: Content,
    modified: SystemTime,
    properties: PropertyMap,
}

impl Entry {
    /// A file with synthetic content derived from `path` and `size`.
    pub fn file(path: impl Into<String>, size: u64, display_name: Option<&str>) -> Self {
        let path = path.into();
        let display_name = display_name
            .map(str::to_string)
            .unwrap_or_else(|| path::base_name(&path).to_string());
        Self {
            content: Content::synthetic(&path, size),
            properties: PropertyMap::with_display_name(&display_name),
            path,
            display_name,
            kind: FileType::File,
            modified: SystemTime::now(),
        }
    }

    /// A directory named after its final path segment.
    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        let display_name = path::base_name(&path).to_string();
        Self {
            content: Content::empty(),
            properties: PropertyMap::with_display_name(&display_name),
            path,
            display_name,
            kind: FileType::Directory,
            modified: SystemTime::now(),
        }
    }

    /// Wrap into a shared node.
    pub fn into_ref(self) -> EntryRef {
        Arc::new(RwLock::new(self))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> FileType {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Size in bytes; always 0 for directories.
    pub fn size(&self) -> u64 {
        match self.kind {
            FileType::File => self.content.len(),
            FileType::Directory => 0,
        }
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Snapshot for `stat`.
    pub fn attr(&self, read_only: bool) -> FileAttr {
        FileAttr {
            name: self.display_name.clone(),
            path: self.path.clone(),
            size: self.size(),
            kind: self.kind,
            perm: self.kind.perm(read_only),
            mtime: self.modified,
        }
    }

    /// Snapshot for a directory listing.
    pub fn dir_entry(&self) -> DirEntry {
        DirEntry {
            name: path::base_name(&self.path).to_string(),
            path: self.path.clone(),
            display_name: self.display_name.clone(),
            kind: self.kind,
            size: self.size(),
            mtime: self.modified,
        }
    }

    /// Update the display name and its `DAV:displayname` mirror together.
    pub fn set_display_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.properties
            .set(PropName::display_name(), PropValue::from(name.as_str()));
        self.display_name = name;
    }

    /// Move to a new path key. The display name follows the new base name
    /// only if it was never customized.
    pub(crate) fn relocate(&mut self, new_path: String) {
        if self.display_name == path::base_name(&self.path) {
            self.set_display_name(path::base_name(&new_path).to_string());
        }
        self.path = new_path;
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.modified = SystemTime::now();
    }

    /// Copy bytes at `offset` into `buf`; returns the count (0 at or past end).
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        match self.kind {
            FileType::File => self.content.read_at(offset, buf),
            FileType::Directory => 0,
        }
    }

    /// Overwrite from `offset`, zero-filling any gap and growing the file.
    ///
    /// Fails with `InvalidArgument` if the write would end past `u64::MAX`.
    pub(crate) fn write_at(&mut self, offset: u64, data: &[u8]) -> VfsResult<usize> {
        let n = self.content.write_at(offset, data)?;
        self.touch();
        Ok(n)
    }

    /// Every property: `DAV:displayname` first, then live, then dead ones.
    pub fn all_properties(&self) -> Vec<Property> {
        let mut result = Vec::with_capacity(self.properties.len() + 3);
        result.push(Property::new(
            PropName::display_name(),
            self.display_name.as_str(),
        ));
        result.extend(props::live_properties(
            self.kind,
            self.size(),
            self.modified,
        ));
        result.extend(
            self.properties
                .iter()
                .filter(|(name, _)| !name.is_display_name())
                .map(|(name, value)| Property::new(name.clone(), value.clone())),
        );
        result
    }

    /// Apply one patch, returning its status. Does not bump `modified`.
    pub(crate) fn apply_patch(&mut self, patch: &PropPatch) -> PropStatus {
        let name = patch.name();
        if name.is_live() {
            return PropStatus::Forbidden;
        }
        match patch {
            PropPatch::Set(name, value) if name.is_display_name() => {
                match value.as_text().map(str::trim) {
                    Some(text) if !text.is_empty() => {
                        self.set_display_name(text.to_string());
                        PropStatus::Ok
                    }
                    _ => PropStatus::Conflict,
                }
            }
            PropPatch::Remove(name) if name.is_display_name() => {
                self.set_display_name(path::base_name(&self.path).to_string());
                PropStatus::Ok
            }
            PropPatch::Set(name, value) => {
                self.properties.set(name.clone(), value.clone());
                PropStatus::Ok
            }
            PropPatch::Remove(name) => {
                self.properties.remove(name);
                PropStatus::Ok
            }
        }
    }
}
