//! The in-memory virtual filesystem.
//!
//! [`VirtualFs`] owns an [`EntryStore`] and implements [`DavFs`] over it.
//! Every structural change takes the store's write guard once and holds it
//! for the whole operation.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::VfsConfig;
use crate::entry::{Entry, EntryRef};
use crate::error::{VfsError, VfsResult};
use crate::handle::SessionHandle;
use crate::manifest::Manifest;
use crate::ops::DavFs;
use crate::path;
use crate::props::{PropPatch, PropStat, PropStatus, Property};
use crate::store::{EntryStore, Table};
use crate::synth::{self, LoadSummary};
use crate::types::{DirEntry, FileAttr, OpenFlags};

/// Direct children of `dir`, real and implied, sorted by path.
///
/// Shared by [`VirtualFs::list_children`] and directory session handles.
pub(crate) fn list_children_in(table: &Table, dir: &str) -> VfsResult<Vec<DirEntry>> {
    match table.get(dir) {
        Some(entry) if !entry.read().is_dir() => {
            return Err(VfsError::invalid_operation(format!(
                "{} is not a directory",
                dir
            )));
        }
        Some(_) => {}
        None if table.has_descendants(dir) => {}
        None => return Err(VfsError::not_found(dir)),
    }

    let mut children: BTreeMap<String, DirEntry> = BTreeMap::new();
    for child in table.list_children(dir) {
        let child = child.read();
        children.insert(child.path().to_string(), child.dir_entry());
    }
    for descendant in table.descendants(dir) {
        let child = path::child_toward(dir, &descendant);
        if !children.contains_key(child) {
            children.insert(child.to_string(), DirEntry::implied_directory(child));
        }
    }
    Ok(children.into_values().collect())
}

/// In-memory virtual filesystem.
///
/// Thread-safe; share it behind an `Arc`. All data is lost when dropped.
#[derive(Debug)]
pub struct VirtualFs {
    store: Arc<EntryStore>,
    config: VfsConfig,
}

impl Default for VirtualFs {
    fn default() -> Self {
        Self::new(VfsConfig::default())
    }
}

impl VirtualFs {
    /// Create a filesystem holding only the root directory.
    pub fn new(config: VfsConfig) -> Self {
        Self::with_store(Arc::new(EntryStore::new()), config)
    }

    /// Wrap an existing store. The root is synthesized if absent.
    pub fn with_store(store: Arc<EntryStore>, config: VfsConfig) -> Self {
        synth::ensure_root(&mut store.write());
        Self { store, config }
    }

    /// Build a filesystem from manifest text.
    pub fn from_manifest_str(text: &str, config: VfsConfig) -> VfsResult<Self> {
        let fs = Self::new(config);
        fs.load_str(text)?;
        Ok(fs)
    }

    pub fn store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    pub fn config(&self) -> &VfsConfig {
        &self.config
    }

    /// Apply a manifest. Either every declaration is applied or none is.
    ///
    /// Loading is an administrative step and ignores the read-only policy.
    pub fn load(&self, manifest: &Manifest) -> VfsResult<LoadSummary> {
        let summary = {
            let mut table = self.store.write();
            synth::apply_declarations(&mut table, manifest.declarations())?
        };
        tracing::info!(
            files = summary.files,
            directories = summary.directories,
            "manifest loaded"
        );
        Ok(summary)
    }

    /// Parse and apply manifest text.
    pub fn load_str(&self, text: &str) -> VfsResult<LoadSummary> {
        let manifest = Manifest::parse(text)?;
        self.load(&manifest)
    }

    /// Read, parse and apply a manifest file.
    pub fn load_path(&self, path: impl AsRef<Path>) -> VfsResult<LoadSummary> {
        let path = path.as_ref();
        tracing::debug!(manifest = %path.display(), "loading manifest file");
        let manifest = Manifest::from_path(path)?;
        self.load(&manifest)
    }

    /// Refuse a mutation under the read-only policy. Runs before any lock.
    fn check_writable(&self, op: &str, path: &str) -> VfsResult<()> {
        if self.config.read_only {
            tracing::warn!(op, path, "mutation refused: read-only");
            return Err(VfsError::permission_denied(format!(
                "{} {}: filesystem is read-only",
                op, path
            )));
        }
        Ok(())
    }

    fn handle(&self, entry: EntryRef, flags: OpenFlags) -> SessionHandle {
        SessionHandle::new(entry, Arc::clone(&self.store), flags, self.config.read_only)
    }

    /// Open, creating a file if needed. Runs under the write guard.
    fn open_create(&self, path: &str, flags: OpenFlags) -> VfsResult<SessionHandle> {
        let mut table = self.store.write();
        if let Some(entry) = table.get(path) {
            if flags.exclusive {
                return Err(VfsError::already_exists(path));
            }
            let entry = EntryRef::clone(entry);
            drop(table);
            return Ok(self.handle(entry, flags));
        }
        if table.has_descendants(path) {
            if flags.exclusive {
                return Err(VfsError::already_exists(path));
            }
            let entry = Entry::directory(path).into_ref();
            table.put(path, EntryRef::clone(&entry));
            drop(table);
            return Ok(self.handle(entry, flags));
        }

        synth::ensure_ancestors(&mut table, path)?;
        let entry = Entry::file(path, 0, None).into_ref();
        table.put(path, EntryRef::clone(&entry));
        drop(table);
        tracing::info!(path, "file created");
        Ok(self.handle(entry, flags))
    }
}

impl DavFs for VirtualFs {
    fn stat(&self, path: &str) -> VfsResult<FileAttr> {
        let path = path::normalize(path)?;
        let table = self.store.read();
        tracing::debug!(path = %path, "stat");
        if let Some(entry) = table.get(&path) {
            return Ok(entry.read().attr(self.config.read_only));
        }
        if table.has_descendants(&path) {
            return Ok(FileAttr::implied_directory(&path, self.config.read_only));
        }
        Err(VfsError::not_found(path))
    }

    fn list_children(&self, path: &str) -> VfsResult<Vec<DirEntry>> {
        let path = path::normalize(path)?;
        let table = self.store.read();
        tracing::debug!(path = %path, "list children");
        list_children_in(&table, &path)
    }

    fn read_properties(&self, path: &str) -> VfsResult<Vec<Property>> {
        let path = path::normalize(path)?;
        let table = self.store.read();
        if let Some(entry) = table.get(&path) {
            return Ok(entry.read().all_properties());
        }
        if table.has_descendants(&path) {
            return Ok(Entry::directory(path.as_str()).all_properties());
        }
        Err(VfsError::not_found(path))
    }

    fn open(&self, path: &str, flags: OpenFlags) -> VfsResult<SessionHandle> {
        let path = path::normalize(path)?;
        if flags.mutates() {
            self.check_writable("open", &path)?;
        }
        if flags.create {
            return self.open_create(&path, flags);
        }

        let table = self.store.read();
        let entry = match table.get(&path) {
            Some(entry) => EntryRef::clone(entry),
            // Detached node; the directory only exists through its children.
            None if table.has_descendants(&path) => Entry::directory(path.as_str()).into_ref(),
            None => return Err(VfsError::not_found(path)),
        };
        drop(table);
        Ok(self.handle(entry, flags))
    }

    fn mkdir(&self, path: &str) -> VfsResult<FileAttr> {
        let path = path::normalize(path)?;
        self.check_writable("mkdir", &path)?;

        let mut table = self.store.write();
        if table.exists_under_or_equal(&path) {
            return Err(VfsError::already_exists(path));
        }
        synth::ensure_ancestors(&mut table, &path)?;
        let entry = Entry::directory(path.as_str());
        let attr = entry.attr(self.config.read_only);
        table.put(path.as_str(), entry.into_ref());
        drop(table);

        tracing::info!(path = %path, "directory created");
        Ok(attr)
    }

    fn remove_subtree(&self, path: &str) -> VfsResult<usize> {
        let path = path::normalize(path)?;
        self.check_writable("remove", &path)?;
        if path::is_root(&path) {
            return Err(VfsError::permission_denied("cannot remove root"));
        }

        let mut table = self.store.write();
        let mut doomed = table.descendants(&path);
        if table.contains(&path) {
            doomed.push(path.clone());
        }
        if doomed.is_empty() {
            return Err(VfsError::not_found(path));
        }
        for victim in &doomed {
            table.remove(victim);
        }
        drop(table);

        tracing::info!(path = %path, removed = doomed.len(), "subtree removed");
        Ok(doomed.len())
    }

    fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        let from = path::normalize(from)?;
        let to = path::normalize(to)?;
        self.check_writable("rename", &from)?;
        if path::is_root(&from) || path::is_root(&to) {
            return Err(VfsError::permission_denied("cannot rename root"));
        }
        if path::is_descendant(&to, &from) || path::is_descendant(&from, &to) {
            return Err(VfsError::invalid_argument(format!(
                "cannot move {} to {}: one contains the other",
                from, to
            )));
        }

        let mut table = self.store.write();
        if !table.exists_under_or_equal(&from) {
            return Err(VfsError::not_found(from));
        }
        if from == to {
            return Ok(());
        }

        // Nothing below is fallible once the destination parents exist.
        synth::ensure_ancestors(&mut table, &to)?;

        let mut replaced = table.descendants(&to);
        if table.contains(&to) {
            replaced.push(to.clone());
        }
        for victim in &replaced {
            table.remove(victim);
        }

        let source = table.remove(&from);
        let had_entry = source.is_some();
        let mut moved = vec![(from.clone(), source)];
        for descendant in table.descendants(&from) {
            let node = table.remove(&descendant);
            moved.push((descendant, node));
        }
        let count = moved.len();
        for (old_path, node) in moved {
            let new_path = path::rebase(&old_path, &from, &to);
            if let Some(node) = node {
                node.write().relocate(new_path.clone());
                table.put(new_path, node);
            }
        }
        if !had_entry {
            table.put(to.as_str(), Entry::directory(to.as_str()).into_ref());
        }
        drop(table);

        tracing::info!(
            from = %from,
            to = %to,
            moved = if had_entry { count } else { count - 1 },
            replaced = replaced.len(),
            "renamed"
        );
        Ok(())
    }

    fn patch_properties(&self, path: &str, patches: &[PropPatch]) -> VfsResult<Vec<PropStat>> {
        let path = path::normalize(path)?;
        self.check_writable("proppatch", &path)?;

        let table = self.store.write();
        let entry = table
            .get(&path)
            .ok_or_else(|| VfsError::not_found(path.as_str()))?;
        let mut entry = entry.write();

        let stats: Vec<PropStat> = patches
            .iter()
            .map(|patch| PropStat {
                name: patch.name().clone(),
                status: entry.apply_patch(patch),
            })
            .collect();
        if stats.iter().any(|s| s.status == PropStatus::Ok) {
            entry.touch();
        }
        drop(entry);
        drop(table);

        tracing::info!(path = %path, patches = stats.len(), "properties patched");
        Ok(stats)
    }

    fn read_only(&self) -> bool {
        self.config.read_only
    }
}
