//! The capability surface a protocol engine drives.
//!
//! All operations are path-based and synchronous; none of them suspend, so
//! an async engine can call them directly from its request tasks.

use crate::handle::SessionHandle;
use crate::props::{PropPatch, PropStat, Property};
use crate::types::{DirEntry, FileAttr, OpenFlags};
use crate::VfsResult;

/// Core filesystem capabilities.
///
/// Paths are absolute; implementations normalize them (a missing leading
/// `/` is supplied).
pub trait DavFs: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get attributes.
    ///
    /// A path with no entry of its own but with descendants is reported as a
    /// directory of size 0.
    fn stat(&self, path: &str) -> VfsResult<FileAttr>;

    /// Direct children of a directory, sorted by path.
    fn list_children(&self, path: &str) -> VfsResult<Vec<DirEntry>>;

    /// All properties, `DAV:displayname` first.
    fn read_properties(&self, path: &str) -> VfsResult<Vec<Property>>;

    // ========================================================================
    // Handles
    // ========================================================================

    /// Open a session handle, creating a file when `flags.create` is set.
    fn open(&self, path: &str, flags: OpenFlags) -> VfsResult<SessionHandle>;

    // ========================================================================
    // Structural mutations
    // ========================================================================

    /// Create a directory, synthesizing missing ancestors.
    fn mkdir(&self, path: &str) -> VfsResult<FileAttr>;

    /// Remove an entry and everything below it. Returns the number removed.
    fn remove_subtree(&self, path: &str) -> VfsResult<usize>;

    /// Move a file, or a directory with its whole subtree.
    fn rename(&self, from: &str, to: &str) -> VfsResult<()>;

    /// Apply property patches in order, one status per patch.
    fn patch_properties(&self, path: &str, patches: &[PropPatch]) -> VfsResult<Vec<PropStat>>;

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Returns true if mutations are refused.
    fn read_only(&self) -> bool;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists.
    fn exists(&self, path: &str) -> bool {
        self.stat(path).is_ok()
    }

    /// Read entire file contents.
    fn read_all(&self, path: &str) -> VfsResult<Vec<u8>> {
        let mut handle = self.open(path, OpenFlags::read())?;
        let data = handle.read_to_end()?;
        handle.close()?;
        Ok(data)
    }
}
