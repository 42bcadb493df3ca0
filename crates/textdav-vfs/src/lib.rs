//! # textdav-vfs
//!
//! In-memory virtual filesystem behind a WebDAV-style server.
//!
//! The hierarchy is seeded from a text manifest of file declarations and
//! lives entirely in memory:
//! - Every path maps to one [`Entry`], file or directory
//! - Missing ancestors are synthesized as directories, so the hierarchy is
//!   always closed under "parent of"
//! - File content is synthetic until the first write materializes it
//! - Open [`SessionHandle`]s share the live entry node, so they observe
//!   renames and writes
//!
//! The protocol engine drives everything through the [`DavFs`] trait.

pub mod config;
pub mod entry;
pub mod error;
pub mod fs;
pub mod handle;
pub mod manifest;
pub mod ops;
pub mod path;
pub mod props;
pub mod store;
pub mod synth;
pub mod types;

pub use config::VfsConfig;
pub use entry::{Entry, EntryRef, MAX_MATERIALIZED_LEN, synthetic_content};
pub use error::{ManifestError, VfsError, VfsResult};
pub use fs::VirtualFs;
pub use handle::{SessionHandle, SessionId};
pub use manifest::{Declaration, Manifest};
pub use ops::DavFs;
pub use props::{
    DAV_NS, PropName, PropPatch, PropStat, PropStatus, PropValue, Property, PropertyMap, http_date,
};
pub use store::{EntryStore, Table};
pub use synth::LoadSummary;
pub use types::{DirEntry, FileAttr, FileType, OpenFlags, ReadOutcome};
