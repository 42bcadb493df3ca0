//! Directory synthesis: keeps every ancestor of a declared path present.
//!
//! All functions here operate on a [`Table`] the caller already holds
//! exclusively, so a whole load or create is one atomic step for readers.

use std::collections::HashMap;

use crate::entry::Entry;
use crate::error::{VfsError, VfsResult};
use crate::manifest::Declaration;
use crate::path::{self, ROOT};
use crate::store::Table;
use crate::types::FileType;

/// What a bulk load inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// File entries inserted or replaced.
    pub files: usize,
    /// Directory entries synthesized (ancestors and root).
    pub directories: usize,
}

/// Create every missing ancestor of `path` as a directory, shallowest first.
///
/// Fails with `InvalidOperation` if an ancestor exists as a file; nothing is
/// created in that case.
pub fn ensure_ancestors(table: &mut Table, path: &str) -> VfsResult<usize> {
    for ancestor in path::ancestors(path) {
        if let Some(existing) = table.get(ancestor) {
            if !existing.read().is_dir() {
                return Err(VfsError::invalid_operation(format!(
                    "{} is a file, cannot hold {}",
                    ancestor, path
                )));
            }
        }
    }

    let mut created = 0;
    for ancestor in path::ancestors(path) {
        if !table.contains(ancestor) {
            table.put(ancestor, Entry::directory(ancestor).into_ref());
            created += 1;
        }
    }
    Ok(created)
}

/// Synthesize `/` if absent. Returns true if it was created.
pub fn ensure_root(table: &mut Table) -> bool {
    if table.contains(ROOT) {
        return false;
    }
    table.put(ROOT, Entry::directory(ROOT).into_ref());
    true
}

/// Apply manifest declarations atomically.
///
/// Every declaration is checked against the table plus the declarations
/// before it; only if all of them fit is anything inserted.
pub fn apply_declarations(table: &mut Table, declarations: &[Declaration]) -> VfsResult<LoadSummary> {
    validate(table, declarations)?;

    let mut summary = LoadSummary::default();
    for decl in declarations {
        summary.directories += ensure_ancestors(table, &decl.path)?;
        let entry = Entry::file(decl.path.as_str(), decl.size, decl.display_name.as_deref());
        table.put(decl.path.as_str(), entry.into_ref());
        summary.files += 1;
    }
    if ensure_root(table) {
        summary.directories += 1;
    }
    Ok(summary)
}

/// Dry-run the kind checks of [`apply_declarations`].
fn validate(table: &Table, declarations: &[Declaration]) -> VfsResult<()> {
    let mut staged: HashMap<&str, FileType> = HashMap::new();
    let kind_of = |staged: &HashMap<&str, FileType>, p: &str| {
        staged
            .get(p)
            .copied()
            .or_else(|| table.get(p).map(|e| e.read().kind()))
    };

    for decl in declarations {
        for ancestor in path::ancestors(&decl.path) {
            match kind_of(&staged, ancestor) {
                Some(FileType::File) => {
                    return Err(VfsError::invalid_operation(format!(
                        "line {}: {} is a file, cannot hold {}",
                        decl.line, ancestor, decl.path
                    )));
                }
                Some(FileType::Directory) => {}
                None => {
                    staged.insert(ancestor, FileType::Directory);
                }
            }
        }
        if kind_of(&staged, &decl.path) == Some(FileType::Directory) {
            return Err(VfsError::invalid_operation(format!(
                "line {}: {} is a directory",
                decl.line, decl.path
            )));
        }
        staged.insert(decl.path.as_str(), FileType::File);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;

    #[test]
    fn test_ensure_ancestors() {
        let mut table = Table::default();
        let created = ensure_ancestors(&mut table, "/a/b/c.txt").unwrap();
        assert_eq!(created, 2);
        assert!(table.get("/a").unwrap().read().is_dir());
        assert_eq!(table.get("/a/b").unwrap().read().display_name(), "b");
        assert!(!table.contains("/a/b/c.txt"));

        assert_eq!(ensure_ancestors(&mut table, "/a/b/d.txt").unwrap(), 0);
    }

    #[test]
    fn test_ancestor_file_conflict() {
        let mut table = Table::default();
        table.put("/a", Entry::file("/a", 1, None).into_ref());
        let err = ensure_ancestors(&mut table, "/a/b/c").unwrap_err();
        assert!(matches!(err, VfsError::InvalidOperation(_)));
        assert!(!table.contains("/a/b"));
    }

    #[test]
    fn test_apply_declarations() {
        let mut table = Table::default();
        let manifest = Manifest::parse("/docs/readme.txt#128#Notes\n/top.bin#4").unwrap();
        let summary = apply_declarations(&mut table, manifest.declarations()).unwrap();
        assert_eq!(summary, LoadSummary { files: 2, directories: 2 });
        assert_eq!(table.paths(), vec!["/", "/docs", "/docs/readme.txt", "/top.bin"]);
        assert_eq!(table.get("/").unwrap().read().display_name(), "");
    }

    #[test]
    fn test_apply_is_atomic() {
        let mut table = Table::default();
        let manifest = Manifest::parse("/a/x.txt#1\n/b.txt#2\n/a/x.txt/y#3").unwrap();
        let err = apply_declarations(&mut table, manifest.declarations()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
        assert!(table.is_empty());
    }

    #[test]
    fn test_redeclare_file_overwrites() {
        let mut table = Table::default();
        let manifest = Manifest::parse("/a.txt#1#One\n/a.txt#9#Nine").unwrap();
        apply_declarations(&mut table, manifest.declarations()).unwrap();
        let entry = table.get("/a.txt").unwrap().read();
        assert_eq!(entry.size(), 9);
        assert_eq!(entry.display_name(), "Nine");
    }
}
