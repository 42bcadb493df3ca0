//! Pure path helpers.
//!
//! Paths in the store are absolute, `/`-separated strings with no trailing
//! slash (except the root itself). These helpers never touch the store.

use crate::error::{VfsError, VfsResult};

/// The root path.
pub const ROOT: &str = "/";

/// Normalize a path: trim whitespace, add the leading `/`, collapse repeated
/// separators, drop trailing `/` and `.` segments.
///
/// `..` is resolved against the path built so far; climbing above the root is
/// rejected with `InvalidArgument`.
pub fn normalize(path: &str) -> VfsResult<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(VfsError::invalid_argument("empty path"));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(VfsError::invalid_argument(format!(
                        "path escapes root: {}",
                        trimmed
                    )));
                }
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        Ok(ROOT.to_string())
    } else {
        Ok(format!("/{}", segments.join("/")))
    }
}

/// Returns true for the root path.
pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// Parent of a normalized path. `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if is_root(path) {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => Some(ROOT),
    }
}

/// Final path segment. Empty for the root.
pub fn base_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// True if `path` lies strictly below `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if is_root(ancestor) {
        return !is_root(path) && path.starts_with('/');
    }
    path.len() > ancestor.len() + 1
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Ancestors of `path`, shallowest first, root excluded.
///
/// `ancestors("/a/b/c")` yields `/a` then `/a/b`.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/')
        .map(|(idx, _)| idx)
        .filter(|&idx| idx > 0)
        .map(move |idx| &path[..idx])
}

/// Join a child name onto a directory path.
pub fn join(dir: &str, name: &str) -> String {
    if is_root(dir) {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// The direct child of `dir` on the way to `descendant`.
///
/// `child_toward("/a", "/a/b/c")` is `/a/b`. `descendant` must lie below `dir`.
pub fn child_toward<'a>(dir: &str, descendant: &'a str) -> &'a str {
    let start = if is_root(dir) { 1 } else { dir.len() + 1 };
    match descendant[start..].find('/') {
        Some(idx) => &descendant[..start + idx],
        None => descendant,
    }
}

/// Replace the `from` prefix of `path` with `to`.
///
/// `path` must equal `from` or be a descendant of it.
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    if path == from {
        return to.to_string();
    }
    let rest = if is_root(from) {
        &path[1..]
    } else {
        &path[from.len() + 1..]
    };
    join(to, rest)
}
