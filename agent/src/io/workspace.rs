//! The confined working root every tool operates under.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::core::path::resolve_under;

/// Marker for a path that resolves outside the workspace root. Callers
/// translate this into a tool-visible failure with an operation-specific
/// message; it never crosses the dispatcher boundary as a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEscape;

/// The sole confinement boundary for every tool.
///
/// Holds the canonical absolute form of the working root, established once at
/// startup and immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct WorkspaceRoot {
    root: PathBuf,
}

impl WorkspaceRoot {
    /// Canonicalize `dir` as the working root. The directory must exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let root = fs::canonicalize(dir)
            .with_context(|| format!("resolve working root {}", dir.display()))?;
        if !root.is_dir() {
            return Err(anyhow!("working root {} is not a directory", root.display()));
        }
        debug!(root = %root.display(), "workspace root established");
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` against the root and admit it only if it stays
    /// inside.
    ///
    /// Resolution is lexical first (`.` dropped, `..` popped), then the
    /// deepest existing ancestor of the candidate is canonicalized so a
    /// symlink inside the root cannot point the path outside. Safe to call
    /// for targets that do not exist yet (writes); the root itself (`"."` or
    /// `""`) is always admitted.
    pub fn confine(&self, relative: &str) -> Result<PathBuf, PathEscape> {
        let lexical = resolve_under(&self.root, relative);
        let resolved = resolve_existing_ancestor(&lexical);
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            debug!(path = relative, resolved = %resolved.display(), "path escapes workspace");
            Err(PathEscape)
        }
    }
}

/// Canonicalize the deepest existing ancestor of `path` and re-attach the
/// non-existing suffix. Leaves the path untouched when nothing of it exists.
fn resolve_existing_ancestor(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut suffix: Vec<std::ffi::OsString> = Vec::new();
    loop {
        if let Ok(mut base) = fs::canonicalize(existing) {
            for part in suffix.iter().rev() {
                base.push(part);
            }
            return base;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                suffix.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> (tempfile::TempDir, WorkspaceRoot) {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = WorkspaceRoot::new(temp.path()).expect("workspace root");
        (temp, root)
    }

    #[test]
    fn missing_root_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("absent");
        assert!(WorkspaceRoot::new(&missing).is_err());
    }

    #[test]
    fn root_itself_is_admitted() {
        let (_temp, root) = workspace();
        assert_eq!(root.confine("").expect("empty"), root.path());
        assert_eq!(root.confine(".").expect("dot"), root.path());
    }

    #[test]
    fn inside_paths_are_admitted_before_they_exist() {
        let (_temp, root) = workspace();
        let confined = root.confine("sub/dir/new.txt").expect("confine");
        assert_eq!(confined, root.path().join("sub/dir/new.txt"));
    }

    #[test]
    fn parent_escapes_are_rejected() {
        let (_temp, root) = workspace();
        assert_eq!(root.confine(".."), Err(PathEscape));
        assert_eq!(root.confine("../sibling"), Err(PathEscape));
        assert_eq!(root.confine("a/b/../../../outside"), Err(PathEscape));
    }

    #[test]
    fn dotdot_that_stays_inside_is_admitted() {
        let (_temp, root) = workspace();
        let confined = root.confine("a/../b.txt").expect("confine");
        assert_eq!(confined, root.path().join("b.txt"));
    }

    #[test]
    fn absolute_path_outside_is_rejected() {
        let (_temp, root) = workspace();
        assert_eq!(root.confine("/etc/passwd"), Err(PathEscape));
    }

    #[test]
    fn absolute_path_inside_is_admitted() {
        let (_temp, root) = workspace();
        let inside = root.path().join("file.txt");
        let confined = root
            .confine(inside.to_str().expect("utf8 path"))
            .expect("confine");
        assert_eq!(confined, inside);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_rejected() {
        let outside = tempfile::tempdir().expect("outside dir");
        let secret = outside.path().join("secret.txt");
        fs::write(&secret, "secret").expect("write secret");

        let (_temp, root) = workspace();
        std::os::unix::fs::symlink(&secret, root.path().join("link.txt")).expect("symlink");

        assert_eq!(root.confine("link.txt"), Err(PathEscape));
    }
}
