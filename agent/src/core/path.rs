//! Lexical resolution of tool-supplied paths under a fixed root.

use std::path::{Component, Path, PathBuf};

/// Resolve `relative` against `root` without touching the filesystem.
///
/// `.` components are dropped and `..` pops the accumulated path, so a path
/// with enough `..` segments resolves to an ancestor of `root` (and will fail
/// the caller's containment check). Absolute inputs are taken as-is rather
/// than joined. An empty input resolves to `root` itself.
pub fn resolve_under(root: &Path, relative: &str) -> PathBuf {
    let candidate = Path::new(relative);
    let mut resolved = if candidate.is_absolute() {
        PathBuf::new()
    } else {
        root.to_path_buf()
    };
    for component in candidate.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::RootDir => resolved.push(std::path::MAIN_SEPARATOR_STR),
            Component::Prefix(prefix) => resolved.push(prefix.as_os_str()),
            Component::Normal(part) => resolved.push(part),
        }
    }
    resolved
}
