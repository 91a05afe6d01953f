//! File operations over the confined workspace: list, read, write.
//!
//! Every operation consults [`WorkspaceRoot::confine`] first and collapses
//! underlying I/O failures into tool-visible results; nothing here raises
//! past the dispatcher boundary.

use std::fs;

use tracing::{debug, instrument};

use crate::core::types::{ToolError, ToolResult};
use crate::io::workspace::WorkspaceRoot;

/// List the direct children of `directory` (non-recursive), one line per
/// entry with name, byte size, and directory flag. Iteration order follows
/// the underlying directory listing and is not guaranteed stable.
#[instrument(skip(root))]
pub fn list(root: &WorkspaceRoot, directory: &str) -> ToolResult {
    let dir = root
        .confine(directory)
        .map_err(|_| ToolError::confinement("list", directory))?;
    if !dir.is_dir() {
        return Err(ToolError::wrong_type(format!(
            "\"{directory}\" is not a directory"
        )));
    }
    let entries = fs::read_dir(&dir)
        .map_err(|err| ToolError::io(format!("Cannot list \"{directory}\": {err}")))?;
    let mut lines = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|err| ToolError::io(format!("Cannot list \"{directory}\": {err}")))?;
        let meta = entry
            .metadata()
            .map_err(|err| ToolError::io(format!("Cannot list \"{directory}\": {err}")))?;
        lines.push(format!(
            "- {}: file_size={} bytes, is_dir={}",
            entry.file_name().to_string_lossy(),
            meta.len(),
            meta.is_dir()
        ));
    }
    debug!(entries = lines.len(), "listed directory");
    Ok(lines.join("\n"))
}

/// Read `file_path` as text, truncating beyond `char_cap` characters.
///
/// Truncated content carries an explicit marker naming the file and the cap,
/// so callers can detect truncation from the returned text alone. All open
/// and decode failures collapse into one descriptive failure.
#[instrument(skip(root, char_cap))]
pub fn read(root: &WorkspaceRoot, file_path: &str, char_cap: usize) -> ToolResult {
    let file = root
        .confine(file_path)
        .map_err(|_| ToolError::confinement("read", file_path))?;
    let mut content = fs::read_to_string(&file)
        .map_err(|err| ToolError::io(format!("Cannot read \"{file_path}\": {err}")))?;
    if let Some((cut, _)) = content.char_indices().nth(char_cap) {
        content.truncate(cut);
        content.push_str(&format!(
            "\n[...File \"{file_path}\" truncated at {char_cap} characters]"
        ));
        debug!(cap = char_cap, "read truncated");
    }
    Ok(content)
}

/// Write `content` to `file_path`, creating missing parent directories and
/// overwriting any existing file. No atomicity guarantee: a crash mid-write
/// may leave a partial file.
#[instrument(skip(root, content))]
pub fn write(root: &WorkspaceRoot, file_path: &str, content: &str) -> ToolResult {
    let file = root
        .confine(file_path)
        .map_err(|_| ToolError::confinement("write to", file_path))?;
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| ToolError::io(format!("Cannot write to \"{file_path}\": {err}")))?;
    }
    fs::write(&file, content)
        .map_err(|err| ToolError::io(format!("Cannot write to \"{file_path}\": {err}")))?;
    let written = content.chars().count();
    debug!(characters = written, "wrote file");
    Ok(format!(
        "Successfully wrote to \"{file_path}\" ({written} characters written)"
    ))
}
