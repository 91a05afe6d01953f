//! Git adapter backing the `git_commit_push` tool.
//!
//! A small, explicit wrapper around `git` subprocess calls; the tool stages
//! everything, commits with the model-supplied message, and pushes the main
//! branch.

use std::path::PathBuf;
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::core::types::{ToolError, ToolResult};
use crate::io::workspace::WorkspaceRoot;

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Stage all changes (respects .gitignore).
    pub fn add_all(&self) -> Result<()> {
        self.run_checked(&["add", "-A"])?;
        Ok(())
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run(&["diff", "--cached", "--name-only"])?;
        Ok(!String::from_utf8_lossy(&out.stdout).trim().is_empty())
    }

    /// Commit staged changes with a message.
    ///
    /// If there are no staged changes, this returns Ok(false) and does
    /// nothing.
    #[instrument(skip_all)]
    pub fn commit_staged(&self, message: &str) -> Result<bool> {
        if !self.has_staged_changes()? {
            debug!("no staged changes, skipping commit");
            return Ok(false);
        }
        debug!("committing staged changes");
        self.run_checked(&["commit", "-m", message])?;
        Ok(true)
    }

    /// Push the main branch to origin.
    pub fn push_main(&self) -> Result<()> {
        self.run_checked(&["push", "origin", "main"])?;
        Ok(())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

/// Stage all changes in the workspace, commit with `message`, and push to
/// `origin main`. Any git failure collapses into a tool-visible failure.
#[instrument(skip(root))]
pub fn commit_push(root: &WorkspaceRoot, message: &str) -> ToolResult {
    let git = Git::new(root.path());
    let committed = stage_and_commit(&git, message)
        .map_err(|err| ToolError::io(format!("git commit failed: {err:#}")))?;
    if !committed {
        return Ok("No changes to commit.".to_string());
    }
    git.push_main()
        .map_err(|err| ToolError::io(format!("git push failed: {err:#}")))?;
    Ok("Successfully committed and pushed all changes to the main branch.".to_string())
}

fn stage_and_commit(git: &Git, message: &str) -> Result<bool> {
    git.add_all()?;
    git.commit_staged(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ToolErrorKind;

    #[test]
    fn commit_push_outside_a_repo_is_a_tool_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = WorkspaceRoot::new(temp.path()).expect("workspace root");

        let err = commit_push(&root, "chore: test").unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::Io);
        assert!(err.to_string().starts_with("Error: git commit failed"));
    }
}
