//! The `run_script` tool: execute an interpretable script inside the
//! workspace.

use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::core::types::{ToolError, ToolResult};
use crate::io::config::ScriptConfig;
use crate::io::process::run_command_with_timeout;
use crate::io::workspace::WorkspaceRoot;

/// Fixed payload for a clean run that produced nothing on either stream, so
/// the model can tell "ran, produced nothing" from "failed to run".
pub const NO_OUTPUT: &str = "No output produced.";

/// Run `file_path` under the configured interpreter with `args` forwarded.
///
/// The child's working directory is the confined root, so the script's own
/// relative file access stays inside the sandbox. Stdout and stderr are
/// captured separately (bounded by `output_limit_bytes`); the wall-clock
/// timeout kills the child and discards its output.
#[instrument(skip(root, config, output_limit_bytes))]
pub fn run(
    root: &WorkspaceRoot,
    config: &ScriptConfig,
    output_limit_bytes: usize,
    file_path: &str,
    args: &[String],
) -> ToolResult {
    let script = root
        .confine(file_path)
        .map_err(|_| ToolError::confinement("execute", file_path))?;
    if !script.is_file() {
        return Err(ToolError::not_found(format!(
            "File \"{file_path}\" not found."
        )));
    }
    let expected = format!(".{}", config.extension);
    if !file_path.ends_with(&expected) {
        return Err(ToolError::wrong_type(format!(
            "\"{file_path}\" is not a {expected} script"
        )));
    }

    let mut cmd = Command::new(&config.interpreter);
    cmd.arg(&script).args(args).current_dir(root.path());

    let timeout = Duration::from_secs(config.timeout_secs);
    let output = run_command_with_timeout(cmd, timeout, output_limit_bytes).map_err(|err| {
        ToolError::io(format!("executing \"{file_path}\": {err:#}"))
    })?;

    if output.timed_out {
        warn!(timeout_secs = config.timeout_secs, "script timed out");
        return Err(ToolError::timeout(format!(
            "executing \"{file_path}\": process timed out after {} seconds",
            config.timeout_secs
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut sections = Vec::new();
    if !stdout.trim().is_empty() {
        sections.push(format!(
            "STDOUT:\n{}{}",
            stdout.trim(),
            output.stdout_truncated_notice()
        ));
    }
    if !stderr.trim().is_empty() {
        sections.push(format!(
            "STDERR:\n{}{}",
            stderr.trim(),
            output.stderr_truncated_notice()
        ));
    }
    if let Some(code) = output.status.code()
        && code != 0
    {
        sections.push(format!("Process exited with code {code}"));
    }
    if sections.is_empty() {
        debug!("script produced no output");
        return Ok(NO_OUTPUT.to_string());
    }
    Ok(sections.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ToolErrorKind;
    use std::fs;

    // Tests drive `sh` scripts so they do not depend on a Python toolchain.
    fn sh_config(timeout_secs: u64) -> ScriptConfig {
        ScriptConfig {
            interpreter: "sh".to_string(),
            extension: "sh".to_string(),
            timeout_secs,
        }
    }

    fn workspace() -> (tempfile::TempDir, WorkspaceRoot) {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = WorkspaceRoot::new(temp.path()).expect("workspace root");
        (temp, root)
    }

    #[test]
    fn clean_silent_run_returns_no_output_sentinel() {
        let (_temp, root) = workspace();
        fs::write(root.path().join("quiet.sh"), "exit 0\n").expect("write script");

        let result = run(&root, &sh_config(5), 10_000, "quiet.sh", &[]).expect("run");
        assert_eq!(result, NO_OUTPUT);
    }

    #[test]
    fn stdout_and_nonzero_exit_are_reported() {
        let (_temp, root) = workspace();
        fs::write(root.path().join("noisy.sh"), "echo X\nexit 1\n").expect("write script");

        let result = run(&root, &sh_config(5), 10_000, "noisy.sh", &[]).expect("run");
        assert!(result.contains("STDOUT:\nX"));
        assert!(result.contains("Process exited with code 1"));
    }

    #[test]
    fn stderr_is_reported_in_its_own_section() {
        let (_temp, root) = workspace();
        fs::write(root.path().join("warn.sh"), "echo oops >&2\n").expect("write script");

        let result = run(&root, &sh_config(5), 10_000, "warn.sh", &[]).expect("run");
        assert!(result.contains("STDERR:\noops"));
        assert!(!result.contains("STDOUT:"));
        assert!(!result.contains("exited with code"));
    }

    #[test]
    fn arguments_are_forwarded_in_order() {
        let (_temp, root) = workspace();
        fs::write(root.path().join("args.sh"), "echo \"$1-$2\"\n").expect("write script");

        let args = vec!["first".to_string(), "second".to_string()];
        let result = run(&root, &sh_config(5), 10_000, "args.sh", &args).expect("run");
        assert!(result.contains("STDOUT:\nfirst-second"));
    }

    #[test]
    fn script_cwd_is_the_workspace_root() {
        let (_temp, root) = workspace();
        fs::write(root.path().join("here.sh"), "pwd\n").expect("write script");

        let result = run(&root, &sh_config(5), 10_000, "here.sh", &[]).expect("run");
        let expected = format!("STDOUT:\n{}", root.path().display());
        assert!(result.starts_with(&expected));
    }

    #[test]
    fn missing_script_is_not_found() {
        let (_temp, root) = workspace();
        let err = run(&root, &sh_config(5), 10_000, "absent.sh", &[]).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::NotFound);
        assert_eq!(err.to_string(), "Error: File \"absent.sh\" not found.");
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let (_temp, root) = workspace();
        fs::write(root.path().join("data.txt"), "echo nope\n").expect("write");

        let err = run(&root, &sh_config(5), 10_000, "data.txt", &[]).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::WrongType);
        assert_eq!(err.to_string(), "Error: \"data.txt\" is not a .sh script");
    }

    #[test]
    fn escaping_path_is_rejected() {
        let (_temp, root) = workspace();
        let err = run(&root, &sh_config(5), 10_000, "../evil.sh", &[]).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::Confinement);
    }

    #[test]
    fn timeout_discards_partial_output() {
        let (_temp, root) = workspace();
        fs::write(root.path().join("slow.sh"), "echo early\nsleep 5\n").expect("write script");

        let err = run(&root, &sh_config(1), 10_000, "slow.sh", &[]).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::Timeout);
        assert!(err.to_string().contains("timed out after 1 seconds"));
        assert!(!err.to_string().contains("early"));
    }

    #[test]
    fn missing_interpreter_collapses_to_io_failure() {
        let (_temp, root) = workspace();
        fs::write(root.path().join("s.sh"), "exit 0\n").expect("write script");

        let config = ScriptConfig {
            interpreter: "no-such-interpreter-9876".to_string(),
            extension: "sh".to_string(),
            timeout_secs: 5,
        };
        let err = run(&root, &config, 10_000, "s.sh", &[]).unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::Io);
        assert!(err.to_string().starts_with("Error: executing \"s.sh\""));
    }
}
