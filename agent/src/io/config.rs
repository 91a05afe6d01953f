//! Agent configuration stored as a TOML file next to the invocation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Agent configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum number of model/tool iterations before the run aborts.
    pub max_iterations: u32,

    /// Truncate `read_file` results beyond this many characters.
    pub read_char_cap: usize,

    /// Truncate captured subprocess stdout/stderr beyond this many bytes.
    pub process_output_limit_bytes: usize,

    pub script: ScriptConfig,

    pub model: ModelConfig,
}

/// Settings for the script-execution tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScriptConfig {
    /// Interpreter binary to spawn (e.g. `python3`).
    pub interpreter: String,
    /// Required file extension, without the leading dot.
    pub extension: String,
    /// Wall-clock limit for one script run.
    pub timeout_secs: u64,
}

/// Settings for the model collaborator transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier passed to the generateContent endpoint.
    pub name: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Overall timeout for one model request.
    pub http_timeout_secs: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            extension: "py".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.0-flash-001".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            http_timeout_secs: 120,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            read_char_cap: 10_000,
            process_output_limit_bytes: 1_000_000,
            script: ScriptConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be > 0"));
        }
        if self.read_char_cap == 0 {
            return Err(anyhow!("read_char_cap must be > 0"));
        }
        if self.process_output_limit_bytes == 0 {
            return Err(anyhow!("process_output_limit_bytes must be > 0"));
        }
        if self.script.interpreter.trim().is_empty() {
            return Err(anyhow!("script.interpreter must be non-empty"));
        }
        if self.script.extension.trim().is_empty() || self.script.extension.starts_with('.') {
            return Err(anyhow!(
                "script.extension must be non-empty and carry no leading dot"
            ));
        }
        if self.script.timeout_secs == 0 {
            return Err(anyhow!("script.timeout_secs must be > 0"));
        }
        if self.model.name.trim().is_empty() {
            return Err(anyhow!("model.name must be non-empty"));
        }
        if self.model.api_key_env.trim().is_empty() {
            return Err(anyhow!("model.api_key_env must be non-empty"));
        }
        if self.model.http_timeout_secs == 0 {
            return Err(anyhow!("model.http_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AgentConfig::default()`.
pub fn load_config(path: &Path) -> Result<AgentConfig> {
    if !path.exists() {
        let cfg = AgentConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AgentConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AgentConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
