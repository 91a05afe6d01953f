//! Test-only helpers: scripted models and workspace fixtures.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use crate::core::conversation::Conversation;
use crate::core::types::{ModelTurn, ToolCall, ToolDecl};
use crate::io::config::{AgentConfig, ScriptConfig};
use crate::io::model::Model;

/// Build a tool call from a JSON argument object.
pub fn call(name: &str, args: Value) -> ToolCall {
    let Value::Object(args) = args else {
        panic!("tool call args must be a JSON object");
    };
    ToolCall {
        name: name.to_string(),
        args,
    }
}

/// Config with the script tool pointed at `sh`, so tests do not depend on a
/// Python toolchain.
pub fn sh_test_config() -> AgentConfig {
    AgentConfig {
        script: ScriptConfig {
            interpreter: "sh".to_string(),
            extension: "sh".to_string(),
            timeout_secs: 5,
        },
        ..AgentConfig::default()
    }
}

/// Model that replays a fixed queue of turns. Running past the end of the
/// script is a test bug and surfaces as a fatal error, like any other
/// collaborator protocol failure.
#[derive(Debug)]
pub struct ScriptedModel {
    turns: Mutex<VecDeque<ModelTurn>>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<ModelTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
        }
    }
}

impl Model for ScriptedModel {
    fn propose(&self, _conversation: &Conversation, _tools: &[ToolDecl]) -> Result<ModelTurn> {
        self.turns
            .lock()
            .expect("scripted model lock")
            .pop_front()
            .ok_or_else(|| anyhow!("scripted model exhausted"))
    }
}

/// Model that proposes the same harmless tool call forever; used to exercise
/// budget exhaustion.
#[derive(Debug, Default)]
pub struct EndlessCaller;

impl Model for EndlessCaller {
    fn propose(&self, _conversation: &Conversation, _tools: &[ToolDecl]) -> Result<ModelTurn> {
        Ok(ModelTurn::calls(vec![call("list_directory", json!({}))]))
    }
}
