//! The fixed tool catalog and its dispatcher.
//!
//! Every operation the model may request is declared here with a JSON-Schema
//! argument description; dispatch validates the model-supplied arguments
//! against the schema, injects the working root, and collapses every failure
//! into a single payload string so an implementation fault can never crash
//! the loop.

use anyhow::{Context, Result};
use jsonschema::{Draft, Validator};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::core::types::{ToolCall, ToolDecl, ToolError, ToolResult};
use crate::io::config::AgentConfig;
use crate::io::workspace::WorkspaceRoot;
use crate::io::{file_store, git, script};

/// Fixed catalog of tools, bound to one working root and one configuration
/// for the process lifetime. The root is injected at construction and never
/// accepted from the model.
pub struct ToolRegistry {
    root: WorkspaceRoot,
    config: AgentConfig,
    decls: Vec<ToolDecl>,
    validators: Vec<Validator>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("root", &self.root)
            .field("tools", &self.decls.iter().map(|d| d.name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    pub fn new(root: WorkspaceRoot, config: AgentConfig) -> Result<Self> {
        let decls = catalog();
        let validators = decls
            .iter()
            .map(|decl| {
                jsonschema::options()
                    .with_draft(Draft::Draft202012)
                    .build(&decl.parameters)
                    .with_context(|| format!("compile argument schema for {}", decl.name))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            root,
            config,
            decls,
            validators,
        })
    }

    /// Machine-readable declarations for the model collaborator.
    pub fn declarations(&self) -> &[ToolDecl] {
        &self.decls
    }

    /// Execute one model-proposed call and collapse the outcome into a single
    /// payload string. Never fails: unknown names, invalid arguments, and
    /// implementation errors all come back as `Error:` payloads.
    #[instrument(skip_all, fields(tool = %call.name))]
    pub fn dispatch(&self, call: &ToolCall) -> String {
        let result = self.try_dispatch(call);
        match result {
            Ok(payload) => payload,
            Err(err) => {
                debug!(kind = ?err.kind(), "tool call failed");
                err.to_string()
            }
        }
    }

    fn try_dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(index) = self.decls.iter().position(|decl| decl.name == call.name) else {
            return Err(ToolError::unknown_tool(&call.name));
        };
        self.validate_args(index, call)?;
        let args = &call.args;
        match call.name.as_str() {
            "list_directory" => {
                let directory = string_arg(args, "directory").unwrap_or(".");
                file_store::list(&self.root, directory)
            }
            "read_file" => {
                let file_path = required_string(call, args, "file_path")?;
                file_store::read(&self.root, file_path, self.config.read_char_cap)
            }
            "write_file" => {
                let file_path = required_string(call, args, "file_path")?;
                let content = required_string(call, args, "content")?;
                file_store::write(&self.root, file_path, content)
            }
            "run_script" => {
                let file_path = required_string(call, args, "file_path")?;
                let script_args = string_array_arg(args, "args");
                script::run(
                    &self.root,
                    &self.config.script,
                    self.config.process_output_limit_bytes,
                    file_path,
                    &script_args,
                )
            }
            "git_commit_push" => {
                let message = required_string(call, args, "message")?;
                git::commit_push(&self.root, message)
            }
            other => Err(ToolError::unknown_tool(other)),
        }
    }

    fn validate_args(&self, index: usize, call: &ToolCall) -> Result<(), ToolError> {
        let instance = Value::Object(call.args.clone());
        let messages: Vec<String> = self.validators[index]
            .iter_errors(&instance)
            .map(|err| err.to_string())
            .collect();
        if messages.is_empty() {
            Ok(())
        } else {
            Err(ToolError::bad_arguments(&call.name, messages.join("; ")))
        }
    }
}

fn string_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn required_string<'a>(
    call: &ToolCall,
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a str, ToolError> {
    string_arg(args, key)
        .ok_or_else(|| ToolError::bad_arguments(&call.name, format!("missing \"{key}\"")))
}

fn string_array_arg(args: &Map<String, Value>, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The fixed tool catalog. Descriptions are consumed by the model to decide
/// what it may call; schemas reject unknown properties so the working root
/// cannot be overridden from the model side.
fn catalog() -> Vec<ToolDecl> {
    vec![
        ToolDecl {
            name: "list_directory",
            description: "Lists files in the specified directory along with their sizes, \
                          constrained to the working directory.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "The directory to list files from, relative to the \
                                        working directory. If not provided, lists files in \
                                        the working directory itself.",
                    },
                },
                "additionalProperties": false,
            }),
        },
        ToolDecl {
            name: "read_file",
            description: "Reads the contents of a file, constrained to the working \
                          directory. Truncates output if the file is too large.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the file to read, relative to the \
                                        working directory.",
                    },
                },
                "required": ["file_path"],
                "additionalProperties": false,
            }),
        },
        ToolDecl {
            name: "write_file",
            description: "Writes content to a file, creating it if it does not exist, \
                          constrained to the working directory.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the file to write to, relative to the \
                                        working directory.",
                    },
                    "content": {
                        "type": "string",
                        "description": "The content to write to the file.",
                    },
                },
                "required": ["file_path", "content"],
                "additionalProperties": false,
            }),
        },
        ToolDecl {
            name: "run_script",
            description: "Executes a script file with optional arguments, constrained to \
                          the working directory.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The path to the script to execute, relative to the \
                                        working directory.",
                    },
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Arguments passed to the script, in order.",
                    },
                },
                "required": ["file_path"],
                "additionalProperties": false,
            }),
        },
        ToolDecl {
            name: "git_commit_push",
            description: "Stages all changes, commits with a message, and pushes to the \
                          main branch.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The commit message to use.",
                    },
                },
                "required": ["message"],
                "additionalProperties": false,
            }),
        },
    ]
}
