//! Shared contracts between the loop, the tool registry, and the model.
//!
//! These types define stable boundaries: what the model may propose, what a
//! tool execution yields, and how failures are serialized back into the
//! conversation. They carry no I/O and no behavior beyond formatting.

use std::fmt;

use serde_json::{Map, Value};

/// A tool invocation proposed by the model.
///
/// Arguments never include the working root; the dispatcher injects it and
/// every tool schema rejects unknown properties, so the model cannot redirect
/// the sandbox.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub args: Map<String, Value>,
}

/// Machine-readable declaration of one tool, consumed by the model to decide
/// what it may call. Configuration data, not logic.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDecl {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema for the argument object.
    pub parameters: Value,
}

/// One model response: a batch of tool calls, a final answer, or (degenerate)
/// neither.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelTurn {
    pub text: Option<String>,
    pub calls: Vec<ToolCall>,
}

impl ModelTurn {
    /// A final natural-language answer.
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            calls: Vec::new(),
        }
    }

    /// A batch of tool calls with no answer text.
    pub fn calls(calls: Vec<ToolCall>) -> Self {
        Self { text: None, calls }
    }
}

/// Classification of a tool failure, kept alongside the human-readable text
/// so tests and logs can check the failure mode without parsing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// Target path resolves outside the working root.
    Confinement,
    /// Target missing.
    NotFound,
    /// Target is not the expected kind (not a directory, wrong extension).
    WrongType,
    /// Underlying read/write/spawn error.
    Io,
    /// Subprocess exceeded the wall-clock limit.
    Timeout,
    /// Dispatcher received a name not in the catalog.
    UnknownTool,
    /// Arguments failed schema validation.
    BadArguments,
}

/// A tool failure. Serializes as `Error: {message}` so the model-facing
/// payload keeps the convention the prompt is written against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    kind: ToolErrorKind,
    message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn confinement(action: &str, path: &str) -> Self {
        Self::new(
            ToolErrorKind::Confinement,
            format!("Cannot {action} \"{path}\" as it is outside the permitted working directory"),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message)
    }

    pub fn wrong_type(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::WrongType, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Io, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, message)
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ToolErrorKind::UnknownTool, format!("Unknown tool: {name}"))
    }

    pub fn bad_arguments(tool: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            ToolErrorKind::BadArguments,
            format!("Invalid arguments for \"{tool}\": {detail}"),
        )
    }

    pub fn kind(&self) -> ToolErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)
    }
}

impl std::error::Error for ToolError {}

/// Outcome of one tool execution: success text or a classified failure.
/// Never crosses the dispatcher boundary as an error; the dispatcher collapses
/// both arms into a single payload string.
pub type ToolResult = Result<String, ToolError>;
