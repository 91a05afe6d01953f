//! Model collaborator abstraction.
//!
//! The [`Model`] trait decouples the agent loop from the actual language
//! model backend (currently Gemini over HTTP). Tests use scripted models
//! that return predetermined turns without touching the network.

use anyhow::Result;

use crate::core::conversation::Conversation;
use crate::core::types::{ModelTurn, ToolDecl};

/// Abstraction over language-model backends.
///
/// Given the accumulated conversation and the tool catalog, propose the next
/// step: one or more tool calls, a final answer, or (degenerate) neither.
/// Errors here are transport or protocol failures and abort the run; a
/// model's bad decision is not an error, it comes back as a turn.
pub trait Model {
    fn propose(&self, conversation: &Conversation, tools: &[ToolDecl]) -> Result<ModelTurn>;
}
