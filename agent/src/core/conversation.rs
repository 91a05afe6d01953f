//! Append-only conversation history owned by the agent loop.

use crate::core::types::{ModelTurn, ToolCall};

/// One entry in the conversation, tagged by origin.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// The seeding user prompt.
    User { text: String },
    /// A model response: answer text and/or proposed tool calls.
    Model {
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
    /// The serialized result of one tool call, tagged with the tool name so
    /// the model can correlate results to requests.
    Tool { call: String, payload: String },
}

/// Ordered, append-only sequence of turns.
///
/// Owned exclusively by the loop and mutated only through the push methods;
/// tool implementations never see it. The slice handed to the model on turn
/// *k* is exactly the history accumulated through turn *k - 1*. Not persisted
/// across invocations.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation from the user prompt.
    pub fn seeded(prompt: &str) -> Self {
        Self {
            turns: vec![Turn::User {
                text: prompt.to_string(),
            }],
        }
    }

    pub fn push_model(&mut self, turn: &ModelTurn) {
        self.turns.push(Turn::Model {
            text: turn.text.clone(),
            calls: turn.calls.clone(),
        });
    }

    pub fn push_tool_result(&mut self, call: &ToolCall, payload: String) {
        self.turns.push(Turn::Tool {
            call: call.name.clone(),
            payload,
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
