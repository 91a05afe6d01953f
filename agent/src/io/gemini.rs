//! Gemini `generateContent` client speaking the function-calling wire
//! format over blocking HTTP.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::core::conversation::{Conversation, Turn};
use crate::core::types::{ModelTurn, ToolCall, ToolDecl};
use crate::io::config::ModelConfig;
use crate::io::model::Model;

const ENDPOINT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// System instruction sent with every request.
const SYSTEM_PROMPT: &str = "\
You are a helpful AI coding agent.

When a user asks a question or makes a request, make a function call plan. \
You can perform the following operations:

- List files and directories
- Read file contents
- Execute scripts with optional arguments
- Write or overwrite files
- Commit and push the project's changes

All paths you provide should be relative to the working directory. You do not \
need to specify the working directory in your function calls as it is \
automatically injected for security reasons.";

/// Blocking Gemini client implementing [`Model`].
pub struct GeminiModel {
    agent: ureq::Agent,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiModel")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiModel {
    /// Build a client from config, reading the API key from the configured
    /// environment variable.
    pub fn from_env(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .with_context(|| format!("{} is not set", config.api_key_env))?;
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build();
        Ok(Self {
            agent,
            api_key,
            model: config.name.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{ENDPOINT_BASE}/{}:generateContent", self.model)
    }
}

impl Model for GeminiModel {
    #[instrument(skip_all, fields(model = %self.model, turns = conversation.len()))]
    fn propose(&self, conversation: &Conversation, tools: &[ToolDecl]) -> Result<ModelTurn> {
        let body = encode_request(conversation, tools);
        let response = self
            .agent
            .post(&self.endpoint())
            .set("content-type", "application/json")
            .set("x-goog-api-key", &self.api_key)
            .send_json(body);
        let payload: Value = match response {
            Ok(resp) => resp.into_json().context("decode model response body")?,
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                warn!(status = code, "model request rejected");
                bail!("model request failed with status {code}: {}", text.trim());
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(anyhow!(err).context("model request transport failure"));
            }
        };
        decode_turn(&payload)
    }
}

/// Encode the conversation and tool catalog as a generateContent request.
fn encode_request(conversation: &Conversation, tools: &[ToolDecl]) -> Value {
    let declarations: Vec<Value> = tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": &tool.parameters,
            })
        })
        .collect();
    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
        "contents": encode_contents(conversation),
        "tools": [{ "functionDeclarations": declarations }],
    })
}

fn encode_contents(conversation: &Conversation) -> Vec<Value> {
    conversation
        .turns()
        .iter()
        .map(|turn| match turn {
            Turn::User { text } => json!({
                "role": "user",
                "parts": [{ "text": text }],
            }),
            Turn::Model { text, calls } => {
                let mut parts = Vec::new();
                if let Some(text) = text {
                    parts.push(json!({ "text": text }));
                }
                for call in calls {
                    parts.push(json!({
                        "functionCall": { "name": &call.name, "args": &call.args },
                    }));
                }
                json!({ "role": "model", "parts": parts })
            }
            // Function responses ride a user-role content entry.
            Turn::Tool { call, payload } => json!({
                "role": "user",
                "parts": [{
                    "functionResponse": {
                        "name": call,
                        "response": { "result": payload },
                    },
                }],
            }),
        })
        .collect()
}

/// Decode a generateContent response into the next model turn.
///
/// Text parts become answer text, functionCall parts become tool calls; a
/// candidate with neither yields an empty turn (the loop stops on those).
fn decode_turn(payload: &Value) -> Result<ModelTurn> {
    if let Some(usage) = payload.get("usageMetadata") {
        debug!(
            prompt_tokens = usage.get("promptTokenCount").and_then(|v| v.as_u64()),
            response_tokens = usage.get("candidatesTokenCount").and_then(|v| v.as_u64()),
            "model usage"
        );
    }

    let candidates = payload
        .get("candidates")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("model response contained no candidates"))?;
    let first = candidates
        .first()
        .ok_or_else(|| anyhow!("model response contained no candidates"))?;
    let parts = first
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut texts = Vec::new();
    let mut calls = Vec::new();
    for part in &parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            texts.push(text.to_string());
        }
        if let Some(call) = part.get("functionCall") {
            let name = call
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("functionCall part missing name"))?
                .to_string();
            let args = call
                .get("args")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            calls.push(ToolCall { name, args });
        }
    }

    let text = if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    };
    Ok(ModelTurn { text, calls })
}
