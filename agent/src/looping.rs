//! The bounded model/tool iteration loop.

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use crate::core::conversation::Conversation;
use crate::core::types::ToolCall;
use crate::io::model::Model;
use crate::tools::ToolRegistry;

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStop {
    /// The model produced a final natural-language answer.
    Answered(String),
    /// The model proposed neither tool calls nor text; the loop stops rather
    /// than spin on a degenerate response.
    Empty,
    /// The iteration budget ran out before a final answer.
    BudgetExhausted { max_iterations: u32 },
}

/// Summary of a loop invocation. The conversation is handed back for
/// inspection; it is never persisted.
#[derive(Debug)]
pub struct LoopOutcome {
    pub iterations: u32,
    pub stop: LoopStop,
    pub conversation: Conversation,
}

/// Run the conversation loop until the model answers, goes silent, or the
/// iteration budget is exhausted.
///
/// Each iteration asks the model for the next step given the full history,
/// appends the model turn, then dispatches any proposed tool calls strictly
/// in order (later calls may depend on earlier side effects), appending
/// exactly one tool-result turn per call. `on_call` observes each dispatch
/// before it runs (the CLI uses it for progress lines).
///
/// Tool failures are fed back into the conversation as payloads; only model
/// transport/protocol failures abort the run.
#[instrument(skip_all, fields(max_iterations))]
pub fn run_loop<M: Model, F: FnMut(&ToolCall)>(
    model: &M,
    registry: &ToolRegistry,
    prompt: &str,
    max_iterations: u32,
    mut on_call: F,
) -> Result<LoopOutcome> {
    let mut conversation = Conversation::seeded(prompt);
    let declarations = registry.declarations();
    let mut iterations = 0u32;

    while iterations < max_iterations {
        iterations += 1;
        debug!(iteration = iterations, "querying model");
        let turn = model
            .propose(&conversation, declarations)
            .context("query model collaborator")?;
        conversation.push_model(&turn);

        if !turn.calls.is_empty() {
            for call in &turn.calls {
                on_call(call);
                let payload = registry.dispatch(call);
                conversation.push_tool_result(call, payload);
            }
            continue;
        }

        if let Some(text) = turn.text
            && !text.trim().is_empty()
        {
            debug!(iteration = iterations, "model answered");
            return Ok(LoopOutcome {
                iterations,
                stop: LoopStop::Answered(text),
                conversation,
            });
        }

        warn!(iteration = iterations, "model proposed neither calls nor text");
        return Ok(LoopOutcome {
            iterations,
            stop: LoopStop::Empty,
            conversation,
        });
    }

    warn!(max_iterations, "iteration budget exhausted without an answer");
    Ok(LoopOutcome {
        iterations,
        stop: LoopStop::BudgetExhausted { max_iterations },
        conversation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Turn;
    use crate::core::types::ModelTurn;
    use crate::io::workspace::WorkspaceRoot;
    use crate::test_support::{EndlessCaller, ScriptedModel, call, sh_test_config};
    use serde_json::json;

    fn registry() -> (tempfile::TempDir, ToolRegistry) {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = WorkspaceRoot::new(temp.path()).expect("workspace root");
        let registry = ToolRegistry::new(root, sh_test_config()).expect("registry");
        (temp, registry)
    }

    #[test]
    fn two_calls_then_answer_appends_results_in_call_order() {
        let (_temp, registry) = registry();
        let model = ScriptedModel::new(vec![
            ModelTurn::calls(vec![
                call("write_file", json!({ "file_path": "a.txt", "content": "A" })),
                call("read_file", json!({ "file_path": "a.txt" })),
            ]),
            ModelTurn::answer("done"),
        ]);

        let outcome = run_loop(&model, &registry, "make a.txt", 20, |_| {}).expect("loop");

        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.stop, LoopStop::Answered("done".to_string()));

        // user, model(2 calls), tool, tool, model(answer)
        let turns = outcome.conversation.turns();
        assert_eq!(turns.len(), 5);
        assert!(matches!(&turns[1], Turn::Model { calls, .. } if calls.len() == 2));
        assert!(matches!(
            &turns[2],
            Turn::Tool { call, payload }
                if call == "write_file" && payload.contains("Successfully wrote")
        ));
        assert!(matches!(
            &turns[3],
            Turn::Tool { call, payload } if call == "read_file" && payload == "A"
        ));
        assert!(matches!(&turns[4], Turn::Model { text: Some(t), .. } if t == "done"));
    }

    #[test]
    fn endless_caller_exhausts_budget_after_exactly_max_iterations() {
        let (_temp, registry) = registry();
        let model = EndlessCaller::default();

        let outcome = run_loop(&model, &registry, "never stop", 4, |_| {}).expect("loop");

        assert_eq!(outcome.iterations, 4);
        assert_eq!(outcome.stop, LoopStop::BudgetExhausted { max_iterations: 4 });
        // One model turn plus one tool turn per iteration, after the seed.
        assert_eq!(outcome.conversation.len(), 1 + 4 * 2);
    }

    #[test]
    fn empty_turn_stops_without_output() {
        let (_temp, registry) = registry();
        let model = ScriptedModel::new(vec![ModelTurn::default()]);

        let outcome = run_loop(&model, &registry, "hello", 20, |_| {}).expect("loop");
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.stop, LoopStop::Empty);
    }

    #[test]
    fn whitespace_answer_counts_as_empty() {
        let (_temp, registry) = registry();
        let model = ScriptedModel::new(vec![ModelTurn::answer("   ")]);

        let outcome = run_loop(&model, &registry, "hello", 20, |_| {}).expect("loop");
        assert_eq!(outcome.stop, LoopStop::Empty);
    }

    #[test]
    fn text_alongside_calls_continues_the_loop() {
        let (_temp, registry) = registry();
        let model = ScriptedModel::new(vec![
            ModelTurn {
                text: Some("Checking the directory first.".to_string()),
                calls: vec![call("list_directory", json!({}))],
            },
            ModelTurn::answer("empty project"),
        ]);

        let outcome = run_loop(&model, &registry, "what is here", 20, |_| {}).expect("loop");
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.stop, LoopStop::Answered("empty project".to_string()));
    }

    #[test]
    fn failures_are_fed_back_not_raised() {
        let (_temp, registry) = registry();
        let model = ScriptedModel::new(vec![
            ModelTurn::calls(vec![call("read_file", json!({ "file_path": "absent.txt" }))]),
            ModelTurn::answer("the file is missing"),
        ]);

        let outcome = run_loop(&model, &registry, "read it", 20, |_| {}).expect("loop");
        let turns = outcome.conversation.turns();
        assert!(matches!(
            &turns[2],
            Turn::Tool { payload, .. } if payload.starts_with("Error: Cannot read")
        ));
        assert_eq!(
            outcome.stop,
            LoopStop::Answered("the file is missing".to_string())
        );
    }

    #[test]
    fn observer_sees_dispatches_in_order() {
        let (_temp, registry) = registry();
        let model = ScriptedModel::new(vec![
            ModelTurn::calls(vec![
                call("list_directory", json!({})),
                call("read_file", json!({ "file_path": "x" })),
            ]),
            ModelTurn::answer("ok"),
        ]);

        let mut seen = Vec::new();
        run_loop(&model, &registry, "look around", 20, |call| {
            seen.push(call.name.clone());
        })
        .expect("loop");
        assert_eq!(seen, ["list_directory", "read_file"]);
    }

    #[test]
    fn scripted_exhaustion_is_fatal() {
        let (_temp, registry) = registry();
        let model = ScriptedModel::new(Vec::new());
        assert!(run_loop(&model, &registry, "hi", 20, |_| {}).is_err());
    }

    #[test]
    fn budget_of_zero_never_queries_the_model() {
        let (_temp, registry) = registry();
        // An empty script would fail if the model were consulted at all.
        let model = ScriptedModel::new(Vec::new());

        let outcome = run_loop(&model, &registry, "hi", 0, |_| {}).expect("loop");
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.stop, LoopStop::BudgetExhausted { max_iterations: 0 });
    }
}
