//! Command-driven coding agent CLI.
//!
//! Turns a natural-language request into sandboxed tool calls against a
//! working directory, driven by a Gemini model.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use agent::exit_codes;
use agent::io::config::load_config;
use agent::io::gemini::GeminiModel;
use agent::io::workspace::WorkspaceRoot;
use agent::looping::{LoopStop, run_loop};
use agent::tools::ToolRegistry;

#[derive(Parser)]
#[command(name = "agent", version, about = "Sandboxed tool-calling coding agent")]
struct Cli {
    /// Natural-language request; multiple words are joined with spaces.
    #[arg(required = true)]
    prompt: Vec<String>,

    /// Working directory every tool is confined to.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Path to the TOML config file.
    #[arg(long, default_value = "agent.toml")]
    config: PathBuf,

    /// Log tool calls with their arguments and enable debug tracing.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    agent::logging::init(cli.verbose);
    match run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config = load_config(&cli.config)?;
    let root = WorkspaceRoot::new(&cli.root)?;
    let registry = ToolRegistry::new(root, config.clone())?;
    let model = GeminiModel::from_env(&config.model)?;
    let prompt = cli.prompt.join(" ");

    let verbose = cli.verbose;
    let outcome = run_loop(
        &model,
        &registry,
        &prompt,
        config.max_iterations,
        |call| {
            if verbose {
                println!(
                    " - Calling function: {}({})",
                    call.name,
                    serde_json::Value::Object(call.args.clone())
                );
            } else {
                println!(" - Calling function: {}", call.name);
            }
        },
    )?;

    match outcome.stop {
        LoopStop::Answered(text) => {
            println!("{text}");
            Ok(exit_codes::OK)
        }
        LoopStop::Empty => {
            eprintln!("model stopped without an answer");
            Ok(exit_codes::OK)
        }
        LoopStop::BudgetExhausted { max_iterations } => {
            eprintln!("iteration budget exhausted after {max_iterations} iterations without a final answer");
            Ok(exit_codes::EXHAUSTED)
        }
    }
}
