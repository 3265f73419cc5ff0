use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;

use screenflow::config::Config;
use screenflow::log::EventLog;
use screenflow::logging::init_tracing;
use screenflow::{
    derive, normalize_behavior_payload, normalize_navigate_detail, DispatchBridge, DispatchOutcome,
    Runtime, UiEvent,
};

#[derive(Parser)]
#[command(name = "screenflow")]
#[command(about = "Event-log state runtime for JSON-described screens", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive state from the persisted log, or from a JSON event file
    Replay {
        /// JSON array of `{intent, payload?}` records
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Append one event to the persisted log
    Dispatch {
        intent: String,
        /// JSON payload
        payload: Option<String>,
    },
    /// Route a behavior payload through the dispatch bridge
    Action { payload: String },
    /// Normalize a behavior payload and print the intent
    Normalize { payload: String },
    /// Normalize a navigate detail and print the intent
    Navigate { detail: String },
    /// Truncate the persisted log
    Clear,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Commands::Replay { events } => {
            let state = match events {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let (log, skipped) = EventLog::from_json(&text)
                        .with_context(|| format!("{} is not a JSON event array", path.display()))?;
                    if skipped > 0 {
                        tracing::warn!(skipped, "Skipped non-record elements");
                    }
                    derive(log.events())
                }
                None => {
                    let runtime = open_runtime(&config);
                    (*runtime.state()).clone()
                }
            };
            print_json(&state)?;
        }
        Commands::Dispatch { intent, payload } => {
            let payload = payload.as_deref().map(parse_json).transpose()?;
            let runtime = open_runtime(&config);
            if let DispatchOutcome::Rejected = runtime.dispatch(intent, payload) {
                anyhow::bail!("Dispatch rejected");
            }
            flush(&runtime)?;
            print_json(&*runtime.state())?;
        }
        Commands::Action { payload } => {
            let payload = parse_json(&payload)?;
            let bridge = DispatchBridge::new(open_runtime(&config))
                .with_navigator(|to| println!("navigate -> {to}"));
            bridge.install();
            let outcome = bridge.handle(UiEvent::Action(payload));
            eprintln!("{outcome:?}");
            flush(bridge.runtime())?;
            print_json(&*bridge.runtime().state())?;
        }
        Commands::Normalize { payload } => {
            print_json(&normalize_behavior_payload(&parse_json(&payload)?))?;
        }
        Commands::Navigate { detail } => {
            print_json(&normalize_navigate_detail(&parse_json(&detail)?))?;
        }
        Commands::Clear => {
            let runtime = open_runtime(&config);
            if !runtime.clear().is_applied() {
                anyhow::bail!("Clear rejected");
            }
            println!("Cleared event log '{}'", runtime.storage_key());
        }
    }

    Ok(())
}

fn open_runtime(config: &Config) -> Runtime {
    let runtime = Runtime::from_config(config);
    let source = runtime.rehydrate();
    tracing::debug!(?source, events = runtime.len(), "Runtime rehydrated");
    runtime
}

/// One-shot commands exit right away, so exempt events (live input echo)
/// must be written before returning.
fn flush(runtime: &Runtime) -> anyhow::Result<()> {
    if !runtime.persist() {
        anyhow::bail!("Failed to persist event log '{}'", runtime.storage_key());
    }
    Ok(())
}

fn parse_json(text: &str) -> anyhow::Result<Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid JSON: {text}"))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
