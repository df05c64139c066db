//! Outreach Flow command line runner
//!
//! Runs the workflow once over a saved conversation and prints the
//! resulting state as JSON.

use outreach_flow::dispatch::DryRunDispatch;
use outreach_flow::events::BroadcastEventChannel;
use outreach_flow::llm::{LoggingAdapter, OpenAiAdapter};
use outreach_flow::tools::ToolRegistry;
use outreach_flow::{ConversationState, Engine, LlmConfig, RunOutcome, WorkflowConfig};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "outreach_flow=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: outreach-flow <conversation.json | message.txt>");
        std::process::exit(2);
    };

    let state = load_state(Path::new(&path))?;
    tracing::info!(path = %path, messages = state.len(), "Loaded conversation");

    let llm_config = LlmConfig::from_env();
    let Some(openai) = OpenAiAdapter::from_config(&llm_config)? else {
        tracing::error!("No reasoning service configured. Set OPENAI_API_KEY.");
        return Err("OPENAI_API_KEY is not set".into());
    };
    let adapter = Arc::new(LoggingAdapter::new(Arc::new(openai)));

    let config = WorkflowConfig::from_env();
    tracing::info!(
        max_steps = config.max_steps,
        confirmation = ?config.confirmation,
        topic = %config.event_topic,
        "Workflow configured"
    );

    let events = Arc::new(BroadcastEventChannel::default());
    let mut milestones = events.subscribe();

    let engine = Engine::new(
        adapter,
        Arc::new(ToolRegistry::empty()),
        Arc::new(DryRunDispatch),
        events,
    )
    .with_config(config)
    .with_conversation_id(uuid::Uuid::new_v4().to_string());

    let outcome = engine.run(state).await?;

    while let Ok(published) = milestones.try_recv() {
        tracing::info!(
            topic = %published.topic,
            event = %published.event.event_type,
            "Milestone published"
        );
    }

    tracing::info!(
        steps = outcome.steps,
        visited = ?outcome.visited,
        reply = %outcome.reply,
        "Workflow finished"
    );
    write_outcome(&outcome, &mut std::io::stdout(), &mut std::io::stderr())?;
    Ok(())
}

/// State JSON goes to `state_out`; the user-facing reply to `reply_out`.
fn write_outcome(
    outcome: &RunOutcome,
    state_out: &mut impl Write,
    reply_out: &mut impl Write,
) -> std::io::Result<()> {
    writeln!(reply_out, "{}", outcome.reply)?;
    writeln!(state_out, "{}", serde_json::to_string_pretty(&outcome.state)?)?;
    Ok(())
}

/// Load a conversation from disk. A JSON state file is used as-is; any
/// other content is treated as a single user message.
fn load_state(path: &Path) -> Result<ConversationState, std::io::Error> {
    let raw = std::fs::read_to_string(path)?;
    if let Ok(state) = serde_json::from_str::<ConversationState>(&raw) {
        return Ok(state);
    }
    Ok(ConversationState::from_user(raw.trim()))
}
