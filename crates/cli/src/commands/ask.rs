//! `zonewatch ask` — Single-question mode.

use super::{CmdResult, load_config, start_services};
use zonewatch_agent::{DispatchOutcome, TraceKind};

pub async fn run(question: &str, trace: bool) -> CmdResult {
    let config = load_config()?;
    let services = start_services(&config).await?;

    eprint!("  Thinking...");
    let outcome = services.dispatcher.run(question).await;
    eprint!("\r              \r");
    let outcome = outcome?;

    if trace {
        print_trace(&outcome);
    }
    println!("{}", outcome.answer);

    Ok(())
}

pub fn print_trace(outcome: &DispatchOutcome) {
    eprintln!("  Tools offered: {}", outcome.selected.join(", "));
    for step in &outcome.trace {
        let label = match step.kind {
            TraceKind::Thought => "Thought",
            TraceKind::Action => "Action",
            TraceKind::Observation => "Observation",
        };
        eprintln!("  {label:>11} | {}", step.content);
    }
    eprintln!("  ({} iteration(s))", outcome.iterations);
    eprintln!();
}
