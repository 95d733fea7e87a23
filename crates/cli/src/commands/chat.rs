//! `zonewatch chat` — Interactive chat session.

use super::{CmdResult, load_config, print_report, start_services};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use zonewatch_gateway::ChatSession;
use zonewatch_gateway::session::DEFAULT_SESSION_ID;

pub async fn run() -> CmdResult {
    let config = load_config()?;
    let services = start_services(&config).await?;

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        ZoneWatch — Zone Safety Chat          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    print_report(&services.report);
    println!();
    println!("  Type your question and press Enter.");
    println!("  '/history' shows the session, '/reset' clears it, 'exit' quits.");
    println!();

    let mut session = ChatSession::new(DEFAULT_SESSION_ID);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "exit" | "quit" => break,
            "/reset" => {
                session.reset();
                println!("  (history cleared)");
            }
            "/history" => {
                for entry in session.history().entries() {
                    let marker = if entry.is_error { " [error]" } else { "" };
                    println!(
                        "  {} {:?}{marker}: {}",
                        entry.timestamp.format("%H:%M:%S"),
                        entry.sender,
                        entry.message
                    );
                }
            }
            question => {
                eprint!("  ...");
                let result = session.ask(&services.dispatcher, question).await;
                eprint!("\r     \r");
                match result {
                    Ok(outcome) => {
                        println!();
                        for line in outcome.answer.lines() {
                            println!("  ZoneWatch > {line}");
                        }
                        if !outcome.tools.is_empty() {
                            println!("  (tools: {})", outcome.tools.join(", "));
                        }
                        println!();
                    }
                    Err(e) => {
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}
