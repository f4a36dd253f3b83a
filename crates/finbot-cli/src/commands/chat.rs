//! Chat command implementations (chat, ask)

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use finbot_core::FinancialAssistant;
use tracing::warn;

const EXIT_WORDS: &[&str] = &["exit", "quit", "خروج"];

pub async fn cmd_ask(
    assistant: &FinancialAssistant,
    customer: Option<i64>,
    message: &str,
) -> Result<()> {
    let customer_id = assistant.resolve_customer(customer)?;
    let reply = assistant.respond(customer_id, message).await?;

    println!("{}", reply.text);
    if let Some(intent) = reply.intent {
        tracing::debug!(
            intent = %intent,
            confidence = reply.confidence,
            model = %reply.model,
            "Answered"
        );
    }
    Ok(())
}

pub async fn cmd_chat(assistant: &FinancialAssistant, customer: Option<i64>) -> Result<()> {
    let customer_id = assistant.resolve_customer(customer)?;
    let name = assistant
        .db()
        .get_customer(customer_id)?
        .map(|c| c.full_name())
        .unwrap_or_else(|| format!("customer {}", customer_id));

    println!();
    println!("💬 FinBot - chatting as {}", name);
    println!("   ─────────────────────────────");
    println!("   Ask about balances, spending, forecasts or your financial health.");
    println!("   Type 'exit' to quit.");
    println!();

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_repl(assistant, customer_id, stdin.lock(), stdout.lock()).await?;
    Ok(())
}

/// Read messages line by line until EOF or an exit word, writing each reply
///
/// Returns the number of messages answered.
pub async fn run_repl<R: BufRead, W: Write>(
    assistant: &FinancialAssistant,
    customer_id: i64,
    mut input: R,
    mut output: W,
) -> Result<usize> {
    let mut answered = 0;
    let mut line = String::new();

    loop {
        write!(output, "You: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line).context("Failed to read input")? == 0 {
            writeln!(output)?;
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&message.to_lowercase().as_str()) {
            writeln!(output, "👋 Goodbye!")?;
            break;
        }

        match assistant.respond(customer_id, message).await {
            Ok(reply) => {
                writeln!(output, "FinBot: {}", reply.text)?;
                answered += 1;
            }
            Err(e) => {
                warn!(error = %e, "Failed to answer message");
                writeln!(
                    output,
                    "FinBot: I encountered an error answering that. Please try again."
                )?;
            }
        }
        writeln!(output)?;
    }

    Ok(answered)
}
