//! Interactive chat loop
//!
//! Reads one query per line, prints recipes or a clarification, and keeps
//! the session between lines. Slash commands control the session.

use crate::error::{MiseError, Result};
use anyhow::Context;
use crate::recommend::{format_results, Recommender, TurnOutcome};
use crate::session::ChatSession;
use std::io::{BufRead, Write};

const HELP: &str = "Commands:
  /history      show previous queries
  /similar #N   recipes similar to result N of the last answer
  /clear        forget the conversation
  /help         show this help
  /quit, /exit  leave
Anything else is a recipe request, e.g. 'easy vegetarian dinner under 30 minutes'.";

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Query(String),
    History,
    Similar(usize),
    Clear,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if !line.starts_with('/') {
            return Command::Query(line.to_string());
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_lowercase();
        match name.as_str() {
            "/history" => Command::History,
            "/clear" => Command::Clear,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            "/similar" => parts
                .next()
                .map(|arg| arg.trim_start_matches('#'))
                .and_then(|arg| arg.parse().ok())
                .filter(|n: &usize| *n > 0)
                .map(Command::Similar)
                .unwrap_or_else(|| Command::Unknown(line.to_string())),
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// Run the loop until EOF or `/quit`
pub fn run<R: BufRead, W: Write>(
    recommender: &Recommender,
    session: &mut ChatSession,
    input: R,
    mut output: W,
) -> Result<()> {
    const WRITE_FAILED: &str = "Failed to write chat output";

    writeln!(
        output,
        "Welcome to mise! Ask for recipes in plain language. Type /help for commands."
    )
    .context(WRITE_FAILED)?;

    for line in input.lines() {
        let line = line.context("Failed to read chat input")?;

        let reply = match Command::parse(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Help => format!("{}\n", HELP),
            Command::History => session.history_summary(),
            Command::Clear => {
                session.clear();
                "Conversation cleared.\n".to_string()
            }
            Command::Unknown(text) => {
                format!("Unknown command '{}'. Type /help for commands.\n", text)
            }
            Command::Similar(index) => match recommender.similar(index, session) {
                Ok(result) => format_results(&result.recipes),
                Err(e) => reply_for_error(&e),
            },
            Command::Query(query) => match recommender.process_turn(&query, session) {
                Ok(TurnOutcome::Clarify(clarification)) => format!("{}\n", clarification),
                Ok(TurnOutcome::Results(result)) => {
                    let mut reply = String::new();
                    if result.refined {
                        reply.push_str(&format!("Refining with filters: {}\n", result.filters));
                    }
                    reply.push_str(&format_results(&result.recipes));
                    reply
                }
                Err(e) => reply_for_error(&e),
            },
        };

        write!(output, "{}", reply).context(WRITE_FAILED)?;
        output.flush().context(WRITE_FAILED)?;
    }

    writeln!(output, "Goodbye!").context(WRITE_FAILED)?;
    Ok(())
}

fn reply_for_error(e: &MiseError) -> String {
    tracing::error!("Turn failed: {}", e);
    match e {
        MiseError::InvalidQuery(message) => format!("Sorry, {}.\n", message),
        other => format!("{}\n", other.user_message()),
    }
}
