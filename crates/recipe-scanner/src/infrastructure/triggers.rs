//! User triggers read from stdin.
//!
//! | Input            | Trigger                    |
//! |------------------|----------------------------|
//! | `n`, `next`      | [`Trigger::SwitchCamera`]  |
//! | `r`, `refresh`   | [`Trigger::RefreshRecipe`] |
//! | `q`, `quit`      | [`Trigger::Quit`]          |
//!
//! Input is case-insensitive and surrounding whitespace is ignored.
//! End of input (Ctrl-D, or a closed pipe) counts as `quit`.

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, warn};

/// A user request, independent of how it was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    SwitchCamera,
    RefreshRecipe,
    Quit,
}

/// One-line help text for the prompt.
pub const HELP_TEXT: &str = "Commands: [n]ext camera, [r]efresh recipe, [q]uit";

/// Maps one input line to a trigger.  Unknown input yields `None`.
pub fn parse_command(line: &str) -> Option<Trigger> {
    match line.trim().to_ascii_lowercase().as_str() {
        "n" | "next" => Some(Trigger::SwitchCamera),
        "r" | "refresh" => Some(Trigger::RefreshRecipe),
        "q" | "quit" | "exit" => Some(Trigger::Quit),
        _ => None,
    }
}

/// Spawns a task that reads stdin line by line and forwards triggers.
///
/// The task ends after sending [`Trigger::Quit`] or when the receiver is
/// dropped.
pub fn spawn_stdin_triggers() -> mpsc::Receiver<Trigger> {
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let trigger = match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match parse_command(&line) {
                    Some(trigger) => trigger,
                    None => {
                        warn!("Unknown command {line:?}. {HELP_TEXT}");
                        continue;
                    }
                },
                Ok(None) => {
                    debug!("stdin closed");
                    Trigger::Quit
                }
                Err(e) => {
                    warn!("Failed to read stdin: {e}");
                    Trigger::Quit
                }
            };
            if tx.send(trigger).await.is_err() || trigger == Trigger::Quit {
                break;
            }
        }
    });
    rx
}

// ── Tests ─────────────────────────────────────────────────────────────────────
