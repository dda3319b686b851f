//! Plain-text display for a terminal.
//!
//! Output for one rendered recipe looks like:
//!
//! ```text
//! Scanned: Banana Bread
//!
//! == Banana Bread ==
//! Ingredients:
//!   - 3 ripe bananas
//!   - 2 cups flour
//! Instructions:
//!   1. Mash the bananas.
//!   2. Bake for 60 minutes.
//! ```

use std::{
    io::{self, Write},
    sync::Mutex,
};

use tracing::warn;

use crate::application::render_recipe::DisplaySurface;

/// Writes display regions as text blocks to `W`.
pub struct TerminalDisplay<W: Write + Send> {
    out: Mutex<W>,
}

impl TerminalDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_block(&self, block: &str) {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(out, "{block}").and_then(|()| out.flush()) {
            warn!("Failed to write to display: {e}");
        }
    }
}

fn list_block(heading: &str, lines: impl Iterator<Item = String>) -> String {
    let mut block = format!("{heading}:");
    for line in lines {
        block.push_str("\n  ");
        block.push_str(&line);
    }
    block
}

impl<W: Write + Send> DisplaySurface for TerminalDisplay<W> {
    fn show_scanned(&self, subject: &str) {
        self.write_block(&format!("Scanned: {subject}"));
    }

    fn show_title(&self, title: &str) {
        self.write_block(&format!("\n== {title} =="));
    }

    fn show_ingredients(&self, ingredients: &[String]) {
        self.write_block(&list_block(
            "Ingredients",
            ingredients.iter().map(|i| format!("- {i}")),
        ));
    }

    fn show_instructions(&self, instructions: &[String]) {
        self.write_block(&list_block(
            "Instructions",
            instructions
                .iter()
                .enumerate()
                .map(|(n, step)| format!("{}. {step}", n + 1)),
        ));
    }

    fn show_notice(&self, notice: &str) {
        self.write_block(&format!("[{notice}]"));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
