//! Best-effort parsing of free-form recipe text.
//!
//! The recipe endpoint replies with unstructured text that usually, but not
//! always, looks like this:
//!
//! ```text
//! Banana Bread Recipe:
//! Ingredients:
//! - 3 ripe bananas
//! - 2 cups flour
//! Instructions:
//! 1. Mash the bananas.
//! 2. Fold in the flour.
//! ```
//!
//! [`parse`] cuts that text into a [`ParsedRecipe`] using three literal
//! markers (`" Recipe:"`, `"Ingredients:"`, `"Instructions:"`).  Nothing here
//! ever fails: a missing marker simply produces an empty section, and the
//! caller still gets something to display.
//!
//! # Section rules
//!
//! | Section      | Source text                                   | Split on        |
//! |--------------|-----------------------------------------------|-----------------|
//! | title        | first line, before `" Recipe:"`               | –               |
//! | ingredients  | between `"Ingredients:"` and `"Instructions:"` | `"\n- "`        |
//! | instructions | after `"Instructions:"`                       | `<digits>". "`  |
//!
//! For both lists the segment before the first delimiter is discarded, each
//! item is trimmed, and blank items are dropped.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Text shown instead of a recipe when the endpoint could not be reached.
pub const FETCH_FAILED_TEXT: &str = "Failed to fetch recipe.";

/// Text shown instead of a recipe when the endpoint answered without one.
pub const NOT_FOUND_TEXT: &str = "Recipe not found.";

const TITLE_MARKER: &str = " Recipe:";
const INGREDIENTS_MARKER: &str = "Ingredients:";
const INSTRUCTIONS_MARKER: &str = "Instructions:";
const INGREDIENT_DELIMITER: &str = "\n- ";

/// A recipe split into display sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecipe {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

impl ParsedRecipe {
    /// Returns `true` if neither list has any entries.
    pub fn has_no_sections(&self) -> bool {
        self.ingredients.is_empty() && self.instructions.is_empty()
    }
}

/// Parses raw recipe text into title, ingredients, and instructions.
///
/// `fallback_title` (normally the scanned subject) is used when the text
/// does not start with a `"<Title> Recipe:"` line.
pub fn parse(raw: &str, fallback_title: &str) -> ParsedRecipe {
    let recipe = ParsedRecipe {
        title: extract_title(raw).unwrap_or_else(|| fallback_title.trim().to_string()),
        ingredients: extract_ingredients(raw),
        instructions: extract_instructions(raw),
    };
    if recipe.has_no_sections() {
        trace!("no recipe sections in {} bytes of text", raw.len());
    }
    recipe
}

fn extract_title(raw: &str) -> Option<String> {
    let first_line = raw.trim_start().lines().next()?;
    let (title, _) = first_line.split_once(TITLE_MARKER)?;
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn extract_ingredients(raw: &str) -> Vec<String> {
    let Some((_, after)) = raw.split_once(INGREDIENTS_MARKER) else {
        return Vec::new();
    };
    // The section only exists when it is closed by the instructions marker.
    let Some((section, _)) = after.split_once(INSTRUCTIONS_MARKER) else {
        return Vec::new();
    };
    collect_items(section.split(INGREDIENT_DELIMITER))
}

fn extract_instructions(raw: &str) -> Vec<String> {
    match raw.split_once(INSTRUCTIONS_MARKER) {
        Some((_, section)) => collect_items(split_numbered(section).into_iter()),
        None => Vec::new(),
    }
}

fn collect_items<'a>(segments: impl Iterator<Item = &'a str>) -> Vec<String> {
    segments
        .skip(1)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits `text` on every run of ASCII digits immediately followed by `". "`.
///
/// `"x1. a 2. b"` becomes `["x", "a ", "b"]`.  Digit runs not followed by
/// `". "` (quantities, temperatures) are left intact.
fn split_numbered(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut segment_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let run_end = i + bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
        if bytes[run_end..].starts_with(b". ") {
            // Split points sit on ASCII bytes, so they are char boundaries.
            segments.push(&text[segment_start..i]);
            segment_start = run_end + 2;
            i = segment_start;
        } else {
            i = run_end;
        }
    }
    segments.push(&text[segment_start..]);
    segments
}

// ── Tests ─────────────────────────────────────────────────────────────────────
