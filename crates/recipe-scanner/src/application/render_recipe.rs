//! RecipeRenderer: turns a scanned subject into displayed recipe sections.
//!
//! # Flow (for beginners)
//!
//! ```text
//! ScanEvent ──▶ handle_scan ──▶ show_scanned
//!                    │
//!                    ▼
//!            request_recipe ──▶ RecipeSource::generate (HTTP)
//!                    │
//!                    ▼
//!          RecipeResponse::to_parsed ──▶ render ──▶ DisplaySurface
//! ```
//!
//! `request_recipe` never fails: transport or decoding problems become the
//! text `"Failed to fetch recipe."`, and an empty reply becomes
//! `"Recipe not found."`.  Those strings flow through the same parser as a
//! real reply, so the display always shows at least a title.
//!
//! # Out-of-order replies
//!
//! Every request takes a number from a [`SequenceCounter`].  When a reply
//! arrives, it is only rendered if no newer request has been issued since,
//! so a slow reply for an old scan can never overwrite a newer recipe.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use recipe_core::{
    ParsedRecipe, RecipeResponse, SequenceCounter, FETCH_FAILED_TEXT, NOT_FOUND_TEXT,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Shown when a refresh is requested before anything was scanned.
pub const NOTHING_TO_REFRESH_TEXT: &str = "Scan a QR code first.";

/// Error type for the recipe endpoint.
#[derive(Debug, Error)]
pub enum RecipeRequestError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Generates a recipe for a subject.
///
/// The production implementation is
/// [`HttpRecipeClient`](crate::infrastructure::recipe_api::HttpRecipeClient).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn generate(&self, subject: &str) -> Result<RecipeResponse, RecipeRequestError>;
}

/// The regions of the screen the renderer writes to.
///
/// Each call replaces the region's previous content.
pub trait DisplaySurface: Send + Sync {
    /// The "scanned" readout showing the raw decoded text.
    fn show_scanned(&self, subject: &str);
    fn show_title(&self, title: &str);
    fn show_ingredients(&self, ingredients: &[String]);
    fn show_instructions(&self, instructions: &[String]);
    /// A status line, used for fallback text and hints.
    fn show_notice(&self, notice: &str);
}

/// What happened to one scan or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The reply was written to the display.
    Rendered,
    /// A newer request was issued while this one was in flight.
    Superseded,
    /// Same subject as the one already shown, and repeats are ignored.
    Duplicate,
    /// Refresh requested with no subject scanned yet.
    NothingToRefresh,
}

/// The recipe use case.
pub struct RecipeRenderer {
    source: Arc<dyn RecipeSource>,
    display: Arc<dyn DisplaySurface>,
    sequence: SequenceCounter,
    dedupe_repeated_scans: bool,
    current_subject: Mutex<Option<String>>,
}

impl RecipeRenderer {
    pub fn new(source: Arc<dyn RecipeSource>, display: Arc<dyn DisplaySurface>) -> Self {
        Self {
            source,
            display,
            sequence: SequenceCounter::new(),
            dedupe_repeated_scans: false,
            current_subject: Mutex::new(None),
        }
    }

    /// Ignore a scan whose text equals the subject already on screen.
    pub fn with_dedupe(mut self, dedupe_repeated_scans: bool) -> Self {
        self.dedupe_repeated_scans = dedupe_repeated_scans;
        self
    }

    /// The subject of the most recent scan, if any.
    pub fn current_subject(&self) -> Option<String> {
        self.lock_subject().clone()
    }

    /// Asks the source for a recipe, mapping every failure to fallback text.
    pub async fn request_recipe(&self, subject: &str) -> RecipeResponse {
        match self.source.generate(subject).await {
            Ok(response) if response.is_empty() => {
                warn!("Endpoint returned no recipe for {subject:?}");
                RecipeResponse::text(NOT_FOUND_TEXT)
            }
            Ok(response) => response,
            Err(e) => {
                error!("Error fetching recipe: {e}");
                RecipeResponse::text(FETCH_FAILED_TEXT)
            }
        }
    }

    /// Writes the three recipe regions.
    pub fn render(&self, recipe: &ParsedRecipe) {
        self.display.show_title(&recipe.title);
        self.display.show_ingredients(&recipe.ingredients);
        self.display.show_instructions(&recipe.instructions);
    }

    /// Entry point for a decoded QR payload.
    pub async fn handle_scan(&self, subject: &str) -> RenderOutcome {
        {
            let mut current = self.lock_subject();
            if self.dedupe_repeated_scans && current.as_deref() == Some(subject) {
                debug!("Ignoring repeated scan of {subject:?}");
                return RenderOutcome::Duplicate;
            }
            *current = Some(subject.to_string());
        }

        info!("QR code scanned: {subject}");
        self.display.show_scanned(subject);
        self.fetch_and_render(subject).await
    }

    /// Requests a fresh recipe for the current subject.
    pub async fn refresh(&self) -> RenderOutcome {
        let Some(subject) = self.current_subject() else {
            self.display.show_notice(NOTHING_TO_REFRESH_TEXT);
            return RenderOutcome::NothingToRefresh;
        };
        info!("Refreshing recipe for {subject:?}");
        self.fetch_and_render(&subject).await
    }

    async fn fetch_and_render(&self, subject: &str) -> RenderOutcome {
        let seq = self.sequence.issue();
        let response = self.request_recipe(subject).await;

        if !self.sequence.is_latest(seq) {
            debug!(
                "Dropping reply #{seq} for {subject:?}; #{} is newer",
                self.sequence.latest()
            );
            return RenderOutcome::Superseded;
        }

        let parsed = response.to_parsed(subject);
        self.render(&parsed);
        if parsed.has_no_sections() {
            if let Some(text) = response.recipe_text() {
                self.display.show_notice(text);
            }
        }
        RenderOutcome::Rendered
    }

    fn lock_subject(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.current_subject
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
