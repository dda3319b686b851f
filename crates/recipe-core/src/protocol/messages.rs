//! JSON bodies exchanged with the recipe endpoint.
//!
//! ```text
//! POST /generate-recipe
//! Content-Type: application/json
//!
//! {"title": "Banana Bread"}
//!
//! 200 OK
//! {"recipe": "Banana Bread Recipe:\nIngredients:\n- ..."}
//! ```
//!
//! # Structured replies
//!
//! Newer deployments may also return the sections as explicit fields:
//!
//! ```json
//! {"title": "Banana Bread", "ingredients": ["3 bananas"], "instructions": ["Mash."]}
//! ```
//!
//! When either list is present it is used directly and the free-form
//! `recipe` text is only kept for display of the raw reply.  All fields are
//! optional so that old and new servers decode into the same type.

use serde::{Deserialize, Serialize};

use crate::domain::recipe::{self, ParsedRecipe};

/// Body of the recipe generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRecipeRequest {
    /// The decoded barcode text the recipe should be about.
    pub title: String,
}

impl GenerateRecipeRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Body of the recipe generation response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeResponse {
    /// Free-form recipe text (legacy contract).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<String>>,
}

impl RecipeResponse {
    /// A legacy response carrying only free-form text.
    pub fn text(recipe: impl Into<String>) -> Self {
        Self {
            recipe: Some(recipe.into()),
            ..Self::default()
        }
    }

    /// The free-form text, if present and not blank.
    pub fn recipe_text(&self) -> Option<&str> {
        self.recipe.as_deref().filter(|r| !r.trim().is_empty())
    }

    /// Returns `true` if the reply uses the structured contract.
    pub fn is_structured(&self) -> bool {
        self.ingredients.is_some() || self.instructions.is_some()
    }

    /// Returns `true` if the reply contains nothing displayable.
    pub fn is_empty(&self) -> bool {
        self.recipe_text().is_none() && !self.is_structured()
    }

    /// Converts the reply into display sections.
    ///
    /// Structured fields win; otherwise the free-form text is parsed.  An
    /// empty reply parses to a recipe with only the fallback title.
    pub fn to_parsed(&self, fallback_title: &str) -> ParsedRecipe {
        if self.is_structured() {
            let title = self
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(fallback_title.trim());
            return ParsedRecipe {
                title: title.to_string(),
                ingredients: clean(self.ingredients.as_deref()),
                instructions: clean(self.instructions.as_deref()),
            };
        }
        recipe::parse(self.recipe_text().unwrap_or_default(), fallback_title)
    }
}

fn clean(items: Option<&[String]>) -> Vec<String> {
    items
        .unwrap_or_default()
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .collect()
}

/// Serializes a request body.
///
/// # Errors
///
/// Returns a `serde_json` error only if serialization itself fails, which
/// cannot happen for this plain struct in practice.
pub fn encode_request(request: &GenerateRecipeRequest) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(request)
}

/// Parses a response body.
///
/// # Errors
///
/// Returns a `serde_json` error if the body is not a JSON object of the
/// expected shape.
pub fn decode_response(body: &[u8]) -> Result<RecipeResponse, serde_json::Error> {
    serde_json::from_slice(body)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
