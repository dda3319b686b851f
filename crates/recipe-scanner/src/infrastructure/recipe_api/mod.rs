//! HTTP client for the recipe generation endpoint.
//!
//! # Contract
//!
//! ```text
//! POST <endpoint>
//! Content-Type: application/json
//!
//! {"title": "<scanned text>"}
//! ```
//!
//! The reply is JSON: either `{"recipe": "<free text>"}` or the structured
//! form with `title`, `ingredients`, and `instructions`.  Decoding is
//! delegated to [`recipe_core::protocol::messages::decode_response`].
//!
//! The HTTP status is logged but never rejected on its own: a body that
//! decodes is returned whatever the status, and one that does not is
//! [`RecipeRequestError::Malformed`].  Turning errors into user facing
//! fallback text is the renderer's job, not this client's.

use std::time::Duration;

use async_trait::async_trait;
use recipe_core::{protocol::messages::decode_response, GenerateRecipeRequest, RecipeResponse};
use tracing::{debug, warn};

use crate::application::render_recipe::{RecipeRequestError, RecipeSource};

/// A [`RecipeSource`] backed by reqwest.
#[derive(Clone)]
pub struct HttpRecipeClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecipeClient {
    /// Builds a client for `endpoint`.  `timeout` bounds the whole request;
    /// `None` waits as long as the server takes.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeRequestError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RecipeRequestError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RecipeRequestError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RecipeSource for HttpRecipeClient {
    async fn generate(&self, subject: &str) -> Result<RecipeResponse, RecipeRequestError> {
        debug!("POST {} for {subject:?}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRecipeRequest::new(subject))
            .send()
            .await
            .map_err(|e| RecipeRequestError::Transport(e.to_string()))?;

        // The body decides the outcome, not the status: an error status with a
        // JSON body is decoded like any other reply.
        let status = response.status();
        if !status.is_success() {
            warn!("Endpoint answered HTTP {status} for {subject:?}");
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RecipeRequestError::Transport(e.to_string()))?;
        decode_response(&body).map_err(|e| {
            RecipeRequestError::Malformed(format!("HTTP {}: {e}", status.as_u16()))
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
