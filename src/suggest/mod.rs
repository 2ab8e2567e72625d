//! Product data suggestions used to prefill a creation draft.
//!
//! A suggestion is only ever a convenience: any failure yields `None` and the
//! draft is left as the operator typed it.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::product::{is_valid_price, ProductDraft};
use crate::core::types::Category;

/// Boxed future returned by [`Suggester`], so suggesters can be chosen at
/// runtime
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Environment variables checked, in order, for the API key
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Suggested values for a product
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "precio", alias = "price")]
    pub price: f64,
    #[serde(rename = "codigo", alias = "code")]
    pub code: String,
    #[serde(rename = "descripcion", alias = "description")]
    pub description: String,
    #[serde(rename = "categoria", alias = "category")]
    pub category: Category,
}

impl Suggestion {
    /// Copy the suggested fields into a draft, keeping the draft's name
    pub fn prefill(&self, draft: &mut ProductDraft) {
        if is_valid_price(self.price) {
            draft.price = Some(self.price);
        }
        if !self.code.trim().is_empty() {
            draft.code = Some(self.code.clone());
        }
        if !self.description.trim().is_empty() {
            draft.description = Some(self.description.clone());
        }
        draft.category = self.category;
    }
}

#[derive(Error, Debug)]
pub enum SuggestError {
    #[error("Suggestion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Suggestion service returned status {0}")]
    Status(u16),

    #[error("Unexpected suggestion response: {0}")]
    Response(String),

    #[error("Malformed suggestion: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of product suggestions
pub trait Suggester: Send + Sync {
    /// Suggest data for a product called `name`; `None` when nothing could be
    /// suggested
    fn suggest<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Option<Suggestion>>;
}

/// Suggester used when no service is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSuggester;

impl Suggester for DisabledSuggester {
    fn suggest<'a>(&'a self, _name: &'a str) -> BoxFuture<'a, Option<Suggestion>> {
        Box::pin(async { None })
    }
}

/// Suggester backed by a Gemini `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiSuggester {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiSuggester {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Build from the environment. Returns `None` (and logs) when no key is
    /// configured.
    pub fn from_env() -> Option<Self> {
        let key = API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty() && value != "undefined");
        if key.is_none() {
            warn!("No suggestion API key configured (set GEMINI_API_KEY)");
        }
        key.map(Self::new)
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn request(&self, name: &str) -> Result<Suggestion, SuggestError> {
        let url = format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        );
        let body = serde_json::to_vec(&request_body(name))?;

        let response = self
            .client
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", &self.api_key)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SuggestError::Status(status.as_u16()));
        }

        parse_response(&response.text().await?)
    }
}

impl Suggester for GeminiSuggester {
    fn suggest<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Option<Suggestion>> {
        Box::pin(async move {
            if name.trim().is_empty() {
                return None;
            }
            match self.request(name).await {
                Ok(suggestion) => {
                    debug!("Suggestion for '{name}': {suggestion:?}");
                    Some(suggestion)
                }
                Err(e) => {
                    warn!("Could not get a suggestion for '{name}': {e}");
                    None
                }
            }
        })
    }
}

/// Start a creation draft for `name`, prefilled with whatever `suggester`
/// comes up with
pub async fn suggest_draft(suggester: &dyn Suggester, name: &str) -> ProductDraft {
    let mut draft = ProductDraft::new(name.trim());
    if let Some(suggestion) = suggester.suggest(name).await {
        suggestion.prefill(&mut draft);
    }
    draft
}

fn request_body(name: &str) -> serde_json::Value {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
    let prompt = format!(
        "Genera datos realistas para un producto de cafetería llamado \"{name}\". \
         Estima un precio en USD, inventa un código de producto corto (ej: CAF-01) \
         y una descripción breve y apetitosa en español. \
         Clasifícalo en una de las siguientes categorías: {}.",
        categories.join(", ")
    );

    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "temperature": 0.7,
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "precio": { "type": "NUMBER" },
                    "codigo": { "type": "STRING" },
                    "descripcion": { "type": "STRING" },
                    "categoria": { "type": "STRING", "enum": categories }
                },
                "required": ["precio", "codigo", "descripcion", "categoria"]
            }
        }
    })
}

/// Pull the JSON suggestion out of a `generateContent` response
fn parse_response(text: &str) -> Result<Suggestion, SuggestError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let inner = value
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| SuggestError::Response("no candidate text".to_string()))?;
    Ok(serde_json::from_str(inner)?)
}
