/// Image generation client
///
/// This module handles:
/// - The `ImageGenerator` seam the shell depends on
/// - Talking to the Gemini `generateContent` REST endpoint
/// - Turning the first inline image part into a `data:` URI

pub mod error;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::config::{Config, API_KEY_VAR};
pub use error::GenerateError;
use types::{ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

/// MIME type assumed when an inline part does not declare one
pub const FALLBACK_MIME_TYPE: &str = "image/png";

/// Anything that can turn a prompt into an image data URI
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Make exactly one generation attempt for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Client for the Gemini image model
pub struct GeminiClient {
    http: reqwest::Client,
    config: Config,
}

impl GeminiClient {
    pub fn new(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn request_image(&self, api_key: &str, prompt: &str) -> Result<String, GenerateError> {
        let url = self.config.generate_url();
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&GenerateContentRequest::for_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GenerateError::Upstream(upstream_message(status.as_u16(), &body)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GenerateError::Upstream(format!("Malformed response: {}", e)))?;

        extract_image(&parsed)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(GenerateError::Configuration(format!("set {}", API_KEY_VAR)));
        };

        match self.request_image(api_key, prompt).await {
            Ok(data_uri) => {
                info!("✨ Generated image ({} bytes encoded)", data_uri.len());
                Ok(data_uri)
            }
            Err(e) => {
                error!("Gemini API error: {}", e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("config", &self.config)
            .finish()
    }
}

/// Find the first inline image part of the first candidate and encode it
/// as a data URI, keeping its declared MIME type.
pub fn extract_image(response: &GenerateContentResponse) -> Result<String, GenerateError> {
    let parts = response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();

    parts
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
        .map(|inline| {
            let mime_type = inline
                .mime_type
                .as_deref()
                .filter(|mime| !mime.is_empty())
                .unwrap_or(FALLBACK_MIME_TYPE);
            format!("data:{};base64,{}", mime_type, inline.data)
        })
        .ok_or(GenerateError::NoImageData)
}

/// Build a readable message from a failed HTTP response, preferring the
/// API's own error message when the body carries one.
fn upstream_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            format!("HTTP {}: {}", status, envelope.error.message)
        }
        _ if body.trim().is_empty() => format!("HTTP {}", status),
        _ => format!("HTTP {}: {}", status, body.trim()),
    }
}
