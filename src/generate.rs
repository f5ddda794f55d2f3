//! Generative-model collaborators.
//!
//! Two narrow interfaces sit between Passage and the remote model:
//! - **[`TextGenerator`]**: prompt in, reply text out.
//! - **[`ImageGenerator`]**: prompt in, optional image bytes plus an
//!   optional caption out. "No image" is a valid answer, not an error.
//!
//! [`GeminiClient`] implements both over the Gemini `generateContent`
//! REST endpoint. Calls are single round trips with an explicit request
//! timeout and no retry; any transport or API fault is returned as an
//! error for the caller to surface.
//!
//! Response parsing is kept in pure functions ([`parse_text_response`],
//! [`parse_image_response`]) so it can be tested without a network.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

use crate::config::ModelConfig;

/// Text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Output of an image generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedImage {
    pub image: Option<Vec<u8>>,
    pub mime_type: Option<String>,
    pub caption: Option<String>,
}

/// Image generation backend.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_image(&self, model: &str, prompt: &str) -> Result<GeneratedImage>;
}

/// Gemini REST client.
///
/// The API key is read once at construction from the environment
/// variable named by `model.api_key_env`.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns an error if the API key variable is unset or empty, or the
    /// HTTP client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("{} environment variable not set", config.api_key_env))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        tracing::debug!(%model, "calling generateContent");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to model '{}' failed", model))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Gemini API error {}: {}", status, body_text);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let json = self.generate_content(model, &text_request(prompt)).await?;
        parse_text_response(&json)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_image(&self, model: &str, prompt: &str) -> Result<GeneratedImage> {
        let json = self.generate_content(model, &image_request(prompt)).await?;
        parse_image_response(&json)
    }
}

/// Request body for a plain text prompt.
pub fn text_request(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
    })
}

/// Request body asking for both text and image output.
pub fn image_request(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
    })
}

fn first_candidate_parts(json: &serde_json::Value) -> Result<&Vec<serde_json::Value>> {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| anyhow!("Invalid Gemini response: missing candidates[0].content.parts"))
}

/// Concatenate the text parts of the first candidate.
pub fn parse_text_response(json: &serde_json::Value) -> Result<String> {
    let parts = first_candidate_parts(json)?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    if text.is_empty() {
        bail!("Gemini response contained no text");
    }
    Ok(text)
}

/// Extract the last text part as caption and the last inline image.
pub fn parse_image_response(json: &serde_json::Value) -> Result<GeneratedImage> {
    let parts = first_candidate_parts(json)?;
    let mut out = GeneratedImage::default();

    for part in parts {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            out.caption = Some(text.to_string());
        } else if let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) {
            let data = inline
                .get("data")
                .and_then(|d| d.as_str())
                .ok_or_else(|| anyhow!("Invalid Gemini response: inline data without payload"))?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(data)
                .context("Invalid base64 image payload")?;
            out.image = Some(bytes);
            out.mime_type = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(|m| m.as_str())
                .map(String::from);
        }
    }

    Ok(out)
}
