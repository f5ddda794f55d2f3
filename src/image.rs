//! Character image generation with placeholder fallback.
//!
//! When the model answers without an image, or the call fails, a random
//! placeholder image is fetched instead and the record is marked as such.
//! Only a failure of the placeholder fetch itself is reported as an error.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Local;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ImageConfig;
use crate::generate::ImageGenerator;
use crate::history::{PromptHistory, TIMESTAMP_FORMAT};

/// Source of fallback images.
#[async_trait]
pub trait PlaceholderSource: Send + Sync {
    async fn fetch(&self, width: u32, height: u32) -> Result<Vec<u8>>;
}

/// Fetches `{base}/{width}/{height}?random={ts}` over HTTP.
pub struct HttpPlaceholder {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPlaceholder {
    pub fn new(config: &ImageConfig, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.placeholder_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PlaceholderSource for HttpPlaceholder {
    async fn fetch(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        let url = format!(
            "{}/{}/{}?random={}",
            self.base_url,
            width,
            height,
            Local::now().timestamp_millis()
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch placeholder image from {}", url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("Placeholder service error {}", status);
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// One generated (or substituted) image.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
    pub prompt: String,
    pub caption: Option<String>,
    pub placeholder: bool,
    pub timestamp: String,
}

impl ImageRecord {
    /// File extension matching the image payload.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_deref() {
            Some("image/jpeg") => "jpg",
            Some("image/webp") => "webp",
            _ => "png",
        }
    }
}

/// Prompt describing `character`, with optional extra scene details.
pub fn character_image_prompt(character: &str, details: Option<&str>) -> String {
    let mut subject = format!("{} from Harry Potter", character);
    if let Some(details) = details.map(str::trim).filter(|d| !d.is_empty()) {
        subject.push_str(", ");
        subject.push_str(details);
    }
    format!(
        "Create a detailed sketch of {}. Make it high quality and in the style of book illustrations.",
        subject
    )
}

/// An image that was written to disk, without its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    pub prompt: String,
    pub caption: Option<String>,
    pub placeholder: bool,
    pub timestamp: String,
}

/// Images produced in this session.
///
/// The newest image becomes current. Clearing the current image keeps it
/// in the history.
#[derive(Debug, Default)]
pub struct ImageGallery {
    records: Vec<SavedImage>,
    current: Option<usize>,
}

impl ImageGallery {
    pub fn current(&self) -> Option<&SavedImage> {
        self.current.and_then(|i| self.records.get(i))
    }

    pub fn records(&self) -> &[SavedImage] {
        &self.records
    }

    /// Up to `n` of the newest images, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &SavedImage> {
        self.records.iter().rev().take(n)
    }

    /// Record `record` as saved at `path` and make it current.
    pub fn push(&mut self, record: &ImageRecord, path: PathBuf) {
        self.records.push(SavedImage {
            path,
            prompt: record.prompt.clone(),
            caption: record.caption.clone(),
            placeholder: record.placeholder,
            timestamp: record.timestamp.clone(),
        });
        self.current = Some(self.records.len() - 1);
    }

    /// Returns false when there was no current image.
    pub fn clear_current(&mut self) -> bool {
        self.current.take().is_some()
    }
}

/// Generate an image for `prompt`, substituting a placeholder when the
/// model gives none.
pub async fn generate_image(
    generator: &dyn ImageGenerator,
    placeholder: &dyn PlaceholderSource,
    config: &ImageConfig,
    model: &str,
    prompt: &str,
    history: &mut PromptHistory,
) -> Result<ImageRecord> {
    history.record("Image Generation", prompt);
    let timestamp = || Local::now().format(TIMESTAMP_FORMAT).to_string();

    let (prompt_suffix, caption) = match generator.generate_image(model, prompt).await {
        Ok(generated) => match generated.image {
            Some(bytes) => {
                tracing::info!(bytes = bytes.len(), "model returned an image");
                return Ok(ImageRecord {
                    bytes,
                    mime_type: generated.mime_type,
                    prompt: prompt.to_string(),
                    caption: generated.caption,
                    placeholder: false,
                    timestamp: timestamp(),
                });
            }
            None => {
                tracing::warn!("model returned no image, using placeholder");
                (
                    " (placeholder)",
                    "Generated using a placeholder image service since the model didn't return an image."
                        .to_string(),
                )
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "image generation failed, using placeholder");
            (
                " (placeholder due to error)",
                format!("Error with image model: {}. Using placeholder image.", e),
            )
        }
    };

    let bytes = placeholder.fetch(config.width, config.height).await?;
    Ok(ImageRecord {
        bytes,
        mime_type: None,
        prompt: format!("{}{}", prompt, prompt_suffix),
        caption: Some(caption),
        placeholder: true,
        timestamp: timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GeneratedImage;

    struct FixedImage(Option<Vec<u8>>);

    #[async_trait]
    impl ImageGenerator for FixedImage {
        async fn generate_image(&self, _model: &str, _prompt: &str) -> Result<GeneratedImage> {
            Ok(GeneratedImage {
                image: self.0.clone(),
                mime_type: Some("image/png".to_string()),
                caption: Some("caption".to_string()),
            })
        }
    }

    struct FailingImage;

    #[async_trait]
    impl ImageGenerator for FailingImage {
        async fn generate_image(&self, _model: &str, _prompt: &str) -> Result<GeneratedImage> {
            bail!("quota exceeded")
        }
    }

    struct StubPlaceholder;

    #[async_trait]
    impl PlaceholderSource for StubPlaceholder {
        async fn fetch(&self, _width: u32, _height: u32) -> Result<Vec<u8>> {
            Ok(b"placeholder".to_vec())
        }
    }

    #[test]
    fn test_character_image_prompt() {
        assert_eq!(
            character_image_prompt("Hagrid", Some("  feeding a dragon ")),
            "Create a detailed sketch of Hagrid from Harry Potter, feeding a dragon. Make it high quality and in the style of book illustrations."
        );
        assert!(character_image_prompt("Hagrid", Some("")).contains("Hagrid from Harry Potter. Make"));
    }

    #[tokio::test]
    async fn test_model_image_used() {
        let mut history = PromptHistory::default();
        let rec = generate_image(
            &FixedImage(Some(vec![1, 2, 3])),
            &StubPlaceholder,
            &ImageConfig::default(),
            "m",
            "draw",
            &mut history,
        )
        .await
        .unwrap();
        assert!(!rec.placeholder);
        assert_eq!(rec.bytes, vec![1, 2, 3]);
        assert_eq!(rec.prompt, "draw");
        assert_eq!(history.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_no_image_falls_back() {
        let mut history = PromptHistory::default();
        let rec = generate_image(
            &FixedImage(None),
            &StubPlaceholder,
            &ImageConfig::default(),
            "m",
            "draw",
            &mut history,
        )
        .await
        .unwrap();
        assert!(rec.placeholder);
        assert_eq!(rec.bytes, b"placeholder".to_vec());
        assert_eq!(rec.prompt, "draw (placeholder)");
    }

    #[tokio::test]
    async fn test_error_falls_back() {
        let mut history = PromptHistory::default();
        let rec = generate_image(
            &FailingImage,
            &StubPlaceholder,
            &ImageConfig::default(),
            "m",
            "draw",
            &mut history,
        )
        .await
        .unwrap();
        assert!(rec.placeholder);
        assert_eq!(rec.prompt, "draw (placeholder due to error)");
        assert!(rec.caption.unwrap().contains("quota exceeded"));
    }

    fn record(prompt: &str) -> ImageRecord {
        ImageRecord {
            bytes: vec![0; 16],
            mime_type: None,
            prompt: prompt.to_string(),
            caption: Some(format!("{} caption", prompt)),
            placeholder: false,
            timestamp: String::new(),
        }
    }

    #[test]
    fn test_gallery_current_is_latest() {
        let mut gallery = ImageGallery::default();
        assert!(gallery.current().is_none());
        gallery.push(&record("a"), PathBuf::from("a.png"));
        gallery.push(&record("b"), PathBuf::from("b.png"));
        let current = gallery.current().unwrap();
        assert_eq!(current.prompt, "b");
        assert_eq!(current.path, PathBuf::from("b.png"));
        assert_eq!(current.caption.as_deref(), Some("b caption"));
        assert_eq!(gallery.records().len(), 2);
    }

    #[test]
    fn test_gallery_clear_current_keeps_history() {
        let mut gallery = ImageGallery::default();
        assert!(!gallery.clear_current());
        gallery.push(&record("a"), PathBuf::from("a.png"));
        assert!(gallery.clear_current());
        assert!(gallery.current().is_none());
        assert_eq!(gallery.records().len(), 1);

        gallery.push(&record("b"), PathBuf::from("b.png"));
        assert_eq!(gallery.current().unwrap().prompt, "b");
    }

    #[test]
    fn test_gallery_recent_newest_first() {
        let mut gallery = ImageGallery::default();
        for p in ["a", "b", "c"] {
            gallery.push(&record(p), PathBuf::from(format!("{}.png", p)));
        }
        let prompts: Vec<&str> = gallery.recent(2).map(|i| i.prompt.as_str()).collect();
        assert_eq!(prompts, ["c", "b"]);
    }
}
