//! Illustration lookup for the image-guess mission.
//!
//! Providers are tried in order (AI generator, stock photo, generated placeholder);
//! the first usable image wins. If every provider fails, a built-in 1x1 PNG is served
//! so the mission can always start.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::util::with_timeout;

const BUILTIN_PNG_B64: &str =
  "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

/// An image is either hosted somewhere or carried inline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageContent {
  Url(String),
  Bytes { mime: String, data: Vec<u8> },
}

impl ImageContent {
  /// Something a browser can put in `<img src>`.
  pub fn to_src(&self) -> String {
    match self {
      ImageContent::Url(u) => u.clone(),
      ImageContent::Bytes { mime, data } => format!("data:{};base64,{}", mime, STANDARD.encode(data)),
    }
  }

  fn check(&self) -> Result<(), String> {
    match self {
      ImageContent::Url(u) if u.starts_with("https://") || u.starts_with("http://") || u.starts_with("data:") => Ok(()),
      ImageContent::Url(u) => Err(format!("unusable image url '{}'", crate::util::trunc_for_log(u, 60))),
      ImageContent::Bytes { data, .. } if data.is_empty() => Err("empty image payload".into()),
      ImageContent::Bytes { .. } => Ok(()),
    }
  }
}

#[derive(Clone, Debug)]
pub struct GeneratedImage {
  /// Name of the provider that produced it.
  pub source: String,
  pub content: ImageContent,
}

#[derive(Clone, Debug, Serialize)]
pub struct ImageOut {
  pub src: String,
  pub source: String,
}

impl From<&GeneratedImage> for ImageOut {
  fn from(img: &GeneratedImage) -> Self {
    ImageOut { src: img.content.to_src(), source: img.source.clone() }
  }
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
  fn name(&self) -> &'static str;
  async fn generate(&self, subject: &str) -> Result<ImageContent, String>;
}

/// Ordered provider list with uniform try/fallback semantics.
#[derive(Clone)]
pub struct ImageChain {
  providers: Vec<Arc<dyn ImageProvider>>,
  timeout: Duration,
}

impl ImageChain {
  pub fn new(providers: Vec<Arc<dyn ImageProvider>>, timeout: Duration) -> Self {
    Self { providers, timeout }
  }

  pub fn provider_names(&self) -> Vec<&'static str> {
    self.providers.iter().map(|p| p.name()).collect()
  }

  /// Returns the first usable image plus one user-facing warning per failed provider.
  #[instrument(level = "info", skip(self), fields(providers = self.providers.len()))]
  pub async fn generate(&self, subject: &str) -> (GeneratedImage, Vec<String>) {
    let mut warnings = vec![];
    for p in &self.providers {
      let attempt = with_timeout(self.timeout, p.generate(subject))
        .await
        .and_then(|c| c.check().map(|_| c));
      match attempt {
        Ok(content) => {
          info!(target: "mission", provider = p.name(), "Image ready");
          return (GeneratedImage { source: p.name().to_string(), content }, warnings);
        }
        Err(e) => {
          warn!(target: "mission", provider = p.name(), error = %e, "Image provider failed; trying next");
          warnings.push(format!("Image service '{}' is unavailable ({}).", p.name(), e));
        }
      }
    }
    warnings.push("Showing a built-in image instead.".into());
    (builtin_image(), warnings)
  }
}

/// Absolute last resort: a transparent 1x1 PNG.
pub fn builtin_image() -> GeneratedImage {
  GeneratedImage {
    source: "builtin".into(),
    content: ImageContent::Bytes {
      mime: "image/png".into(),
      data: STANDARD.decode(BUILTIN_PNG_B64).unwrap_or_default(),
    },
  }
}

/// Stock photo search (Unsplash random-photo API). Fails fast when no key is configured.
pub struct StockPhoto {
  client: reqwest::Client,
  base_url: String,
  access_key: Option<String>,
}

impl StockPhoto {
  pub fn from_env() -> Self {
    Self {
      client: reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default(),
      base_url: std::env::var("UNSPLASH_BASE_URL").unwrap_or_else(|_| "https://api.unsplash.com".into()),
      access_key: std::env::var("UNSPLASH_ACCESS_KEY").ok().filter(|k| !k.is_empty()),
    }
  }
}

#[derive(Deserialize)]
struct UnsplashPhoto {
  urls: UnsplashUrls,
}
#[derive(Deserialize)]
struct UnsplashUrls {
  regular: String,
}

#[async_trait]
impl ImageProvider for StockPhoto {
  fn name(&self) -> &'static str { "stock_photo" }

  async fn generate(&self, subject: &str) -> Result<ImageContent, String> {
    let key = self.access_key.as_deref().ok_or("UNSPLASH_ACCESS_KEY not set")?;
    let res = self
      .client
      .get(format!("{}/photos/random", self.base_url))
      .query(&[("query", subject), ("orientation", "squarish")])
      .header(USER_AGENT, "readfit-backend/0.1")
      .header(ACCEPT, "application/json")
      .header("Accept-Version", "v1")
      .header(AUTHORIZATION, format!("Client-ID {}", key))
      .send()
      .await
      .map_err(|e| e.to_string())?;
    if !res.status().is_success() {
      return Err(format!("stock photo HTTP {}", res.status()));
    }
    let photo: UnsplashPhoto = res.json().await.map_err(|e| e.to_string())?;
    Ok(ImageContent::Url(photo.urls.regular))
  }
}

/// Locally drawn SVG card. Shows one blank per letter, never the word itself.
pub struct Placeholder;

#[async_trait]
impl ImageProvider for Placeholder {
  fn name(&self) -> &'static str { "placeholder" }

  async fn generate(&self, subject: &str) -> Result<ImageContent, String> {
    Ok(ImageContent::Bytes { mime: "image/svg+xml".into(), data: placeholder_svg(subject).into_bytes() })
  }
}

fn placeholder_svg(subject: &str) -> String {
  let blanks = vec!["_"; subject.chars().filter(|c| c.is_alphabetic()).count().max(1)].join(" ");
  format!(
    concat!(
      r##"<svg xmlns="http://www.w3.org/2000/svg" width="512" height="512" viewBox="0 0 512 512">"##,
      r##"<rect width="512" height="512" rx="32" fill="#e0f2fe"/>"##,
      r##"<text x="256" y="250" font-size="180" text-anchor="middle" fill="#0f172a" font-family="sans-serif">?</text>"##,
      r##"<text x="256" y="380" font-size="40" text-anchor="middle" fill="#475569" font-family="monospace">{}</text>"##,
      "</svg>"
    ),
    blanks
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Failing(&'static str);
  #[async_trait]
  impl ImageProvider for Failing {
    fn name(&self) -> &'static str { self.0 }
    async fn generate(&self, _subject: &str) -> Result<ImageContent, String> {
      Err("service down".into())
    }
  }

  struct Slow;
  #[async_trait]
  impl ImageProvider for Slow {
    fn name(&self) -> &'static str { "slow" }
    async fn generate(&self, _subject: &str) -> Result<ImageContent, String> {
      tokio::time::sleep(Duration::from_secs(5)).await;
      Ok(ImageContent::Url("https://example.com/late.png".into()))
    }
  }

  struct BadUrl;
  #[async_trait]
  impl ImageProvider for BadUrl {
    fn name(&self) -> &'static str { "bad_url" }
    async fn generate(&self, _subject: &str) -> Result<ImageContent, String> {
      Ok(ImageContent::Url("not a url".into()))
    }
  }

  #[tokio::test]
  async fn falls_through_to_placeholder() {
    let chain = ImageChain::new(
      vec![Arc::new(Failing("openai")) as Arc<dyn ImageProvider>, Arc::new(Slow), Arc::new(BadUrl), Arc::new(Placeholder)],
      Duration::from_millis(50),
    );
    let (img, warnings) = chain.generate("dog").await;
    assert_eq!(img.source, "placeholder");
    assert_eq!(warnings.len(), 3);
    assert!(img.content.to_src().starts_with("data:image/svg+xml;base64,"));
  }

  #[tokio::test]
  async fn empty_chain_serves_builtin_png() {
    let chain = ImageChain::new(vec![Arc::new(Failing("openai")) as Arc<dyn ImageProvider>], Duration::from_millis(50));
    let (img, warnings) = chain.generate("cat").await;
    assert_eq!(img.source, "builtin");
    assert_eq!(warnings.len(), 2);
    match &img.content {
      ImageContent::Bytes { mime, data } => {
        assert_eq!(mime, "image/png");
        assert!(data.starts_with(&[0x89, b'P', b'N', b'G']));
      }
      other => panic!("expected bytes, got {other:?}"),
    }
  }

  #[test]
  fn placeholder_hides_the_word() {
    let svg = placeholder_svg("apple");
    assert!(!svg.contains("apple"));
    assert!(svg.contains("_ _ _ _ _"));
  }

  #[tokio::test]
  async fn stock_photo_without_key_fails_fast() {
    let p = StockPhoto { client: reqwest::Client::new(), base_url: "http://127.0.0.1:9".into(), access_key: None };
    assert!(p.generate("tree").await.is_err());
  }
}
