//! Minimal OpenAI client for our use-cases.
//!
//! We call chat.completions (plain text or a strict JSON object) and images.generations.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::assist::TextGenerator;
use crate::images::{ImageContent, ImageProvider};
use crate::util::fill_template;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub text_model: String,
  pub image_model: String,
  /// Template with a `{word}` slot, used for image prompts.
  pub image_prompt_template: String,
  /// Completion cap for chat calls; unset leaves the model default.
  pub max_tokens: Option<u32>,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(image_prompt_template: &str) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let text_model =
      std::env::var("OPENAI_TEXT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let image_model =
      std::env::var("OPENAI_IMAGE_MODEL").unwrap_or_else(|_| "dall-e-3".into());
    let max_tokens = parse_max_tokens(std::env::var("OPENAI_MAX_TOKENS").ok().as_deref());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()
      .ok()?;

    Some(Self {
      client,
      api_key,
      base_url,
      text_model,
      image_model,
      image_prompt_template: image_prompt_template.to_string(),
      max_tokens,
    })
  }

  async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response, String> {
    let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
    let res = self.client.post(&url)
      .header(USER_AGENT, "readfit-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(body).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, msg));
    }
    Ok(res)
  }

  async fn chat(&self, system: &str, user: &str, temperature: f32, json_mode: bool) -> Result<String, String> {
    let req = ChatCompletionRequest {
      model: self.text_model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: json_mode.then(|| ResponseFormat { r#type: "json_object".into() }),
      max_tokens: self.max_tokens,
    };

    let start = Instant::now();
    let res = self.post("chat/completions", &req).await;
    let body: ChatCompletionResponse = match res {
      Ok(r) => r.json().await.map_err(|e| e.to_string())?,
      Err(e) => {
        error!(elapsed = ?start.elapsed(), error = %e, "OpenAI chat call failed");
        return Err(e);
      }
    };
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, elapsed = ?start.elapsed(), "OpenAI usage");
    }
    Ok(body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string())
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.text_model))]
  pub async fn chat_plain(&self, system: &str, user: &str, temperature: f32) -> Result<String, String> {
    self.chat(system, user, temperature, false).await
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.text_model))]
  pub async fn chat_json<T: for<'a> Deserialize<'a>>(&self, system: &str, user: &str, temperature: f32) -> Result<T, String> {
    let text = self.chat(system, user, temperature, true).await?;
    serde_json::from_str::<T>(&text).map_err(|e| format!("JSON parse error: {}", e))
  }

  /// One square illustration. Accepts either a hosted URL or inline base64.
  #[instrument(level = "info", skip(self), fields(model = %self.image_model))]
  pub async fn generate_image(&self, word: &str) -> Result<ImageContent, String> {
    let req = ImageRequest {
      model: self.image_model.clone(),
      prompt: fill_template(&self.image_prompt_template, &[("word", word)]),
      n: 1,
      size: "1024x1024".into(),
    };
    let start = Instant::now();
    let body: ImageResponse = self.post("images/generations", &req).await?.json().await.map_err(|e| e.to_string())?;
    let first = body.data.into_iter().next().ok_or("OpenAI returned no image")?;
    info!(elapsed = ?start.elapsed(), "OpenAI image generated");
    match (first.url, first.b64_json) {
      (Some(url), _) => Ok(ImageContent::Url(url)),
      (None, Some(b64)) => {
        let data = STANDARD.decode(b64.as_bytes()).map_err(|e| format!("bad image base64: {e}"))?;
        Ok(ImageContent::Bytes { mime: "image/png".into(), data })
      }
      (None, None) => Err("OpenAI image had neither url nor b64_json".into()),
    }
  }
}

#[async_trait]
impl TextGenerator for OpenAI {
  async fn complete_text(&self, system: &str, user: &str) -> Result<String, String> {
    self.chat_plain(system, user, 0.7).await
  }

  async fn complete_json(&self, system: &str, user: &str) -> Result<serde_json::Value, String> {
    let v: serde_json::Value = self.chat_json(system, user, 0.4).await?;
    if !v.is_object() {
      return Err("expected a JSON object".into());
    }
    Ok(v)
  }
}

#[async_trait]
impl ImageProvider for OpenAI {
  fn name(&self) -> &'static str { "openai" }

  async fn generate(&self, subject: &str) -> Result<ImageContent, String> {
    self.generate_image(subject).await
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

// --- Image DTOs ---

#[derive(Serialize)]
struct ImageRequest {
  model: String,
  prompt: String,
  n: u8,
  size: String,
}
#[derive(Deserialize)]
struct ImageResponse { data: Vec<ImageDatum> }
#[derive(Deserialize)]
struct ImageDatum {
  #[serde(default)] url: Option<String>,
  #[serde(default)] b64_json: Option<String>,
}

/// Positive integers only; anything else leaves the cap unset.
fn parse_max_tokens(raw: Option<&str>) -> Option<u32> {
  raw.and_then(|v| v.trim().parse::<u32>().ok()).filter(|n| *n > 0)
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_message_is_pulled_from_body() {
    let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Rate limit reached"));
    assert_eq!(extract_openai_error("gateway timeout"), None);
  }

  #[test]
  fn image_payload_accepts_url_or_base64() {
    let with_url: ImageResponse = serde_json::from_str(r#"{"data":[{"url":"https://x/y.png"}]}"#).unwrap();
    assert_eq!(with_url.data[0].url.as_deref(), Some("https://x/y.png"));
    let with_b64: ImageResponse = serde_json::from_str(r#"{"data":[{"b64_json":"aGk="}]}"#).unwrap();
    assert_eq!(with_b64.data[0].b64_json.as_deref(), Some("aGk="));
  }

  #[test]
  fn json_mode_is_only_sent_when_requested() {
    let req = ChatCompletionRequest {
      model: "m".into(),
      messages: vec![],
      temperature: 0.0,
      response_format: None,
      max_tokens: None,
    };
    let v = serde_json::to_value(&req).unwrap();
    assert!(v.get("response_format").is_none());
    assert!(v.get("max_tokens").is_none());
  }

  #[test]
  fn max_tokens_reads_positive_numbers_only() {
    assert_eq!(parse_max_tokens(Some(" 400 ")), Some(400));
    assert_eq!(parse_max_tokens(Some("0")), None);
    assert_eq!(parse_max_tokens(Some("lots")), None);
    assert_eq!(parse_max_tokens(None), None);
  }
}
