//! Teacher sign-in. Only email/password against Firebase Auth's REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Normalized sign-in failures.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
  #[error("That email address is not valid.")]
  InvalidEmail,
  #[error("The password is incorrect.")]
  InvalidPassword,
  #[error("This account has been disabled.")]
  UserDisabled,
  #[error("No account is registered with that email.")]
  UserNotFound,
  #[error("Sign-in failed: {0}")]
  Other(String),
}

impl AuthError {
  /// Map a provider error code (e.g. `INVALID_PASSWORD : extra detail`).
  pub fn from_code(raw: &str) -> Self {
    let code = raw.split(|c: char| c == ' ' || c == ':').next().unwrap_or(raw);
    match code {
      "INVALID_EMAIL" => AuthError::InvalidEmail,
      "INVALID_PASSWORD" => AuthError::InvalidPassword,
      "USER_DISABLED" => AuthError::UserDisabled,
      "USER_NOT_FOUND" | "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
      _ => AuthError::Other(raw.to_string()),
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Identity {
  pub email: String,
  pub user_id: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
  async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
}

#[derive(Clone)]
pub struct FirebaseIdentity {
  client: reqwest::Client,
  base_url: String,
  api_key: Option<String>,
}

#[derive(Serialize)]
struct SignInReq<'a> {
  email: &'a str,
  password: &'a str,
  #[serde(rename = "returnSecureToken")]
  return_secure_token: bool,
}

#[derive(Deserialize)]
struct SignInResp {
  #[serde(default)]
  email: Option<String>,
  #[serde(rename = "localId", default)]
  local_id: Option<String>,
}

impl FirebaseIdentity {
  /// Reads FIREBASE_WEB_API_KEY and FIREBASE_AUTH_BASE_URL. A missing key makes every sign-in fail.
  pub fn from_env() -> Self {
    Self {
      client: reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default(),
      base_url: std::env::var("FIREBASE_AUTH_BASE_URL")
        .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com/v1".into()),
      api_key: std::env::var("FIREBASE_WEB_API_KEY").ok().filter(|k| !k.is_empty()),
    }
  }

  pub fn is_configured(&self) -> bool {
    self.api_key.is_some()
  }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
  #[instrument(level = "info", skip(self, password))]
  async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
    let key = self
      .api_key
      .as_deref()
      .ok_or_else(|| AuthError::Other("FIREBASE_WEB_API_KEY is not configured".into()))?;
    let url = format!("{}/accounts:signInWithPassword", self.base_url.trim_end_matches('/'));
    let res = self
      .client
      .post(&url)
      .query(&[("key", key)])
      .header(USER_AGENT, "readfit-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&SignInReq { email, password, return_secure_token: true })
      .send()
      .await
      .map_err(|e| AuthError::Other(e.to_string()))?;

    if !res.status().is_success() {
      let body = res.text().await.unwrap_or_default();
      let code = extract_firebase_error(&body).unwrap_or_else(|| "sign-in failed".into());
      let err = AuthError::from_code(&code);
      warn!(target: "readfit_backend", %code, "Teacher sign-in rejected");
      return Err(err);
    }

    let body: SignInResp = res.json().await.map_err(|e| AuthError::Other(e.to_string()))?;
    let identity = Identity {
      email: body.email.unwrap_or_else(|| email.to_string()),
      user_id: body.local_id.unwrap_or_default(),
    };
    info!(target: "readfit_backend", user_id = %identity.user_id, "Teacher signed in");
    Ok(identity)
  }
}

fn extract_firebase_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn provider_codes_are_normalized() {
    assert_eq!(AuthError::from_code("INVALID_EMAIL"), AuthError::InvalidEmail);
    assert_eq!(AuthError::from_code("INVALID_PASSWORD"), AuthError::InvalidPassword);
    assert_eq!(AuthError::from_code("USER_DISABLED"), AuthError::UserDisabled);
    assert_eq!(AuthError::from_code("USER_NOT_FOUND"), AuthError::UserNotFound);
    assert_eq!(AuthError::from_code("EMAIL_NOT_FOUND"), AuthError::UserNotFound);
    assert_eq!(
      AuthError::from_code("TOO_MANY_ATTEMPTS_TRY_LATER : Try again later."),
      AuthError::Other("TOO_MANY_ATTEMPTS_TRY_LATER : Try again later.".into())
    );
    assert_eq!(AuthError::from_code("INVALID_PASSWORD : wrong"), AuthError::InvalidPassword);
  }

  #[test]
  fn error_body_message_is_extracted() {
    let body = r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND","errors":[]}}"#;
    assert_eq!(extract_firebase_error(body).as_deref(), Some("EMAIL_NOT_FOUND"));
    assert_eq!(extract_firebase_error("<html>"), None);
  }

  #[tokio::test]
  async fn unconfigured_provider_fails_closed() {
    let id = FirebaseIdentity { client: reqwest::Client::new(), base_url: "http://127.0.0.1:9".into(), api_key: None };
    assert!(!id.is_configured());
    assert!(matches!(id.sign_in("a@b.c", "pw").await, Err(AuthError::Other(_))));
  }
}
