//! Service error taxonomy and its HTTP mapping.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::identity::AuthError;
use crate::session::FlowError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),
  #[error(transparent)]
  Auth(#[from] AuthError),
  #[error("{0}")]
  NotFound(String),
  #[error("Teacher sign-in required.")]
  Unauthorized,
  #[error(transparent)]
  Flow(#[from] FlowError),
  #[error(transparent)]
  Store(#[from] StoreError),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Serialize)]
pub struct ErrorBody {
  pub error: &'static str,
  pub message: String,
}

impl AppError {
  pub fn kind(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "validation",
      AppError::Auth(_) => "auth",
      AppError::NotFound(_) => "not_found",
      AppError::Unauthorized => "unauthorized",
      AppError::Flow(_) => "flow",
      AppError::Store(_) => "store_unavailable",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Flow(_) => StatusCode::CONFLICT,
      AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  /// Text shown to the user. Store internals are not leaked.
  pub fn user_message(&self) -> String {
    match self {
      AppError::Store(_) => "The database is unavailable right now. Please try again shortly.".into(),
      other => other.to_string(),
    }
  }

  pub fn body(&self) -> ErrorBody {
    ErrorBody { error: self.kind(), message: self.user_message() }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    if let AppError::Store(e) = &self {
      warn!(target: "store", error = %e, "Store error surfaced to client");
    }
    (self.status(), Json(self.body())).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn statuses_follow_error_kind() {
    assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::from(AuthError::InvalidPassword).status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::from(FlowError::NoMissionSelected).status(), StatusCode::CONFLICT);
    assert_eq!(AppError::from(StoreError::Request("down".into())).status(), StatusCode::SERVICE_UNAVAILABLE);
  }

  #[test]
  fn store_details_stay_internal() {
    let e = AppError::from(StoreError::Request("10.0.0.3 refused".into()));
    assert!(!e.user_message().contains("10.0.0.3"));
    assert_eq!(e.body().error, "store_unavailable");
  }
}
