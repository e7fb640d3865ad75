//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use horario_core::{EngineError, Error, StoreError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Schedule(#[from] Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl<E: StoreError> From<EngineError<E>> for ApiError {
  fn from(err: EngineError<E>) -> Self {
    match err {
      EngineError::Schedule(e) => Self::Schedule(e),
      EngineError::Store(e) => Self::Store(Box::new(e)),
    }
  }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::Schedule(Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
      Self::Schedule(Error::NotFound(_)) => StatusCode::NOT_FOUND,
      Self::Schedule(Error::Conflict(_)) => StatusCode::CONFLICT,
      Self::Schedule(Error::ReferentialIntegrity(_)) => StatusCode::UNPROCESSABLE_ENTITY,
      Self::Schedule(Error::Forbidden(_)) => StatusCode::FORBIDDEN,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      Self::Schedule(e) => e.message().to_owned(),
      Self::Store(e) => {
        error!(error = %e, "store failure");
        e.to_string()
      }
    };
    (status, Json(json!({ "message": message }))).into_response()
  }
}
