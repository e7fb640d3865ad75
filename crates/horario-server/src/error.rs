//! Authentication errors and their `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("Authentication required")]
  MissingCredentials,
  #[error("Invalid credentials")]
  InvalidCredentials,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let mut res =
      (StatusCode::UNAUTHORIZED, Json(json!({ "message": self.to_string() }))).into_response();
    res.headers_mut().insert(
      header::WWW_AUTHENTICATE,
      HeaderValue::from_static("Basic realm=\"horario\""),
    );
    res
  }
}
