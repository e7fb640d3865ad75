//! HTTP Basic authentication against the configured accounts.
//!
//! A successful check attaches the account's [`Caller`] to the request so the
//! API handlers can apply its jornada scope.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use horario_api::Caller;
use tracing::debug;

use crate::{AccountConfig, error::Error};

/// Resolve the caller from an `Authorization: Basic` header.
pub fn verify_auth(headers: &HeaderMap, accounts: &[AccountConfig]) -> Result<Caller, Error> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::MissingCredentials)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::MissingCredentials)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::InvalidCredentials)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::InvalidCredentials)?;

  let (username, password) = creds.split_once(':').ok_or(Error::InvalidCredentials)?;

  let account = accounts
    .iter()
    .find(|a| a.username == username)
    .ok_or(Error::InvalidCredentials)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| Error::InvalidCredentials)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::InvalidCredentials)?;

  Ok(account.caller())
}

/// Middleware guarding the API: rejects with 401 or forwards the request with
/// its [`Caller`] extension set.
pub async fn require_caller(
  State(accounts): State<Arc<Vec<AccountConfig>>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let caller = verify_auth(req.headers(), &accounts)
    .inspect_err(|e| debug!(error = %e, path = %req.uri().path(), "authentication failed"))?;
  req.extensions_mut().insert(caller);
  Ok(next.run(req).await)
}
