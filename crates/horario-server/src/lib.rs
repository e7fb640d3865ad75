//! HTTP server wiring for Horario.
//!
//! Combines the unauthenticated health check with the JSON API from
//! [`horario_api`], guarded by HTTP Basic authentication of the configured
//! accounts.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, middleware, routing::get};
use horario_api::{Caller, Role};
use horario_core::store::ScheduleStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub accounts:   Vec<AccountConfig>,
}

/// One account allowed to use the API.
#[derive(Deserialize, Clone, Debug)]
pub struct AccountConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub role:          Role,
  /// Jornada codes managed by a coordinator.
  #[serde(default)]
  pub jornadas:      Vec<String>,
}

impl AccountConfig {
  pub fn caller(&self) -> Caller {
    match self.role {
      Role::Admin => Caller::admin(&self.username),
      Role::Coordinator => Caller::coordinator(&self.username, self.jornadas.clone()),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Build the complete application router.
pub fn router<S>(store: Arc<S>, accounts: Vec<AccountConfig>) -> Router
where
  S: ScheduleStore + 'static,
{
  let api = horario_api::api_router(store).layer(middleware::from_fn_with_state(
    Arc::new(accounts),
    auth::require_caller,
  ));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
