//! JSON REST API for Horario.
//!
//! Exposes an axum [`Router`] backed by any [`horario_core::store::ScheduleStore`].
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility; the caller must attach a [`scope::Caller`] request
//! extension to every request before it reaches these handlers.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", horario_api::api_router(store.clone()))
//! ```

pub mod assignments;
pub mod error;
pub mod scope;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get},
};
use horario_core::{Scheduler, store::ScheduleStore};

pub use error::ApiError;
pub use scope::{Caller, Role};

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ScheduleStore + 'static,
{
  Router::new()
    .route(
      "/assignments",
      get(assignments::list::<S>).post(assignments::create::<S>),
    )
    .route(
      "/assignments/matrix/{id}",
      get(assignments::get_matrix::<S>)
        .put(assignments::replace_matrix::<S>)
        .delete(assignments::delete_matrix::<S>),
    )
    .route("/assignments/{id}", delete(assignments::delete_one::<S>))
    .with_state(Scheduler::new(store))
}

#[cfg(test)]
mod tests;
