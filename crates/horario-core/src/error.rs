//! Error types for `horario-core`.
//!
//! Every variant carries exactly one human-readable message; callers surface
//! it verbatim.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A field is missing or malformed, or the batch itself is unusable.
  #[error("{0}")]
  InvalidInput(String),

  #[error("{0}")]
  NotFound(String),

  /// Duplicate code or a scheduling collision.
  #[error("{0}")]
  Conflict(String),

  /// A referenced code does not resolve, or resolves to an incompatible
  /// record (inactive teacher, mismatched career, foreign jornada, ...).
  #[error("{0}")]
  ReferentialIntegrity(String),

  /// The caller's scope does not cover the requested data.
  #[error("{0}")]
  Forbidden(String),
}

impl Error {
  pub fn invalid(message: impl Into<String>) -> Self { Self::InvalidInput(message.into()) }

  pub fn conflict(message: impl Into<String>) -> Self { Self::Conflict(message.into()) }

  pub fn integrity(message: impl Into<String>) -> Self {
    Self::ReferentialIntegrity(message.into())
  }

  pub fn message(&self) -> &str {
    match self {
      Self::InvalidInput(m)
      | Self::NotFound(m)
      | Self::Conflict(m)
      | Self::ReferentialIntegrity(m)
      | Self::Forbidden(m) => m,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by storage backend errors.
///
/// Conflicts detected inside a store transaction travel through the backend's
/// own error type; this lets the orchestrator recover them as domain errors
/// instead of reporting a storage failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// Return the wrapped domain error, or give `self` back when the failure is
  /// purely a storage one.
  fn into_schedule(self) -> Result<Error, Self>
  where
    Self: Sized;
}
