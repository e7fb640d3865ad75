//! Error type for `horario-store-sqlite`.

use horario_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain failure raised inside a store operation (e.g. a scheduling
  /// collision found during a batch commit).
  #[error(transparent)]
  Schedule(#[from] horario_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column holds a value the domain types cannot represent.
  #[error("decode error: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn into_schedule(self) -> Result<horario_core::Error, Self> {
    match self {
      Self::Schedule(err) => Ok(err),
      other => Err(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
