//! SQLite backend for the Horario assignment engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Batch writes run inside one
//! `IMMEDIATE` transaction; dropping the transaction handle on any early
//! return rolls it back.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
