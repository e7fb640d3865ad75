//! Core types and scheduling rules for the Horario assignment engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the validation pipeline, conflict classification, matrix aggregation and
//! the [`Scheduler`] orchestrator; storage backends implement
//! [`store::ScheduleStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assignment;
pub mod codegen;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod normalize;
pub mod reference;
pub mod rules;
pub mod store;
pub mod view;

pub use engine::{EngineError, Listing, Scheduler};
pub use error::{Error, Result, StoreError};
