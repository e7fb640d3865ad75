//! The `ScheduleStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `horario-store-sqlite`).
//! [`crate::Scheduler`] depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  StoreError,
  assignment::{Assignment, AssignmentFilter, NewAssignment},
  matrix::LegacyKey,
  reference::{EntityKind, ReferenceRecord},
};

/// A validated batch ready to be written as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommit {
  pub entries:  Vec<NewAssignment>,
  /// The matrix being superseded. Its current members are ignored by the
  /// conflict check and deleted before the new entries are inserted.
  pub replaces: Option<String>,
}

/// Abstraction over a Horario storage backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ScheduleStore: Send + Sync {
  type Error: StoreError;

  // ── Reference store ───────────────────────────────────────────────────

  fn find_by_code(
    &self,
    kind: EntityKind,
    code: String,
  ) -> impl Future<Output = Result<Option<ReferenceRecord>, Self::Error>> + Send + '_;

  /// Fetch every record of `kind` whose code is in `codes`. Unknown codes
  /// are simply absent from the result.
  fn find_many_by_codes(
    &self,
    kind: EntityKind,
    codes: Vec<String>,
  ) -> impl Future<Output = Result<Vec<ReferenceRecord>, Self::Error>> + Send + '_;

  /// Insert or replace a reference record by code.
  fn put_reference(
    &self,
    record: ReferenceRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove a reference record. Assignments pointing at it are left alone.
  /// Returns `false` if no such record existed.
  fn delete_reference(
    &self,
    kind: EntityKind,
    code: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Assignment store: reads ───────────────────────────────────────────

  /// Assignments matching `filter`, ordered by period, jornada, time slot.
  fn list_assignments<'a>(
    &'a self,
    filter: &'a AssignmentFilter,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + 'a;

  fn find_assignment(
    &self,
    code: String,
  ) -> impl Future<Output = Result<Option<Assignment>, Self::Error>> + Send + '_;

  /// Members of a matrix, ordered by time slot.
  fn find_matrix(
    &self,
    matrix_id: String,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  /// Stamp `key` onto the rows it addresses that have no matrix id, then
  /// return every row carrying `key`, ordered by time slot.
  fn resolve_legacy(
    &self,
    key: LegacyKey,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  // ── Assignment store: writes ──────────────────────────────────────────

  /// Write a batch atomically.
  ///
  /// Inside one transaction: run [`crate::conflict::detect`] against persisted
  /// rows, delete the members of `replaces` (if any), insert every entry.
  /// A collision is reported as a domain [`crate::Error::Conflict`] carried by
  /// `Self::Error`; on any failure nothing is written.
  fn commit_batch(
    &self,
    commit: BatchCommit,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  /// Delete every member of a matrix. Returns the number of rows removed.
  fn delete_matrix(
    &self,
    matrix_id: String,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Returns `false` if no assignment has this code.
  fn delete_assignment(
    &self,
    code: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
