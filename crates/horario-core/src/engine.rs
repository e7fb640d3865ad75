//! [`Scheduler`]: the assignment-matrix orchestrator.
//!
//! Composes normalisation, the cross-reference rules and the store's
//! transactional commit into the six exposed operations. Nothing is written
//! until every check has passed; the store's commit runs the conflict check
//! and the writes inside one transaction.

use std::{fmt, sync::Arc};

use futures::try_join;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  Error, StoreError,
  assignment::{AssignmentFilter, AssignmentInput, Candidate, NewAssignment},
  codegen::CodeGenerator,
  matrix::{LegacyKey, group_by_matrix},
  normalize::{MatrixTarget, normalize_batch},
  reference::{EntityKind, ReferenceSet},
  rules::{ReferencedCodes, check_references},
  store::{BatchCommit, ScheduleStore},
  view::{AssignmentView, MatrixView},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Failure of a [`Scheduler`] operation: either a domain error, or a storage
/// failure the domain cannot interpret.
#[derive(Debug, Error)]
pub enum EngineError<E> {
  #[error(transparent)]
  Schedule(#[from] Error),

  #[error("store error: {0}")]
  Store(#[source] E),
}

impl<E: StoreError> EngineError<E> {
  /// Lift a backend error, recovering any domain error it carries.
  pub fn from_store(err: E) -> Self {
    match err.into_schedule() {
      Ok(domain) => Self::Schedule(domain),
      Err(other) => Self::Store(other),
    }
  }
}

type EngineResult<T, S> = Result<T, EngineError<<S as ScheduleStore>::Error>>;

fn log_rejection<E: fmt::Display>(err: &EngineError<E>) {
  warn!(error = %err, "assignment batch rejected");
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// Result of [`Scheduler::list_assignments`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Listing {
  Flat(Vec<AssignmentView>),
  Grouped(Vec<MatrixView>),
}

// ─── Scheduler ───────────────────────────────────────────────────────────────

/// The matrix orchestrator. Clones share the store and the code generator.
pub struct Scheduler<S> {
  store: Arc<S>,
  codes: Arc<CodeGenerator>,
}

impl<S> Clone for Scheduler<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      codes: Arc::clone(&self.codes),
    }
  }
}

impl<S: ScheduleStore> Scheduler<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, codes: Arc::new(CodeGenerator::new()) }
  }

  pub fn store(&self) -> &S { &self.store }

  /// Assignments matching `filter`, flat or partitioned into matrices.
  pub async fn list_assignments(
    &self,
    filter: &AssignmentFilter,
    grouped: bool,
  ) -> EngineResult<Listing, S> {
    let rows = self
      .store
      .list_assignments(filter)
      .await
      .map_err(EngineError::from_store)?;

    let views: Vec<AssignmentView> = rows.into_iter().map(AssignmentView::from).collect();
    Ok(if grouped {
      Listing::Grouped(group_by_matrix(views))
    } else {
      Listing::Flat(views)
    })
  }

  /// Validate and insert a batch as a new matrix. Returns the inserted
  /// entries in submission order.
  pub async fn create_assignments(
    &self,
    batch: Vec<AssignmentInput>,
    actor: &str,
  ) -> EngineResult<Vec<AssignmentView>, S> {
    let entries = self
      .prepare(batch, &MatrixTarget::Create, actor)
      .await
      .inspect_err(log_rejection)?;
    let matrix_id = entries[0].matrix_id.clone();

    let inserted = self
      .store
      .commit_batch(BatchCommit { entries, replaces: None })
      .await
      .map_err(EngineError::from_store)
      .inspect_err(log_rejection)?;

    info!(%matrix_id, count = inserted.len(), "assignment matrix created");
    Ok(inserted.into_iter().map(AssignmentView::from).collect())
  }

  /// Fetch a matrix, resolving legacy keys. `NotFound` if it has no members.
  pub async fn get_matrix(&self, matrix_id: &str) -> EngineResult<MatrixView, S> {
    self.find_matrix(matrix_id).await?.ok_or_else(|| {
      EngineError::Schedule(Error::NotFound(format!(
        "Assignment matrix {matrix_id} not found"
      )))
    })
  }

  /// Like [`Self::get_matrix`], but `None` when the matrix does not exist.
  ///
  /// A legacy key that matches nothing by id is resolved against
  /// `(period, jornada, section)`, stamping the key onto the matching rows.
  pub async fn find_matrix(&self, matrix_id: &str) -> EngineResult<Option<MatrixView>, S> {
    let mut rows = self
      .store
      .find_matrix(matrix_id.to_owned())
      .await
      .map_err(EngineError::from_store)?;

    if rows.is_empty()
      && let Some(key) = LegacyKey::parse(matrix_id)
    {
      rows = self
        .store
        .resolve_legacy(key)
        .await
        .map_err(EngineError::from_store)?;
      if !rows.is_empty() {
        info!(matrix_id, count = rows.len(), "legacy assignments resolved");
      }
    }

    let entries = rows.into_iter().map(AssignmentView::from).collect();
    Ok(MatrixView::from_entries(matrix_id.to_owned(), entries))
  }

  /// Replace every member of `matrix_id` with `batch`, atomically.
  ///
  /// Entries receive `matrix_id` whatever they carried. The matrix's current
  /// members do not count as conflicts. On any failure the matrix is left
  /// exactly as it was.
  pub async fn replace_matrix(
    &self,
    matrix_id: &str,
    batch: Vec<AssignmentInput>,
    actor: &str,
  ) -> EngineResult<MatrixView, S> {
    let target = MatrixTarget::Replace(matrix_id.to_owned());
    let entries = self
      .prepare(batch, &target, actor)
      .await
      .inspect_err(log_rejection)?;

    let written = self
      .store
      .commit_batch(BatchCommit { entries, replaces: Some(matrix_id.to_owned()) })
      .await
      .map_err(EngineError::from_store)
      .inspect_err(log_rejection)?;

    info!(matrix_id, count = written.len(), "assignment matrix replaced");
    self.get_matrix(matrix_id).await
  }

  pub async fn delete_matrix(&self, matrix_id: &str) -> EngineResult<(), S> {
    let removed = self
      .store
      .delete_matrix(matrix_id.to_owned())
      .await
      .map_err(EngineError::from_store)?;
    if removed == 0 {
      return Err(Error::NotFound(format!("Assignment matrix {matrix_id} not found")).into());
    }
    info!(matrix_id, removed, "assignment matrix deleted");
    Ok(())
  }

  pub async fn find_assignment(&self, code: &str) -> EngineResult<Option<AssignmentView>, S> {
    let row = self
      .store
      .find_assignment(code.to_owned())
      .await
      .map_err(EngineError::from_store)?;
    Ok(row.map(AssignmentView::from))
  }

  pub async fn delete_assignment(&self, code: &str) -> EngineResult<(), S> {
    let removed = self
      .store
      .delete_assignment(code.to_owned())
      .await
      .map_err(EngineError::from_store)?;
    if !removed {
      return Err(Error::NotFound(format!("Assignment {code} not found")).into());
    }
    info!(code, "assignment deleted");
    Ok(())
  }

  // ── Pipeline ──────────────────────────────────────────────────────────

  /// Normalise, check references and assign codes. Touches no persisted
  /// assignment.
  async fn prepare(
    &self,
    batch: Vec<AssignmentInput>,
    target: &MatrixTarget,
    actor: &str,
  ) -> EngineResult<Vec<NewAssignment>, S> {
    let mut candidates = normalize_batch(batch, target)?;
    let refs = self.load_references(&candidates).await?;
    check_references(&mut candidates, &refs)?;
    debug!(entries = candidates.len(), "assignment batch validated");

    Ok(self.codes.assign(candidates, actor))
  }

  /// One bulk lookup per entity kind, issued concurrently.
  async fn load_references(&self, batch: &[Candidate]) -> EngineResult<ReferenceSet, S> {
    let codes = ReferencedCodes::collect(batch);
    let fetch =
      |kind: EntityKind| self.store.find_many_by_codes(kind, codes.for_kind(kind).to_vec());

    let (subjects, teachers, classrooms, time_slots, sections, jornadas) = try_join!(
      fetch(EntityKind::Subject),
      fetch(EntityKind::Teacher),
      fetch(EntityKind::Classroom),
      fetch(EntityKind::TimeSlot),
      fetch(EntityKind::Section),
      fetch(EntityKind::Jornada),
    )
    .map_err(EngineError::from_store)?;

    Ok(
      [subjects, teachers, classrooms, time_slots, sections, jornadas]
        .into_iter()
        .flatten()
        .collect(),
    )
  }
}
