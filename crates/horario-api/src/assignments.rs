//! Handlers for `/assignments` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/assignments` | `?jornadaId&period&teacherId&sectionId&grouped=true` |
//! | `POST`   | `/assignments` | Body: `[...]` or `{"assignments":[...]}`; 201 |
//! | `GET`    | `/assignments/matrix/{id}` | 404 if the matrix has no members |
//! | `PUT`    | `/assignments/matrix/{id}` | Replaces every member atomically |
//! | `DELETE` | `/assignments/matrix/{id}` | 204 |
//! | `DELETE` | `/assignments/{id}` | Single assignment; 204 |

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use horario_core::{
  Error, Listing, Scheduler,
  assignment::{AssignmentFilter, AssignmentInput},
  matrix::LegacyKey,
  store::ScheduleStore,
  view::{AssignmentView, MatrixView},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::ApiError, scope::Caller};

// ─── Payload ─────────────────────────────────────────────────────────────────

const BATCH_REQUIRED: &str = "assignments array is required";

/// Accept a bare array or an object wrapping it under `assignments`.
fn parse_batch(body: Value) -> Result<Vec<AssignmentInput>, Error> {
  let items = match body {
    Value::Array(items) => items,
    Value::Object(mut map) => match map.remove("assignments") {
      Some(Value::Array(items)) => items,
      _ => return Err(Error::invalid(BATCH_REQUIRED)),
    },
    _ => return Err(Error::invalid(BATCH_REQUIRED)),
  };
  if items.is_empty() {
    return Err(Error::invalid(BATCH_REQUIRED));
  }

  items
    .into_iter()
    .enumerate()
    .map(|(index, item)| {
      serde_json::from_value(item)
        .map_err(|e| Error::invalid(format!("entry {} is malformed: {e}", index + 1)))
    })
    .collect()
}

/// Every entry must name a jornada the caller manages.
fn authorize_batch(caller: &Caller, batch: &[AssignmentInput]) -> Result<(), Error> {
  if !caller.is_scoped() {
    return Ok(());
  }
  batch
    .iter()
    .try_for_each(|entry| caller.authorize(entry.jornada().unwrap_or_default()))
}

/// A legacy key names its jornada. Resolving the key stamps rows, so the
/// caller's scope is checked against it first.
fn authorize_key(caller: &Caller, matrix_id: &str) -> Result<(), Error> {
  match LegacyKey::parse(matrix_id) {
    Some(key) => caller.authorize(&key.jornada_code),
    None => Ok(()),
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub jornada_id: Option<String>,
  pub period:     Option<String>,
  pub teacher_id: Option<String>,
  pub section_id: Option<String>,
  pub grouped:    Option<String>,
}

/// `GET /assignments`
pub async fn list<S>(
  State(scheduler): State<Scheduler<S>>,
  Extension(caller): Extension<Caller>,
  Query(params): Query<ListParams>,
) -> Result<Json<Listing>, ApiError>
where
  S: ScheduleStore + 'static,
{
  let grouped = params.grouped.as_deref() == Some("true");
  let filter = caller.restrict(AssignmentFilter {
    jornada:     non_empty(params.jornada_id),
    period:      non_empty(params.period),
    teacher:     non_empty(params.teacher_id),
    section:     non_empty(params.section_id),
    jornadas_in: None,
  })?;

  Ok(Json(scheduler.list_assignments(&filter, grouped).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /assignments`
pub async fn create<S>(
  State(scheduler): State<Scheduler<S>>,
  Extension(caller): Extension<Caller>,
  Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScheduleStore + 'static,
{
  let batch = parse_batch(body)?;
  authorize_batch(&caller, &batch)?;

  let created: Vec<AssignmentView> =
    scheduler.create_assignments(batch, &caller.username).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Matrix ──────────────────────────────────────────────────────────────────

/// `GET /assignments/matrix/{id}`
pub async fn get_matrix<S>(
  State(scheduler): State<Scheduler<S>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<String>,
) -> Result<Json<MatrixView>, ApiError>
where
  S: ScheduleStore + 'static,
{
  authorize_key(&caller, &id)?;
  let matrix = scheduler.get_matrix(&id).await?;
  caller.authorize(&matrix.jornada_id)?;
  Ok(Json(matrix))
}

/// `PUT /assignments/matrix/{id}`
///
/// A coordinator may only replace a matrix it can already see, and only with
/// entries in its own jornadas.
pub async fn replace_matrix<S>(
  State(scheduler): State<Scheduler<S>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<String>,
  Json(body): Json<Value>,
) -> Result<Json<MatrixView>, ApiError>
where
  S: ScheduleStore + 'static,
{
  let batch = parse_batch(body)?;
  authorize_key(&caller, &id)?;
  if caller.is_scoped()
    && let Some(current) = scheduler.find_matrix(&id).await?
  {
    caller.authorize(&current.jornada_id)?;
  }
  authorize_batch(&caller, &batch)?;

  let matrix = scheduler.replace_matrix(&id, batch, &caller.username).await?;
  Ok(Json(matrix))
}

/// `DELETE /assignments/matrix/{id}`
pub async fn delete_matrix<S>(
  State(scheduler): State<Scheduler<S>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: ScheduleStore + 'static,
{
  authorize_key(&caller, &id)?;
  if caller.is_scoped() {
    let current = scheduler.get_matrix(&id).await?;
    caller.authorize(&current.jornada_id)?;
  }
  scheduler.delete_matrix(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Single assignment ───────────────────────────────────────────────────────

/// `DELETE /assignments/{id}`
pub async fn delete_one<S>(
  State(scheduler): State<Scheduler<S>>,
  Extension(caller): Extension<Caller>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: ScheduleStore + 'static,
{
  if caller.is_scoped() {
    let current = scheduler
      .find_assignment(&id)
      .await?
      .ok_or_else(|| Error::NotFound(format!("Assignment {id} not found")))?;
    caller.authorize(&current.jornada_id)?;
  }
  scheduler.delete_assignment(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn batch_accepts_array_or_wrapper() {
    let bare = parse_batch(json!([{ "subjectId": "SUB1" }])).unwrap();
    assert_eq!(bare[0].subject_id.as_deref(), Some("SUB1"));

    let wrapped = parse_batch(json!({ "assignments": [{ "teacherCode": "T1" }] })).unwrap();
    assert_eq!(wrapped[0].teacher_code.as_deref(), Some("T1"));
    assert_eq!(wrapped[0].jornada(), None);
  }

  #[test]
  fn batch_rejects_other_shapes() {
    for body in [json!([]), json!({}), json!({ "assignments": {} }), json!("x")] {
      assert_eq!(parse_batch(body), Err(Error::invalid(BATCH_REQUIRED)));
    }
  }

  #[test]
  fn batch_reports_malformed_entry() {
    let err = parse_batch(json!([{}, { "period": 2024 }])).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(ref m) if m.starts_with("entry 2 is malformed")));
  }

  #[test]
  fn legacy_key_scope_comes_from_its_jornada() {
    let caller = Caller::coordinator("maria", vec!["J1".into()]);
    assert!(authorize_key(&caller, "legacy|2025-1|J1|S1").is_ok());
    assert!(matches!(
      authorize_key(&caller, "legacy|2025-1|J2|S3"),
      Err(Error::Forbidden(_))
    ));
    assert!(authorize_key(&caller, "ASGM-abc").is_ok());
    assert!(authorize_key(&Caller::admin("root"), "legacy|2025-1|J2|S3").is_ok());
  }

  #[test]
  fn coordinator_batch_needs_every_jornada_in_scope() {
    let caller = Caller::coordinator("maria", vec!["J1".into()]);
    let ok = parse_batch(json!([{ "jornadaId": "J1" }])).unwrap();
    assert!(authorize_batch(&caller, &ok).is_ok());

    let mixed = parse_batch(json!([{ "jornadaId": "J1" }, { "jornadaId": "J2" }])).unwrap();
    assert!(matches!(authorize_batch(&caller, &mixed), Err(Error::Forbidden(_))));

    let missing = parse_batch(json!([{ "period": "2024-1" }])).unwrap();
    assert!(authorize_batch(&caller, &missing).is_err());
    assert!(authorize_batch(&Caller::admin("root"), &missing).is_ok());
  }
}
