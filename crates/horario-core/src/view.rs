//! Client-facing shapes.
//!
//! Internally every reference is a `*_code`; callers see the public `*Id`
//! names. Views are computed on read and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assignment::Assignment;

/// One assignment as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
  pub id:           String,
  pub subject_id:   String,
  pub teacher_id:   String,
  pub classroom_id: String,
  pub time_slot_id: String,
  pub jornada_id:   String,
  pub section_id:   String,
  pub period:       String,
  /// Always present: rows without a stored id get their legacy key.
  pub matrix_id:    String,
  pub semester:     Option<u8>,
  pub notes:        String,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl From<Assignment> for AssignmentView {
  fn from(a: Assignment) -> Self {
    let matrix_id = a.effective_matrix_id();
    Self {
      id: a.code,
      subject_id: a.subject_code,
      teacher_id: a.teacher_code,
      classroom_id: a.classroom_code,
      time_slot_id: a.time_slot_code,
      jornada_id: a.jornada_code,
      section_id: a.section_code,
      period: a.period,
      matrix_id,
      semester: a.semester,
      notes: a.notes,
      created_at: a.created_at,
      updated_at: a.updated_at,
    }
  }
}

/// The derived aggregate of all assignments sharing one matrix id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixView {
  pub matrix_id:  String,
  pub period:     String,
  pub jornada_id: String,
  pub section_id: String,
  pub semester:   Option<u8>,
  /// Ordered by time-slot code.
  pub entries:    Vec<AssignmentView>,
  /// Earliest member `created_at`.
  pub created_at: DateTime<Utc>,
  /// Latest member `updated_at`.
  pub updated_at: DateTime<Utc>,
}

impl MatrixView {
  /// Build the aggregate from its members. Returns `None` for an empty set,
  /// since a matrix without members does not exist.
  ///
  /// Header fields come from the first entry in time-slot order.
  pub fn from_entries(
    matrix_id: String,
    mut entries: Vec<AssignmentView>,
  ) -> Option<Self> {
    entries.sort_by(|a, b| a.time_slot_id.cmp(&b.time_slot_id));

    let first = entries.first()?;
    let created_at = entries.iter().map(|e| e.created_at).min()?;
    let updated_at = entries.iter().map(|e| e.updated_at).max()?;

    Some(Self {
      matrix_id,
      period: first.period.clone(),
      jornada_id: first.jornada_id.clone(),
      section_id: first.section_id.clone(),
      semester: first.semester,
      entries,
      created_at,
      updated_at,
    })
  }
}
