//! Assignment: one scheduled occurrence of a subject.
//!
//! An assignment places a subject, taught by a teacher, in a classroom, at a
//! time slot, for a section, within a period. All foreign references are
//! codes, never internal identifiers. Assignments sharing a `matrix_id` form
//! one matrix (see [`crate::view::MatrixView`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matrix::LegacyKey;

// ─── Persisted record ────────────────────────────────────────────────────────

/// An assignment as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
  pub code:           String,
  pub subject_code:   String,
  pub teacher_code:   String,
  pub classroom_code: String,
  pub time_slot_code: String,
  pub jornada_code:   String,
  pub section_code:   String,
  pub period:         String,
  /// `None` only for rows written before matrix ids existed.
  pub matrix_id:      Option<String>,
  pub semester:       Option<u8>,
  pub notes:          String,
  pub created_by:     String,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl Assignment {
  /// The synthetic key addressing this row when it predates matrix ids.
  pub fn legacy_key(&self) -> LegacyKey {
    LegacyKey {
      period:       self.period.clone(),
      jornada_code: self.jornada_code.clone(),
      section_code: self.section_code.clone(),
    }
  }

  /// The stored matrix id, or the legacy key synthesised on the fly.
  pub fn effective_matrix_id(&self) -> String {
    match &self.matrix_id {
      Some(id) if !id.is_empty() => id.clone(),
      _ => self.legacy_key().to_string(),
    }
  }
}

// ─── Client input ────────────────────────────────────────────────────────────

/// A semester as clients send it: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SemesterInput {
  Number(f64),
  Text(String),
}

/// One entry of a submitted batch, exactly as the client sent it.
///
/// Every field is optional here; [`crate::normalize`] decides what is
/// required. Both the public (`subjectId`) and the internal (`subjectCode`)
/// spellings are accepted, and may appear together: the public one wins.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
  pub id:             Option<String>,
  pub code:           Option<String>,
  pub subject_id:     Option<String>,
  pub subject_code:   Option<String>,
  pub teacher_id:     Option<String>,
  pub teacher_code:   Option<String>,
  pub classroom_id:   Option<String>,
  pub classroom_code: Option<String>,
  pub time_slot_id:   Option<String>,
  pub time_slot_code: Option<String>,
  pub jornada_id:     Option<String>,
  pub jornada_code:   Option<String>,
  pub section_id:     Option<String>,
  pub section_code:   Option<String>,
  pub period:         Option<String>,
  pub matrix_id:      Option<String>,
  pub group_id:       Option<String>,
  pub semester:       Option<SemesterInput>,
  pub notes:          Option<String>,
}

impl AssignmentInput {
  /// The jornada this entry names, under either spelling.
  pub fn jornada(&self) -> Option<&str> {
    self.jornada_id.as_deref().or(self.jornada_code.as_deref())
  }
}

// ─── Normalised forms ────────────────────────────────────────────────────────

/// A trimmed, typed entry. Produced by [`crate::normalize::normalize_batch`];
/// `code` is still optional until [`crate::codegen::CodeGenerator`] runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
  pub code:           Option<String>,
  pub subject_code:   String,
  pub teacher_code:   String,
  pub classroom_code: String,
  pub time_slot_code: String,
  pub jornada_code:   String,
  pub section_code:   String,
  pub period:         String,
  pub matrix_id:      String,
  pub semester:       Option<u8>,
  pub notes:          String,
}

/// Input to [`crate::store::ScheduleStore::commit_batch`]: a fully validated
/// entry with its final code. Timestamps are always set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
  pub code:           String,
  pub subject_code:   String,
  pub teacher_code:   String,
  pub classroom_code: String,
  pub time_slot_code: String,
  pub jornada_code:   String,
  pub section_code:   String,
  pub period:         String,
  pub matrix_id:      String,
  pub semester:       Option<u8>,
  pub notes:          String,
  pub created_by:     String,
}

impl NewAssignment {
  pub fn from_candidate(candidate: Candidate, code: String, created_by: &str) -> Self {
    Self {
      code,
      subject_code: candidate.subject_code,
      teacher_code: candidate.teacher_code,
      classroom_code: candidate.classroom_code,
      time_slot_code: candidate.time_slot_code,
      jornada_code: candidate.jornada_code,
      section_code: candidate.section_code,
      period: candidate.period,
      matrix_id: candidate.matrix_id,
      semester: candidate.semester,
      notes: candidate.notes,
      created_by: created_by.to_owned(),
    }
  }

  /// The record as persisted at `at`.
  pub fn into_assignment(self, at: DateTime<Utc>) -> Assignment {
    Assignment {
      code:           self.code,
      subject_code:   self.subject_code,
      teacher_code:   self.teacher_code,
      classroom_code: self.classroom_code,
      time_slot_code: self.time_slot_code,
      jornada_code:   self.jornada_code,
      section_code:   self.section_code,
      period:         self.period,
      matrix_id:      Some(self.matrix_id),
      semester:       self.semester,
      notes:          self.notes,
      created_by:     self.created_by,
      created_at:     at,
      updated_at:     at,
    }
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::ScheduleStore::list_assignments`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentFilter {
  pub jornada:     Option<String>,
  pub period:      Option<String>,
  pub teacher:     Option<String>,
  pub section:     Option<String>,
  /// Caller scope: when set, only these jornadas are visible.
  pub jornadas_in: Option<Vec<String>>,
}
