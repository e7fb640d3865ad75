//! Batch normalisation and in-batch consistency checks.
//!
//! This is the storage-free half of validation: raw client entries become
//! trimmed [`Candidate`]s, every entry receives the batch's matrix id, and
//! the batch is rejected as a whole if any entry is incomplete or collides
//! with another entry of the same batch.

use std::collections::HashSet;

use crate::{
  Error, Result,
  assignment::{AssignmentInput, Candidate, SemesterInput},
  codegen::fresh_matrix_id,
};

/// Which matrix a batch is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixTarget {
  /// A new matrix: the id comes from the first entry, or is generated.
  Create,
  /// An existing matrix: this id is forced onto every entry.
  Replace(String),
}

const SEMESTER_RANGE: std::ops::RangeInclusive<f64> = 1.0..=12.0;

fn trimmed(value: Option<String>) -> String {
  value.map(|v| v.trim().to_owned()).unwrap_or_default()
}

fn semester(raw: Option<SemesterInput>) -> Result<Option<u8>> {
  let value = match raw {
    None => return Ok(None),
    // Zero and blank strings mean "not provided".
    Some(SemesterInput::Number(n)) if n == 0.0 => return Ok(None),
    Some(SemesterInput::Number(n)) => n,
    Some(SemesterInput::Text(s)) if s.trim().is_empty() => return Ok(None),
    Some(SemesterInput::Text(s)) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
  };

  if value.fract() != 0.0 || !SEMESTER_RANGE.contains(&value) {
    return Err(Error::invalid(
      "semester must be a number between 1 and 12 when provided",
    ));
  }
  Ok(Some(value as u8))
}

/// Trim every field and coerce the semester. The matrix id may still be
/// empty; [`normalize_batch`] settles it.
pub fn normalize_entry(raw: AssignmentInput) -> Result<Candidate> {
  let code = trimmed(raw.id.or(raw.code));
  Ok(Candidate {
    code:           (!code.is_empty()).then_some(code),
    subject_code:   trimmed(raw.subject_id.or(raw.subject_code)),
    teacher_code:   trimmed(raw.teacher_id.or(raw.teacher_code)),
    classroom_code: trimmed(raw.classroom_id.or(raw.classroom_code)),
    time_slot_code: trimmed(raw.time_slot_id.or(raw.time_slot_code)),
    jornada_code:   trimmed(raw.jornada_id.or(raw.jornada_code)),
    section_code:   trimmed(raw.section_id.or(raw.section_code)),
    period:         trimmed(raw.period),
    matrix_id:      trimmed(raw.matrix_id.or(raw.group_id)),
    semester:       semester(raw.semester)?,
    notes:          trimmed(raw.notes),
  })
}

/// Normalise a submitted batch for `target` and run the in-batch checks.
pub fn normalize_batch(
  raw: Vec<AssignmentInput>,
  target: &MatrixTarget,
) -> Result<Vec<Candidate>> {
  if raw.is_empty() {
    return Err(Error::invalid("assignments array is required"));
  }

  let mut batch = raw
    .into_iter()
    .map(normalize_entry)
    .collect::<Result<Vec<_>>>()?;

  match target {
    MatrixTarget::Create => {
      let base = match batch[0].matrix_id.as_str() {
        "" => fresh_matrix_id(),
        id => id.to_owned(),
      };
      for candidate in &mut batch {
        if candidate.matrix_id.is_empty() {
          candidate.matrix_id = base.clone();
        } else if candidate.matrix_id != base {
          return Err(Error::invalid(format!(
            "all entries must share one matrixId (found {} and {base})",
            candidate.matrix_id
          )));
        }
      }
    }
    MatrixTarget::Replace(id) => {
      for candidate in &mut batch {
        candidate.matrix_id = id.clone();
      }
    }
  }

  check_batch(&batch)?;
  Ok(batch)
}

fn ensure_required(index: usize, c: &Candidate) -> Result<()> {
  let fields = [
    ("subjectId", &c.subject_code),
    ("teacherId", &c.teacher_code),
    ("classroomId", &c.classroom_code),
    ("timeSlotId", &c.time_slot_code),
    ("jornadaId", &c.jornada_code),
    ("sectionId", &c.section_code),
    ("period", &c.period),
    ("matrixId", &c.matrix_id),
  ];
  let missing: Vec<&str> = fields
    .iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| *name)
    .collect();

  if missing.is_empty() {
    Ok(())
  } else {
    Err(Error::invalid(format!(
      "entry {} is missing required fields: {}",
      index + 1,
      missing.join(", ")
    )))
  }
}

/// Reject a batch whose entries are incomplete or collide with each other.
///
/// All slot checks are keyed by `(period, timeSlotCode)`; code duplicates are
/// compared case-insensitively.
pub fn check_batch(batch: &[Candidate]) -> Result<()> {
  let mut teachers = HashSet::new();
  let mut classrooms = HashSet::new();
  let mut sections = HashSet::new();
  let mut subject_sections = HashSet::new();
  let mut codes = HashSet::new();

  for (index, c) in batch.iter().enumerate() {
    ensure_required(index, c)?;
    let slot = (c.period.as_str(), c.time_slot_code.as_str());

    if !teachers.insert((slot, c.teacher_code.as_str())) {
      return Err(Error::conflict(format!(
        "Duplicate teacher {} in time slot {} for period {} within the request payload",
        c.teacher_code, c.time_slot_code, c.period
      )));
    }
    if !classrooms.insert((slot, c.classroom_code.as_str())) {
      return Err(Error::conflict(format!(
        "Duplicate classroom {} in time slot {} for period {} within the request payload",
        c.classroom_code, c.time_slot_code, c.period
      )));
    }
    if !sections.insert((slot, c.section_code.as_str())) {
      return Err(Error::conflict(format!(
        "Duplicate section {} in time slot {} for period {} within the request payload",
        c.section_code, c.time_slot_code, c.period
      )));
    }
    if !subject_sections.insert((slot, c.subject_code.as_str(), c.section_code.as_str())) {
      return Err(Error::conflict(format!(
        "Duplicate subject {} for section {} in time slot {} within the request payload",
        c.subject_code, c.section_code, c.time_slot_code
      )));
    }
    if let Some(code) = &c.code
      && !codes.insert(code.to_uppercase())
    {
      return Err(Error::conflict(format!(
        "Duplicate assignment code {code} within the request payload"
      )));
    }
  }
  Ok(())
}
