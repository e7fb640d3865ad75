//! Scheduling-collision detection against persisted assignments.
//!
//! The detector is storage-agnostic: a backend supplies a lookup that finds an
//! existing assignment occupying the same `(period, time slot)` with the same
//! teacher, classroom or section (excluding the matrix being replaced). The
//! lookup runs inside the backend's transaction, once per entry, in order.

use crate::{Error, assignment::NewAssignment};

/// The parts of a persisted assignment that can collide with an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
  pub code:           String,
  pub teacher_code:   String,
  pub classroom_code: String,
  pub section_code:   String,
}

/// The resource two assignments both claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Dimension {
  Teacher,
  Classroom,
  Section,
}

/// Which resource `occupant` shares with `entry`, checked in teacher,
/// classroom, section order.
pub fn dimension(entry: &NewAssignment, occupant: &Occupant) -> Option<Dimension> {
  if occupant.teacher_code == entry.teacher_code {
    Some(Dimension::Teacher)
  } else if occupant.classroom_code == entry.classroom_code {
    Some(Dimension::Classroom)
  } else if occupant.section_code == entry.section_code {
    Some(Dimension::Section)
  } else {
    None
  }
}

/// Describe the collision between `entry` and `occupant`.
pub fn classify(entry: &NewAssignment, occupant: &Occupant) -> Error {
  let (slot, period) = (&entry.time_slot_code, &entry.period);
  let message = match dimension(entry, occupant) {
    Some(Dimension::Teacher) => format!(
      "Teacher {} already has an assignment in time slot {slot} for period {period}",
      entry.teacher_code
    ),
    Some(Dimension::Classroom) => format!(
      "Classroom {} is already assigned in time slot {slot} for period {period}",
      entry.classroom_code
    ),
    Some(Dimension::Section) => format!(
      "Section {} already has an assignment in time slot {slot} for period {period}",
      entry.section_code
    ),
    None => "Assignment conflict detected".to_owned(),
  };
  Error::Conflict(message)
}

/// Look up every entry in order; the first collision found is returned as a
/// [`Error::Conflict`]. `Ok(None)` means the batch is clear.
///
/// Lookup failures (storage errors) short-circuit as `Err`.
pub fn detect<F, E>(batch: &[NewAssignment], mut lookup: F) -> Result<Option<Error>, E>
where
  F: FnMut(&NewAssignment) -> Result<Option<Occupant>, E>,
{
  for entry in batch {
    if let Some(occupant) = lookup(entry)? {
      return Ok(Some(classify(entry, &occupant)));
    }
  }
  Ok(None)
}
