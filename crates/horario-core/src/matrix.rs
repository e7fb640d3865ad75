//! Matrix addressing and grouping.
//!
//! A matrix has no storage of its own: it is the set of assignments sharing a
//! matrix id. Rows written before matrix ids existed are addressed through a
//! [`LegacyKey`] derived from `(period, jornada, section)`.

use std::{collections::BTreeMap, fmt};

use crate::view::{AssignmentView, MatrixView};

const LEGACY_PREFIX: &str = "legacy|";

// ─── Legacy key ──────────────────────────────────────────────────────────────

/// `legacy|{period}|{jornadaCode}|{sectionCode}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LegacyKey {
  pub period:       String,
  pub jornada_code: String,
  pub section_code: String,
}

impl LegacyKey {
  /// Decode a matrix id. Anything not shaped exactly like a legacy key
  /// yields `None`.
  pub fn parse(matrix_id: &str) -> Option<Self> {
    let rest = matrix_id.strip_prefix(LEGACY_PREFIX)?;
    let mut parts = rest.split('|');
    let key = Self {
      period:       parts.next()?.to_owned(),
      jornada_code: parts.next()?.to_owned(),
      section_code: parts.next()?.to_owned(),
    };
    if parts.next().is_some() {
      return None;
    }
    Some(key)
  }
}

impl fmt::Display for LegacyKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{LEGACY_PREFIX}{}|{}|{}",
      self.period, self.jornada_code, self.section_code
    )
  }
}

// ─── Grouping ────────────────────────────────────────────────────────────────

/// Partition a flat listing into matrix aggregates.
///
/// Each aggregate's entries are ordered by time-slot code; aggregates are
/// ordered by `(period, jornada)`, ties keeping matrix-id order.
pub fn group_by_matrix(entries: Vec<AssignmentView>) -> Vec<MatrixView> {
  let mut buckets: BTreeMap<String, Vec<AssignmentView>> = BTreeMap::new();
  for entry in entries {
    buckets.entry(entry.matrix_id.clone()).or_default().push(entry);
  }

  let mut matrices: Vec<MatrixView> = buckets
    .into_iter()
    .filter_map(|(id, members)| MatrixView::from_entries(id, members))
    .collect();

  matrices.sort_by(|a, b| {
    a.period
      .cmp(&b.period)
      .then_with(|| a.jornada_id.cmp(&b.jornada_id))
  });
  matrices
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;

  fn entry(code: &str, matrix: &str, period: &str, jornada: &str, slot: &str) -> AssignmentView {
    let now = Utc::now();
    AssignmentView {
      id:           code.into(),
      subject_id:   "SUB".into(),
      teacher_id:   format!("T-{code}"),
      classroom_id: format!("C-{code}"),
      time_slot_id: slot.into(),
      jornada_id:   jornada.into(),
      section_id:   "S1".into(),
      period:       period.into(),
      matrix_id:    matrix.into(),
      semester:     Some(1),
      notes:        String::new(),
      created_at:   now,
      updated_at:   now,
    }
  }

  #[test]
  fn legacy_key_roundtrips_through_display() {
    let key = LegacyKey::parse("legacy|2024-1|J1|S1").unwrap();
    assert_eq!(key.period, "2024-1");
    assert_eq!(key.jornada_code, "J1");
    assert_eq!(key.section_code, "S1");
    assert_eq!(key.to_string(), "legacy|2024-1|J1|S1");
  }

  #[test]
  fn legacy_key_rejects_other_shapes() {
    assert!(LegacyKey::parse("ASGM-123").is_none());
    assert!(LegacyKey::parse("legacy|2024-1|J1").is_none());
    assert!(LegacyKey::parse("legacy|2024-1|J1|S1|extra").is_none());
    assert!(LegacyKey::parse("LEGACY|2024-1|J1|S1").is_none());
  }

  #[test]
  fn grouping_orders_entries_and_matrices() {
    let flat = vec![
      entry("a", "M2", "2024-2", "J1", "M3"),
      entry("b", "M1", "2024-1", "J2", "M2"),
      entry("c", "M1", "2024-1", "J2", "M1"),
      entry("d", "M3", "2024-1", "J1", "M1"),
    ];

    let grouped = group_by_matrix(flat);
    let ids: Vec<_> = grouped.iter().map(|m| m.matrix_id.as_str()).collect();
    assert_eq!(ids, ["M3", "M1", "M2"]);

    let m1 = &grouped[1];
    let slots: Vec<_> = m1.entries.iter().map(|e| e.time_slot_id.as_str()).collect();
    assert_eq!(slots, ["M1", "M2"]);
  }

  #[test]
  fn aggregate_spans_member_timestamps() {
    let mut early = entry("a", "M1", "2024-1", "J1", "M2");
    let mut late = entry("b", "M1", "2024-1", "J1", "M1");
    early.created_at -= Duration::hours(2);
    late.updated_at += Duration::hours(3);

    let view = MatrixView::from_entries("M1".into(), vec![early.clone(), late.clone()]).unwrap();
    assert_eq!(view.created_at, early.created_at);
    assert_eq!(view.updated_at, late.updated_at);
    assert_eq!(view.entries[0].id, "b");
  }

  #[test]
  fn empty_aggregate_does_not_exist() {
    assert!(MatrixView::from_entries("M1".into(), vec![]).is_none());
  }
}
