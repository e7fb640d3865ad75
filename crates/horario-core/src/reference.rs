//! Reference records: the entities an assignment points at by code.
//!
//! The engine only reads these (apart from seeding through
//! [`crate::store::ScheduleStore::put_reference`]). Each record exposes just
//! the fields the cross-reference rules need.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Activity flag shared by teachers, sections and jornadas.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
  #[default]
  Active,
  Inactive,
}

/// The six entity types an assignment references.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  Subject,
  Teacher,
  Classroom,
  TimeSlot,
  Section,
  Jornada,
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
  pub code:        String,
  pub name:        String,
  pub career_code: String,
  pub semester:    Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherRecord {
  pub code:          String,
  pub first_name:    String,
  pub last_name:     String,
  pub status:        Status,
  pub career_code:   String,
  /// Subjects this teacher is authorised to teach.
  pub subject_codes: Vec<String>,
}

impl TeacherRecord {
  pub fn teaches(&self, subject_code: &str) -> bool {
    self.subject_codes.iter().any(|c| c == subject_code)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomRecord {
  pub code:          String,
  pub name:          String,
  pub building_code: String,
  pub capacity:      u32,
  pub is_enabled:    bool,
}

/// A `(day, start, end)` interval owned by exactly one jornada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotRecord {
  pub code:         String,
  pub day:          String,
  pub start:        String,
  pub end:          String,
  pub jornada_code: String,
}

/// A cohort of students within a jornada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
  pub code:         String,
  pub name:         String,
  pub status:       Status,
  pub jornada_code: String,
  pub capacity:     u32,
  pub semester:     Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JornadaRecord {
  pub code:        String,
  pub name:        String,
  pub status:      Status,
  pub career_code: String,
}

/// Any one reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceRecord {
  Subject(SubjectRecord),
  Teacher(TeacherRecord),
  Classroom(ClassroomRecord),
  TimeSlot(TimeSlotRecord),
  Section(SectionRecord),
  Jornada(JornadaRecord),
}

impl ReferenceRecord {
  pub fn kind(&self) -> EntityKind {
    match self {
      Self::Subject(_) => EntityKind::Subject,
      Self::Teacher(_) => EntityKind::Teacher,
      Self::Classroom(_) => EntityKind::Classroom,
      Self::TimeSlot(_) => EntityKind::TimeSlot,
      Self::Section(_) => EntityKind::Section,
      Self::Jornada(_) => EntityKind::Jornada,
    }
  }

  pub fn code(&self) -> &str {
    match self {
      Self::Subject(r) => &r.code,
      Self::Teacher(r) => &r.code,
      Self::Classroom(r) => &r.code,
      Self::TimeSlot(r) => &r.code,
      Self::Section(r) => &r.code,
      Self::Jornada(r) => &r.code,
    }
  }
}

// ─── Lookup set ──────────────────────────────────────────────────────────────

/// Code-keyed maps built from one bulk lookup per entity kind.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
  pub subjects:   HashMap<String, SubjectRecord>,
  pub teachers:   HashMap<String, TeacherRecord>,
  pub classrooms: HashMap<String, ClassroomRecord>,
  pub time_slots: HashMap<String, TimeSlotRecord>,
  pub sections:   HashMap<String, SectionRecord>,
  pub jornadas:   HashMap<String, JornadaRecord>,
}

impl ReferenceSet {
  pub fn insert(&mut self, record: ReferenceRecord) {
    match record {
      ReferenceRecord::Subject(r) => {
        self.subjects.insert(r.code.clone(), r);
      }
      ReferenceRecord::Teacher(r) => {
        self.teachers.insert(r.code.clone(), r);
      }
      ReferenceRecord::Classroom(r) => {
        self.classrooms.insert(r.code.clone(), r);
      }
      ReferenceRecord::TimeSlot(r) => {
        self.time_slots.insert(r.code.clone(), r);
      }
      ReferenceRecord::Section(r) => {
        self.sections.insert(r.code.clone(), r);
      }
      ReferenceRecord::Jornada(r) => {
        self.jornadas.insert(r.code.clone(), r);
      }
    }
  }
}

impl FromIterator<ReferenceRecord> for ReferenceSet {
  fn from_iter<I: IntoIterator<Item = ReferenceRecord>>(iter: I) -> Self {
    let mut set = Self::default();
    for record in iter {
      set.insert(record);
    }
    set
  }
}
