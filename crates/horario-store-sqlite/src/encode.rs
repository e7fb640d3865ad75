//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Statuses are stored as
//! their lowercase names; a teacher's authorised subjects as a JSON array.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use horario_core::{
  assignment::Assignment,
  reference::{
    ClassroomRecord, EntityKind, JornadaRecord, ReferenceRecord, SectionRecord, Status,
    SubjectRecord, TeacherRecord, TimeSlotRecord,
  },
};
use rusqlite::{Row, types::Value};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<Status> {
  Status::from_str(s).map_err(|_| Error::Decode(format!("unknown status: {s:?}")))
}

pub fn decode_semester(value: Option<i64>) -> Result<Option<u8>> {
  value
    .map(|v| u8::try_from(v).map_err(|_| Error::Decode(format!("semester out of range: {v}"))))
    .transpose()
}

fn decode_capacity(value: i64) -> Result<u32> {
  u32::try_from(value).map_err(|_| Error::Decode(format!("capacity out of range: {value}")))
}

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

fn opt_int(v: Option<u8>) -> Value { v.map_or(Value::Null, |v| Value::Integer(i64::from(v))) }

// ─── Assignments ─────────────────────────────────────────────────────────────

pub const ASSIGNMENT_COLUMNS: &str = "code, subject_code, teacher_code, classroom_code, \
   time_slot_code, jornada_code, section_code, period, matrix_id, semester, notes, \
   created_by, created_at, updated_at";

/// Raw values read directly from an `assignments` row, in
/// [`ASSIGNMENT_COLUMNS`] order.
pub struct RawAssignment {
  pub code:           String,
  pub subject_code:   String,
  pub teacher_code:   String,
  pub classroom_code: String,
  pub time_slot_code: String,
  pub jornada_code:   String,
  pub section_code:   String,
  pub period:         String,
  pub matrix_id:      Option<String>,
  pub semester:       Option<i64>,
  pub notes:          String,
  pub created_by:     String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawAssignment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      code:           row.get(0)?,
      subject_code:   row.get(1)?,
      teacher_code:   row.get(2)?,
      classroom_code: row.get(3)?,
      time_slot_code: row.get(4)?,
      jornada_code:   row.get(5)?,
      section_code:   row.get(6)?,
      period:         row.get(7)?,
      matrix_id:      row.get(8)?,
      semester:       row.get(9)?,
      notes:          row.get(10)?,
      created_by:     row.get(11)?,
      created_at:     row.get(12)?,
      updated_at:     row.get(13)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      code:           self.code,
      subject_code:   self.subject_code,
      teacher_code:   self.teacher_code,
      classroom_code: self.classroom_code,
      time_slot_code: self.time_slot_code,
      jornada_code:   self.jornada_code,
      section_code:   self.section_code,
      period:         self.period,
      matrix_id:      self.matrix_id,
      semester:       decode_semester(self.semester)?,
      notes:          self.notes,
      created_by:     self.created_by,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Reference records ───────────────────────────────────────────────────────

pub fn reference_table(kind: EntityKind) -> &'static str {
  match kind {
    EntityKind::Subject => "subjects",
    EntityKind::Teacher => "teachers",
    EntityKind::Classroom => "classrooms",
    EntityKind::TimeSlot => "time_slots",
    EntityKind::Section => "sections",
    EntityKind::Jornada => "jornadas",
  }
}

/// Column list for `kind`, in the order [`RawReference::from_row`] reads.
pub fn reference_columns(kind: EntityKind) -> &'static str {
  match kind {
    EntityKind::Subject => "code, name, career_code, semester",
    EntityKind::Teacher => "code, first_name, last_name, status, career_code, subject_codes",
    EntityKind::Classroom => "code, name, building_code, capacity, is_enabled",
    EntityKind::TimeSlot => "code, day, start_time, end_time, jornada_code",
    EntityKind::Section => "code, name, status, jornada_code, capacity, semester",
    EntityKind::Jornada => "code, name, status, career_code",
  }
}

/// `INSERT OR REPLACE` statement and its parameters for `record`.
pub fn encode_reference(record: &ReferenceRecord) -> Result<(String, Vec<Value>)> {
  let kind = record.kind();
  let values = match record {
    ReferenceRecord::Subject(r) => vec![
      text(&r.code),
      text(&r.name),
      text(&r.career_code),
      opt_int(r.semester),
    ],
    ReferenceRecord::Teacher(r) => vec![
      text(&r.code),
      text(&r.first_name),
      text(&r.last_name),
      text(r.status.as_ref()),
      text(&r.career_code),
      Value::Text(serde_json::to_string(&r.subject_codes)?),
    ],
    ReferenceRecord::Classroom(r) => vec![
      text(&r.code),
      text(&r.name),
      text(&r.building_code),
      Value::Integer(i64::from(r.capacity)),
      Value::Integer(i64::from(r.is_enabled)),
    ],
    ReferenceRecord::TimeSlot(r) => vec![
      text(&r.code),
      text(&r.day),
      text(&r.start),
      text(&r.end),
      text(&r.jornada_code),
    ],
    ReferenceRecord::Section(r) => vec![
      text(&r.code),
      text(&r.name),
      text(r.status.as_ref()),
      text(&r.jornada_code),
      Value::Integer(i64::from(r.capacity)),
      opt_int(r.semester),
    ],
    ReferenceRecord::Jornada(r) => vec![
      text(&r.code),
      text(&r.name),
      text(r.status.as_ref()),
      text(&r.career_code),
    ],
  };

  let placeholders = vec!["?"; values.len()].join(", ");
  let sql = format!(
    "INSERT OR REPLACE INTO {} ({}) VALUES ({placeholders})",
    reference_table(kind),
    reference_columns(kind),
  );
  Ok((sql, values))
}

/// Raw values read from one reference table row.
pub enum RawReference {
  Subject {
    code:        String,
    name:        String,
    career_code: String,
    semester:    Option<i64>,
  },
  Teacher {
    code:          String,
    first_name:    String,
    last_name:     String,
    status:        String,
    career_code:   String,
    subject_codes: String,
  },
  Classroom {
    code:          String,
    name:          String,
    building_code: String,
    capacity:      i64,
    is_enabled:    bool,
  },
  TimeSlot {
    code:         String,
    day:          String,
    start:        String,
    end:          String,
    jornada_code: String,
  },
  Section {
    code:         String,
    name:         String,
    status:       String,
    jornada_code: String,
    capacity:     i64,
    semester:     Option<i64>,
  },
  Jornada {
    code:        String,
    name:        String,
    status:      String,
    career_code: String,
  },
}

impl RawReference {
  pub fn from_row(kind: EntityKind, row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(match kind {
      EntityKind::Subject => Self::Subject {
        code:        row.get(0)?,
        name:        row.get(1)?,
        career_code: row.get(2)?,
        semester:    row.get(3)?,
      },
      EntityKind::Teacher => Self::Teacher {
        code:          row.get(0)?,
        first_name:    row.get(1)?,
        last_name:     row.get(2)?,
        status:        row.get(3)?,
        career_code:   row.get(4)?,
        subject_codes: row.get(5)?,
      },
      EntityKind::Classroom => Self::Classroom {
        code:          row.get(0)?,
        name:          row.get(1)?,
        building_code: row.get(2)?,
        capacity:      row.get(3)?,
        is_enabled:    row.get(4)?,
      },
      EntityKind::TimeSlot => Self::TimeSlot {
        code:         row.get(0)?,
        day:          row.get(1)?,
        start:        row.get(2)?,
        end:          row.get(3)?,
        jornada_code: row.get(4)?,
      },
      EntityKind::Section => Self::Section {
        code:         row.get(0)?,
        name:         row.get(1)?,
        status:       row.get(2)?,
        jornada_code: row.get(3)?,
        capacity:     row.get(4)?,
        semester:     row.get(5)?,
      },
      EntityKind::Jornada => Self::Jornada {
        code:        row.get(0)?,
        name:        row.get(1)?,
        status:      row.get(2)?,
        career_code: row.get(3)?,
      },
    })
  }

  pub fn into_record(self) -> Result<ReferenceRecord> {
    Ok(match self {
      Self::Subject { code, name, career_code, semester } => {
        ReferenceRecord::Subject(SubjectRecord {
          code,
          name,
          career_code,
          semester: decode_semester(semester)?,
        })
      }
      Self::Teacher { code, first_name, last_name, status, career_code, subject_codes } => {
        ReferenceRecord::Teacher(TeacherRecord {
          code,
          first_name,
          last_name,
          status: decode_status(&status)?,
          career_code,
          subject_codes: serde_json::from_str(&subject_codes)?,
        })
      }
      Self::Classroom { code, name, building_code, capacity, is_enabled } => {
        ReferenceRecord::Classroom(ClassroomRecord {
          code,
          name,
          building_code,
          capacity: decode_capacity(capacity)?,
          is_enabled,
        })
      }
      Self::TimeSlot { code, day, start, end, jornada_code } => {
        ReferenceRecord::TimeSlot(TimeSlotRecord { code, day, start, end, jornada_code })
      }
      Self::Section { code, name, status, jornada_code, capacity, semester } => {
        ReferenceRecord::Section(SectionRecord {
          code,
          name,
          status: decode_status(&status)?,
          jornada_code,
          capacity: decode_capacity(capacity)?,
          semester: decode_semester(semester)?,
        })
      }
      Self::Jornada { code, name, status, career_code } => {
        ReferenceRecord::Jornada(JornadaRecord {
          code,
          name,
          status: decode_status(&status)?,
          career_code,
        })
      }
    })
  }
}
