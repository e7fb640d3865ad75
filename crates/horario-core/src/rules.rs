//! Cross-reference business rules.
//!
//! Run after every referenced record has been bulk-fetched into a
//! [`ReferenceSet`]. The first failing rule aborts the whole batch.

use std::collections::BTreeSet;

use crate::{
  Error, Result,
  assignment::Candidate,
  reference::{EntityKind, ReferenceSet, Status},
};

/// The distinct codes a batch references, per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencedCodes {
  pub subjects:   Vec<String>,
  pub teachers:   Vec<String>,
  pub classrooms: Vec<String>,
  pub time_slots: Vec<String>,
  pub sections:   Vec<String>,
  pub jornadas:   Vec<String>,
}

impl ReferencedCodes {
  pub fn collect(batch: &[Candidate]) -> Self {
    fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
      values.cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }
    Self {
      subjects:   distinct(batch.iter().map(|c| &c.subject_code)),
      teachers:   distinct(batch.iter().map(|c| &c.teacher_code)),
      classrooms: distinct(batch.iter().map(|c| &c.classroom_code)),
      time_slots: distinct(batch.iter().map(|c| &c.time_slot_code)),
      sections:   distinct(batch.iter().map(|c| &c.section_code)),
      jornadas:   distinct(batch.iter().map(|c| &c.jornada_code)),
    }
  }

  pub fn for_kind(&self, kind: EntityKind) -> &[String] {
    match kind {
      EntityKind::Subject => &self.subjects,
      EntityKind::Teacher => &self.teachers,
      EntityKind::Classroom => &self.classrooms,
      EntityKind::TimeSlot => &self.time_slots,
      EntityKind::Section => &self.sections,
      EntityKind::Jornada => &self.jornadas,
    }
  }
}

/// Check every entry against the fetched references.
///
/// Entries without a semester inherit their section's.
pub fn check_references(batch: &mut [Candidate], refs: &ReferenceSet) -> Result<()> {
  for c in batch.iter_mut() {
    let subject = refs
      .subjects
      .get(&c.subject_code)
      .ok_or_else(|| Error::integrity(format!("Subject {} does not exist", c.subject_code)))?;

    let teacher = refs
      .teachers
      .get(&c.teacher_code)
      .ok_or_else(|| Error::integrity(format!("Teacher {} does not exist", c.teacher_code)))?;
    if teacher.status == Status::Inactive {
      return Err(Error::integrity(format!("Teacher {} is inactive", c.teacher_code)));
    }
    if !teacher.teaches(&c.subject_code) {
      return Err(Error::integrity(format!(
        "Teacher {} is not associated with subject {}",
        c.teacher_code, c.subject_code
      )));
    }
    if teacher.career_code != subject.career_code {
      return Err(Error::integrity(format!(
        "Teacher {} and subject {} belong to different careers",
        c.teacher_code, c.subject_code
      )));
    }

    let classroom = refs.classrooms.get(&c.classroom_code).ok_or_else(|| {
      Error::integrity(format!("Classroom {} does not exist", c.classroom_code))
    })?;
    if !classroom.is_enabled {
      return Err(Error::integrity(format!("Classroom {} is disabled", c.classroom_code)));
    }

    let time_slot = refs.time_slots.get(&c.time_slot_code).ok_or_else(|| {
      Error::integrity(format!("Time slot {} does not exist", c.time_slot_code))
    })?;

    let section = refs
      .sections
      .get(&c.section_code)
      .ok_or_else(|| Error::integrity(format!("Section {} does not exist", c.section_code)))?;
    if section.status == Status::Inactive {
      return Err(Error::integrity(format!("Section {} is inactive", c.section_code)));
    }

    if !refs.jornadas.contains_key(&c.jornada_code) {
      return Err(Error::integrity(format!("Jornada {} does not exist", c.jornada_code)));
    }
    if time_slot.jornada_code != c.jornada_code {
      return Err(Error::integrity(format!(
        "Time slot {} does not belong to jornada {}",
        c.time_slot_code, c.jornada_code
      )));
    }
    if section.jornada_code != c.jornada_code {
      return Err(Error::integrity(format!(
        "Section {} does not belong to jornada {}",
        c.section_code, c.jornada_code
      )));
    }

    if c.semester.is_none() {
      c.semester = match section.semester {
        Some(semester) if !(1..=12).contains(&semester) => {
          return Err(Error::integrity(format!(
            "Section {} has an invalid semester {semester}",
            c.section_code
          )));
        }
        inherited => inherited,
      };
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::reference::{
    ClassroomRecord, JornadaRecord, ReferenceRecord, SectionRecord, SubjectRecord,
    TeacherRecord, TimeSlotRecord,
  };

  fn refs() -> ReferenceSet {
    [
      ReferenceRecord::Subject(SubjectRecord {
        code:        "SUB1".into(),
        name:        "Algebra".into(),
        career_code: "CAR1".into(),
        semester:    Some(1),
      }),
      ReferenceRecord::Subject(SubjectRecord {
        code:        "SUB2".into(),
        name:        "Anatomy".into(),
        career_code: "CAR2".into(),
        semester:    Some(1),
      }),
      ReferenceRecord::Teacher(TeacherRecord {
        code:          "T1".into(),
        first_name:    "Ada".into(),
        last_name:     "Lovelace".into(),
        status:        Status::Active,
        career_code:   "CAR1".into(),
        subject_codes: vec!["SUB1".into(), "SUB2".into()],
      }),
      ReferenceRecord::Classroom(ClassroomRecord {
        code:          "C1".into(),
        name:          "Room 101".into(),
        building_code: "B1".into(),
        capacity:      30,
        is_enabled:    true,
      }),
      ReferenceRecord::TimeSlot(TimeSlotRecord {
        code:         "M1".into(),
        day:          "monday".into(),
        start:        "08:00".into(),
        end:          "09:30".into(),
        jornada_code: "J1".into(),
      }),
      ReferenceRecord::TimeSlot(TimeSlotRecord {
        code:         "N1".into(),
        day:          "monday".into(),
        start:        "19:00".into(),
        end:          "20:30".into(),
        jornada_code: "J2".into(),
      }),
      ReferenceRecord::Section(SectionRecord {
        code:         "S1".into(),
        name:         "1A".into(),
        status:       Status::Active,
        jornada_code: "J1".into(),
        capacity:     30,
        semester:     Some(4),
      }),
      ReferenceRecord::Jornada(JornadaRecord {
        code:        "J1".into(),
        name:        "Morning".into(),
        status:      Status::Active,
        career_code: "CAR1".into(),
      }),
    ]
    .into_iter()
    .collect()
  }

  fn candidate() -> Candidate {
    Candidate {
      code:           None,
      subject_code:   "SUB1".into(),
      teacher_code:   "T1".into(),
      classroom_code: "C1".into(),
      time_slot_code: "M1".into(),
      jornada_code:   "J1".into(),
      section_code:   "S1".into(),
      period:         "2024-1".into(),
      matrix_id:      "MX".into(),
      semester:       None,
      notes:          String::new(),
    }
  }

  fn check(c: Candidate, refs: &ReferenceSet) -> Result<Candidate> {
    let mut batch = [c];
    check_references(&mut batch, refs)?;
    let [c] = batch;
    Ok(c)
  }

  #[test]
  fn valid_entry_inherits_section_semester() {
    let c = check(candidate(), &refs()).unwrap();
    assert_eq!(c.semester, Some(4));
  }

  #[test]
  fn out_of_range_section_semester_is_not_inherited() {
    let mut refs = refs();
    refs.sections.get_mut("S1").unwrap().semester = Some(13);
    assert_eq!(
      check(candidate(), &refs).unwrap_err(),
      Error::ReferentialIntegrity("Section S1 has an invalid semester 13".into())
    );

    // An explicit semester does not consult the section.
    let mut c = candidate();
    c.semester = Some(2);
    assert_eq!(check(c, &refs).unwrap().semester, Some(2));
  }

  #[test]
  fn explicit_semester_is_kept() {
    let mut c = candidate();
    c.semester = Some(2);
    assert_eq!(check(c, &refs()).unwrap().semester, Some(2));
  }

  #[test]
  fn unknown_subject() {
    let mut c = candidate();
    c.subject_code = "NOPE".into();
    assert_eq!(
      check(c, &refs()).unwrap_err(),
      Error::ReferentialIntegrity("Subject NOPE does not exist".into())
    );
  }

  #[test]
  fn inactive_teacher() {
    let mut refs = refs();
    refs.teachers.get_mut("T1").unwrap().status = Status::Inactive;
    assert_eq!(
      check(candidate(), &refs).unwrap_err(),
      Error::ReferentialIntegrity("Teacher T1 is inactive".into())
    );
  }

  #[test]
  fn teacher_not_authorised_for_subject() {
    let mut refs = refs();
    refs.teachers.get_mut("T1").unwrap().subject_codes = vec!["SUB2".into()];
    let err = check(candidate(), &refs).unwrap_err();
    assert_eq!(
      err,
      Error::ReferentialIntegrity("Teacher T1 is not associated with subject SUB1".into())
    );
  }

  #[test]
  fn teacher_and_subject_careers_differ() {
    let mut c = candidate();
    c.subject_code = "SUB2".into();
    let err = check(c, &refs()).unwrap_err();
    assert!(matches!(err, Error::ReferentialIntegrity(ref m) if m.contains("different careers")));
  }

  #[test]
  fn disabled_classroom() {
    let mut refs = refs();
    refs.classrooms.get_mut("C1").unwrap().is_enabled = false;
    assert_eq!(
      check(candidate(), &refs).unwrap_err(),
      Error::ReferentialIntegrity("Classroom C1 is disabled".into())
    );
  }

  #[test]
  fn inactive_section() {
    let mut refs = refs();
    refs.sections.get_mut("S1").unwrap().status = Status::Inactive;
    assert_eq!(
      check(candidate(), &refs).unwrap_err(),
      Error::ReferentialIntegrity("Section S1 is inactive".into())
    );
  }

  #[test]
  fn unknown_jornada() {
    let mut c = candidate();
    c.jornada_code = "J9".into();
    assert_eq!(
      check(c, &refs()).unwrap_err(),
      Error::ReferentialIntegrity("Jornada J9 does not exist".into())
    );
  }

  #[test]
  fn time_slot_of_another_jornada() {
    let mut c = candidate();
    c.time_slot_code = "N1".into();
    assert_eq!(
      check(c, &refs()).unwrap_err(),
      Error::ReferentialIntegrity("Time slot N1 does not belong to jornada J1".into())
    );
  }

  #[test]
  fn section_of_another_jornada() {
    let mut refs = refs();
    refs.sections.get_mut("S1").unwrap().jornada_code = "J2".into();
    assert_eq!(
      check(candidate(), &refs).unwrap_err(),
      Error::ReferentialIntegrity("Section S1 does not belong to jornada J1".into())
    );
  }

  #[test]
  fn referenced_codes_are_distinct_and_sorted() {
    let mut other = candidate();
    other.teacher_code = "T0".into();
    let codes = ReferencedCodes::collect(&[candidate(), other, candidate()]);
    assert_eq!(codes.teachers, ["T0", "T1"]);
    assert_eq!(codes.for_kind(EntityKind::Section), ["S1"]);
  }
}
