//! [`SqliteStore`], the SQLite implementation of [`ScheduleStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension as _, Transaction, TransactionBehavior, types::Value};
use tracing::{debug, info};

use horario_core::{
  assignment::{Assignment, AssignmentFilter, NewAssignment},
  conflict::{self, Occupant},
  matrix::LegacyKey,
  reference::{EntityKind, ReferenceRecord},
  store::{BatchCommit, ScheduleStore},
};

use crate::{
  Error, Result,
  encode::{
    ASSIGNMENT_COLUMNS, RawAssignment, RawReference, encode_dt, encode_reference,
    reference_columns, reference_table,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Horario store backed by a single SQLite file.
///
/// Clones share the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a query over `assignments` and decode every row.
  async fn query_assignments(&self, sql: String, params: Vec<Value>) -> Result<Vec<Assignment>> {
    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawAssignment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }
}

// ─── Transaction helpers ─────────────────────────────────────────────────────

/// First persisted assignment sharing `(period, time slot)` and a teacher,
/// classroom or section with `entry`. Rows of `exclude` are ignored; rows
/// with no matrix id always count.
fn find_occupant(
  tx: &Transaction<'_>,
  entry: &NewAssignment,
  exclude: Option<&str>,
) -> rusqlite::Result<Option<Occupant>> {
  tx.query_row(
    "SELECT code, teacher_code, classroom_code, section_code
     FROM assignments
     WHERE period = ?1 AND time_slot_code = ?2
       AND (teacher_code = ?3 OR classroom_code = ?4 OR section_code = ?5)
       AND (?6 IS NULL OR matrix_id IS NULL OR matrix_id != ?6)
     LIMIT 1",
    rusqlite::params![
      entry.period,
      entry.time_slot_code,
      entry.teacher_code,
      entry.classroom_code,
      entry.section_code,
      exclude,
    ],
    |row| {
      Ok(Occupant {
        code:           row.get(0)?,
        teacher_code:   row.get(1)?,
        classroom_code: row.get(2)?,
        section_code:   row.get(3)?,
      })
    },
  )
  .optional()
}

/// Stamp `key` onto the rows it addresses that carry no matrix id.
fn stamp_legacy(tx: &Transaction<'_>, key: &LegacyKey, at: &str) -> rusqlite::Result<usize> {
  tx.execute(
    "UPDATE assignments SET matrix_id = ?1, updated_at = ?2
     WHERE matrix_id IS NULL AND period = ?3 AND jornada_code = ?4 AND section_code = ?5",
    rusqlite::params![key.to_string(), at, key.period, key.jornada_code, key.section_code],
  )
}

fn insert_assignment(tx: &Transaction<'_>, entry: &NewAssignment, at: &str) -> rusqlite::Result<()> {
  tx.execute(
    &format!(
      "INSERT INTO assignments ({ASSIGNMENT_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)"
    ),
    rusqlite::params![
      entry.code,
      entry.subject_code,
      entry.teacher_code,
      entry.classroom_code,
      entry.time_slot_code,
      entry.jornada_code,
      entry.section_code,
      entry.period,
      entry.matrix_id,
      entry.semester,
      entry.notes,
      entry.created_by,
      at,
    ],
  )?;
  Ok(())
}

/// Translate a uniqueness violation raised by inserting `entry` into the
/// domain conflict it stands for.
fn constraint_conflict(err: &rusqlite::Error, entry: &NewAssignment) -> Option<horario_core::Error> {
  let rusqlite::Error::SqliteFailure(failure, message) = err else {
    return None;
  };
  let uniqueness = [
    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
    rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
  ];
  if failure.code != ErrorCode::ConstraintViolation
    || !uniqueness.contains(&failure.extended_code)
  {
    return None;
  }

  let message = message.as_deref().unwrap_or_default();
  if message.contains("assignments.code") {
    return Some(horario_core::Error::Conflict(format!(
      "Assignment code {} already exists",
      entry.code
    )));
  }

  // Rebuild an occupant holding only the violated column so the message
  // names the right dimension.
  let mut occupant = Occupant {
    code:           String::new(),
    teacher_code:   String::new(),
    classroom_code: String::new(),
    section_code:   String::new(),
  };
  if message.contains("teacher_code") {
    occupant.teacher_code = entry.teacher_code.clone();
  } else if message.contains("classroom_code") {
    occupant.classroom_code = entry.classroom_code.clone();
  } else if message.contains("section_code") {
    occupant.section_code = entry.section_code.clone();
  }
  Some(conflict::classify(entry, &occupant))
}

// ─── ScheduleStore impl ──────────────────────────────────────────────────────

impl ScheduleStore for SqliteStore {
  type Error = Error;

  // ── Reference store ───────────────────────────────────────────────────────

  async fn find_by_code(&self, kind: EntityKind, code: String) -> Result<Option<ReferenceRecord>> {
    let sql = format!(
      "SELECT {} FROM {} WHERE code = ?1",
      reference_columns(kind),
      reference_table(kind),
    );

    let raw: Option<RawReference> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![code], |row| RawReference::from_row(kind, row))
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReference::into_record).transpose()
  }

  async fn find_many_by_codes(
    &self,
    kind: EntityKind,
    codes: Vec<String>,
  ) -> Result<Vec<ReferenceRecord>> {
    if codes.is_empty() {
      return Ok(Vec::new());
    }

    let placeholders = vec!["?"; codes.len()].join(", ");
    let sql = format!(
      "SELECT {} FROM {} WHERE code IN ({placeholders})",
      reference_columns(kind),
      reference_table(kind),
    );

    let raws: Vec<RawReference> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(codes), |row| RawReference::from_row(kind, row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(%kind, found = raws.len(), "reference lookup");
    raws.into_iter().map(RawReference::into_record).collect()
  }

  async fn put_reference(&self, record: ReferenceRecord) -> Result<()> {
    let (sql, values) = encode_reference(&record)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_reference(&self, kind: EntityKind, code: String) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE code = ?1", reference_table(kind));

    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![code])?))
      .await?;
    Ok(removed > 0)
  }

  // ── Assignment reads ──────────────────────────────────────────────────────

  async fn list_assignments(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>> {
    let mut conds: Vec<String> = vec![];
    let mut params: Vec<Value> = vec![];

    let equalities = [
      ("jornada_code", &filter.jornada),
      ("period", &filter.period),
      ("teacher_code", &filter.teacher),
      ("section_code", &filter.section),
    ];
    for (column, value) in equalities {
      if let Some(value) = value {
        conds.push(format!("{column} = ?"));
        params.push(Value::Text(value.clone()));
      }
    }

    if let Some(scope) = &filter.jornadas_in {
      if scope.is_empty() {
        return Ok(Vec::new());
      }
      conds.push(format!("jornada_code IN ({})", vec!["?"; scope.len()].join(", ")));
      params.extend(scope.iter().cloned().map(Value::Text));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    let sql = format!(
      "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
       {where_clause}
       ORDER BY period, jornada_code, time_slot_code, code"
    );
    self.query_assignments(sql, params).await
  }

  async fn find_assignment(&self, code: String) -> Result<Option<Assignment>> {
    let raw: Option<RawAssignment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE code = ?1"),
              rusqlite::params![code],
              RawAssignment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAssignment::into_assignment).transpose()
  }

  async fn find_matrix(&self, matrix_id: String) -> Result<Vec<Assignment>> {
    let sql = format!(
      "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
       WHERE matrix_id = ?
       ORDER BY time_slot_code, code"
    );
    self.query_assignments(sql, vec![Value::Text(matrix_id)]).await
  }

  async fn resolve_legacy(&self, key: LegacyKey) -> Result<Vec<Assignment>> {
    let at = encode_dt(Utc::now());

    let (stamped, raws): (usize, Vec<RawAssignment>) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let stamped = stamp_legacy(&tx, &key, &at)?;

        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
             WHERE matrix_id = ?1
             ORDER BY time_slot_code, code"
          ))?;
          stmt
            .query_map(rusqlite::params![key.to_string()], RawAssignment::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.commit()?;
        Ok((stamped, rows))
      })
      .await?;

    if stamped > 0 {
      info!(stamped, "legacy rows given a matrix id");
    }
    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }

  // ── Assignment writes ─────────────────────────────────────────────────────

  async fn commit_batch(&self, commit: BatchCommit) -> Result<Vec<Assignment>> {
    let now = Utc::now();
    let at = encode_dt(now);
    let BatchCommit { entries, replaces } = commit;

    let outcome: std::result::Result<(Vec<NewAssignment>, usize), horario_core::Error> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(target) = &replaces
          && let Some(key) = LegacyKey::parse(target)
        {
          stamp_legacy(&tx, &key, &at)?;
        }

        let clash =
          conflict::detect(&entries, |entry| find_occupant(&tx, entry, replaces.as_deref()))?;
        if let Some(err) = clash {
          return Ok(Err(err));
        }

        let removed = match &replaces {
          Some(target) => tx.execute(
            "DELETE FROM assignments WHERE matrix_id = ?1",
            rusqlite::params![target],
          )?,
          None => 0,
        };

        for entry in &entries {
          if let Err(err) = insert_assignment(&tx, entry, &at) {
            return match constraint_conflict(&err, entry) {
              Some(conflict) => Ok(Err(conflict)),
              None => Err(err.into()),
            };
          }
        }

        tx.commit()?;
        Ok(Ok((entries, removed)))
      })
      .await?;

    let (entries, removed) = outcome?;
    debug!(inserted = entries.len(), removed, "assignment batch committed");
    Ok(entries.into_iter().map(|entry| entry.into_assignment(now)).collect())
  }

  async fn delete_matrix(&self, matrix_id: String) -> Result<u64> {
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut removed = tx.execute(
          "DELETE FROM assignments WHERE matrix_id = ?1",
          rusqlite::params![matrix_id],
        )?;

        if let Some(key) = LegacyKey::parse(&matrix_id) {
          removed += tx.execute(
            "DELETE FROM assignments
             WHERE matrix_id IS NULL AND period = ?1 AND jornada_code = ?2 AND section_code = ?3",
            rusqlite::params![key.period, key.jornada_code, key.section_code],
          )?;
        }

        tx.commit()?;
        Ok(removed)
      })
      .await?;

    Ok(removed as u64)
  }

  async fn delete_assignment(&self, code: String) -> Result<bool> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM assignments WHERE code = ?1", rusqlite::params![code])?)
      })
      .await?;
    Ok(removed > 0)
  }
}
