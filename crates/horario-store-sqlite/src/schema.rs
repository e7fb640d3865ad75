//! SQL schema for the Horario SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Reference store ─────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS subjects (
    code        TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    career_code TEXT NOT NULL,
    semester    INTEGER
);

CREATE TABLE IF NOT EXISTS teachers (
    code          TEXT PRIMARY KEY,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    status        TEXT NOT NULL DEFAULT 'active',   -- 'active' | 'inactive'
    career_code   TEXT NOT NULL,
    subject_codes TEXT NOT NULL DEFAULT '[]'        -- JSON array of codes
);

CREATE TABLE IF NOT EXISTS classrooms (
    code          TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    building_code TEXT NOT NULL,
    capacity      INTEGER NOT NULL DEFAULT 0,
    is_enabled    INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS time_slots (
    code         TEXT PRIMARY KEY,
    day          TEXT NOT NULL,
    start_time   TEXT NOT NULL,
    end_time     TEXT NOT NULL,
    jornada_code TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sections (
    code         TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'active',
    jornada_code TEXT NOT NULL,
    capacity     INTEGER NOT NULL DEFAULT 0,
    semester     INTEGER
);

CREATE TABLE IF NOT EXISTS jornadas (
    code        TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'active',
    career_code TEXT NOT NULL
);

-- ── Assignment store ────────────────────────────────────────────────────────

-- References are codes, not foreign keys: deleting a referenced entity
-- leaves its assignments in place.
CREATE TABLE IF NOT EXISTS assignments (
    code           TEXT PRIMARY KEY,
    subject_code   TEXT NOT NULL,
    teacher_code   TEXT NOT NULL,
    classroom_code TEXT NOT NULL,
    time_slot_code TEXT NOT NULL,
    jornada_code   TEXT NOT NULL,
    section_code   TEXT NOT NULL,
    period         TEXT NOT NULL,
    matrix_id      TEXT,               -- NULL only on rows predating matrix ids
    semester       INTEGER CHECK (semester IS NULL OR semester BETWEEN 1 AND 12),
    notes          TEXT NOT NULL DEFAULT '',
    created_by     TEXT NOT NULL DEFAULT '',
    created_at     TEXT NOT NULL,      -- RFC 3339 UTC
    updated_at     TEXT NOT NULL,
    UNIQUE (period, time_slot_code, teacher_code),
    UNIQUE (period, time_slot_code, classroom_code),
    UNIQUE (period, time_slot_code, section_code)
);

CREATE INDEX IF NOT EXISTS assignments_matrix_idx ON assignments(matrix_id);
CREATE INDEX IF NOT EXISTS assignments_legacy_idx
    ON assignments(period, jornada_code, section_code);

PRAGMA user_version = 1;
";
