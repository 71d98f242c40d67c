//! SQL schema for the survey SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Answers are shared between questions.
CREATE TABLE IF NOT EXISTS answers (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    text      TEXT NOT NULL,
    alt_text  TEXT
);

CREATE TABLE IF NOT EXISTS questions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    text            TEXT NOT NULL,
    alt_text        TEXT,
    help_text       TEXT,
    canonical_name  TEXT,
    status          TEXT NOT NULL DEFAULT 'DRAFT'   -- DRAFT | PUBLISHED | RETIRED
);

CREATE TABLE IF NOT EXISTS question_answers (
    question_id  INTEGER NOT NULL REFERENCES questions(id),
    answer_id    INTEGER NOT NULL REFERENCES answers(id),
    sequence     INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (question_id, answer_id)
);

CREATE TABLE IF NOT EXISTS surveys (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    canonical_name    TEXT NOT NULL UNIQUE,
    title             TEXT,
    description       TEXT,
    status            TEXT NOT NULL DEFAULT 'DRAFT',
    last_update_user  TEXT NOT NULL,
    last_update_date  TEXT NOT NULL    -- RFC 3339 UTC; server-assigned
);

-- One row per (survey, question); re-linking overwrites the placement.
CREATE TABLE IF NOT EXISTS survey_questions (
    survey_id    INTEGER NOT NULL REFERENCES surveys(id),
    question_id  INTEGER NOT NULL REFERENCES questions(id),
    sequence     INTEGER NOT NULL DEFAULT 0,
    number       TEXT,
    PRIMARY KEY (survey_id, question_id)
);

CREATE TABLE IF NOT EXISTS text_groups (
    text_key  TEXT NOT NULL,
    variant   TEXT NOT NULL,
    text      TEXT NOT NULL,
    PRIMARY KEY (text_key, variant)
);

CREATE TABLE IF NOT EXISTS responses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    owner       TEXT NOT NULL,
    survey_id   INTEGER NOT NULL REFERENCES surveys(id),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    UNIQUE (owner, survey_id)
);

CREATE TABLE IF NOT EXISTS response_answers (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    response_id  INTEGER NOT NULL REFERENCES responses(id),
    question_id  INTEGER NOT NULL REFERENCES questions(id),
    answer_ids   TEXT NOT NULL DEFAULT '[]',   -- JSON array of answer ids
    UNIQUE (response_id, question_id)
);

CREATE INDEX IF NOT EXISTS responses_survey_idx ON responses(survey_id);

PRAGMA user_version = 1;
";
