//! SQL schema for the recruitment store.
//!
//! Applied on every open; `PRAGMA user_version` records the layout version.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` / `INSERT OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS statuses (
    id        INTEGER PRIMARY KEY,
    code      TEXT NOT NULL UNIQUE,
    name      TEXT NOT NULL,
    stage     INTEGER NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

INSERT OR IGNORE INTO statuses (id, code, name, stage) VALUES
    (1, 'admin_selection', 'Administrative Selection', 1),
    (2, 'psychotest',      'Psychological Test',       2),
    (3, 'interview',       'Interview',                3),
    (4, 'accepted',        'Accepted',                 4),
    (5, 'rejected',        'Rejected',                 4);

CREATE TABLE IF NOT EXISTS companies (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    email       TEXT,
    phone       TEXT,
    address     TEXT,
    description TEXT,
    logo_path   TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS about_us (
    company_id  INTEGER PRIMARY KEY REFERENCES companies(id) ON DELETE CASCADE,
    vision      TEXT,
    mission     TEXT,
    description TEXT,
    logo_path   TEXT,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS question_packs (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    name             TEXT NOT NULL,
    description      TEXT,
    duration_minutes INTEGER,
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS questions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    question_pack_id INTEGER NOT NULL REFERENCES question_packs(id) ON DELETE CASCADE,
    kind             TEXT NOT NULL CHECK (kind IN ('multiple_choice', 'essay')),
    prompt           TEXT NOT NULL,
    points           INTEGER NOT NULL CHECK (points >= 1)
);

CREATE TABLE IF NOT EXISTS choices (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    label       TEXT NOT NULL,
    is_correct  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS vacancies (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id       INTEGER NOT NULL REFERENCES companies(id),
    title            TEXT NOT NULL,
    department       TEXT,
    location         TEXT,
    employment_type  TEXT,
    description      TEXT,
    requirements     TEXT,
    question_pack_id INTEGER REFERENCES question_packs(id),
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vacancy_periods (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    vacancy_id INTEGER NOT NULL REFERENCES vacancies(id),
    name       TEXT NOT NULL,
    starts_on  TEXT NOT NULL,   -- YYYY-MM-DD
    ends_on    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    CHECK (ends_on >= starts_on)
);

CREATE TABLE IF NOT EXISTS applications (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id           INTEGER NOT NULL,
    vacancy_period_id INTEGER NOT NULL REFERENCES vacancy_periods(id),
    status_id         INTEGER NOT NULL REFERENCES statuses(id),
    resume_path       TEXT,
    cover_letter_path TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    UNIQUE (user_id, vacancy_period_id)
);

-- Append-only ledger; the only UPDATE closes the active row.
CREATE TABLE IF NOT EXISTS application_histories (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL REFERENCES applications(id),
    status_id      INTEGER NOT NULL REFERENCES statuses(id),
    processed_at   TEXT NOT NULL,
    reviewed_at    TEXT,
    completed_at   TEXT,
    score          REAL,
    notes          TEXT,
    reviewed_by    INTEGER,
    is_active      INTEGER NOT NULL DEFAULT 1,
    zoom_url       TEXT,
    scheduled_at   TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS application_histories_single_active
    ON application_histories(application_id) WHERE is_active = 1;

CREATE TABLE IF NOT EXISTS user_answers (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id        INTEGER NOT NULL,
    question_id    INTEGER NOT NULL REFERENCES questions(id),
    application_id INTEGER NOT NULL REFERENCES applications(id),
    choice_id      INTEGER REFERENCES choices(id),
    answer_text    TEXT,
    score          REAL,
    answered_at    TEXT NOT NULL,
    graded_by      INTEGER,
    UNIQUE (application_id, question_id)
);

CREATE TABLE IF NOT EXISTS candidate_profiles (
    user_id    INTEGER PRIMARY KEY,
    full_name  TEXT NOT NULL,
    email      TEXT NOT NULL,
    phone      TEXT,
    address    TEXT,
    birth_date TEXT,
    summary    TEXT,
    cv_path    TEXT,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS educations (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id        INTEGER NOT NULL,
    institution    TEXT NOT NULL,
    degree         TEXT,
    field_of_study TEXT,
    start_year     INTEGER NOT NULL,
    end_year       INTEGER,
    gpa            REAL
);

CREATE TABLE IF NOT EXISTS experiences (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL,
    company_name TEXT NOT NULL,
    position     TEXT NOT NULL,
    started_on   TEXT NOT NULL,
    ended_on     TEXT,
    description  TEXT
);

CREATE TABLE IF NOT EXISTS skills (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    name    TEXT NOT NULL,
    level   TEXT
);

CREATE INDEX IF NOT EXISTS applications_period_idx ON applications(vacancy_period_id);
CREATE INDEX IF NOT EXISTS applications_user_idx   ON applications(user_id);
CREATE INDEX IF NOT EXISTS histories_application_idx ON application_histories(application_id);
CREATE INDEX IF NOT EXISTS questions_pack_idx      ON questions(question_pack_id);

PRAGMA user_version = 1;
";
