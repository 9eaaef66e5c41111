//! SQL schema for the mistri SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The UNIQUE and CHECK constraints are backstops for invariants the store
/// already enforces transactionally: at most one submission per
/// (posting, actor) pair, and a counter that can never go negative.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS postings (
    posting_id       TEXT PRIMARY KEY,
    owner_id         TEXT NOT NULL,
    title            TEXT NOT NULL,
    category         TEXT NOT NULL DEFAULT '',
    location         TEXT NOT NULL DEFAULT '',
    description      TEXT NOT NULL,
    kind             TEXT NOT NULL,   -- 'job' | 'contract'
    compensation     TEXT NOT NULL,   -- JSON-encoded Compensation
    status           TEXT NOT NULL DEFAULT 'open',
    submission_count INTEGER NOT NULL DEFAULT 0 CHECK (submission_count >= 0),
    created_at       TEXT NOT NULL    -- ISO 8601 UTC; store-assigned
);

-- Submissions are written once; the only mutation ever issued is the
-- single pending -> accepted/rejected status transition.
CREATE TABLE IF NOT EXISTS submissions (
    submission_id TEXT PRIMARY KEY,
    posting_id    TEXT NOT NULL REFERENCES postings(posting_id),
    actor_id      TEXT NOT NULL,
    actor_name    TEXT,              -- profile snapshot at submission time
    actor_photo   TEXT,
    details       TEXT NOT NULL,     -- JSON-encoded SubmissionDetails
    status        TEXT NOT NULL DEFAULT 'pending',
    created_at    TEXT NOT NULL,
    UNIQUE (posting_id, actor_id)
);

CREATE TABLE IF NOT EXISTS conversations (
    conversation_id TEXT PRIMARY KEY,
    participant_a   TEXT NOT NULL,
    participant_b   TEXT NOT NULL,
    last_message    TEXT NOT NULL,
    last_timestamp  TEXT NOT NULL,
    CHECK (participant_a < participant_b)
);

-- Messages are strictly append-only. `seq` is the delivery order within a
-- conversation; timestamps are assigned on the connection worker, so seq
-- order implies non-decreasing created_at.
CREATE TABLE IF NOT EXISTS messages (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id      TEXT NOT NULL UNIQUE,
    conversation_id TEXT NOT NULL REFERENCES conversations(conversation_id),
    sender_id       TEXT NOT NULL,
    text            TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS postings_status_idx      ON postings(status, created_at);
CREATE INDEX IF NOT EXISTS submissions_posting_idx  ON submissions(posting_id);
CREATE INDEX IF NOT EXISTS submissions_actor_idx    ON submissions(actor_id);
CREATE INDEX IF NOT EXISTS messages_conversation_idx ON messages(conversation_id);
CREATE INDEX IF NOT EXISTS conversations_participant_a_idx ON conversations(participant_a);
CREATE INDEX IF NOT EXISTS conversations_participant_b_idx ON conversations(participant_b);

PRAGMA user_version = 1;
";
