//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

use crate::db::models::SeedUser;

/// Id sequence for `users`, kept as a one-row counter table since SQLite has
/// no `CREATE SEQUENCE`. Bumped atomically with `UPDATE ... RETURNING`, so
/// allocated ids are never reused (gaps are permitted).
///
/// Deliberately not `IF NOT EXISTS`: the bootstrap recognizes the
/// "already exists" error and treats it as success, so a re-run is a no-op.
pub const CREATE_USER_ID_SEQ: &str = r"
CREATE TABLE users_id_seq (
    value INTEGER NOT NULL
)
";

/// Seeds the sequence counter at zero, only when the row is missing.
pub const INIT_USER_ID_SEQ: &str = r"
INSERT INTO users_id_seq (value)
SELECT 0 WHERE NOT EXISTS (SELECT 1 FROM users_id_seq)
";

/// The `users` table. Same already-exists tolerance as the sequence above.
pub const CREATE_USERS_TABLE: &str = r"
CREATE TABLE users (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    email TEXT UNIQUE,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)
";

/// Maximum length accepted for `name`.
pub const NAME_MAX_LEN: usize = 100;

/// Maximum length accepted for `email`.
pub const EMAIL_MAX_LEN: usize = 200;

/// Fixed example rows inserted once at startup, in list order.
pub const SEED_USERS: &[SeedUser] = &[
    SeedUser {
        name: "João Silva",
        email: "joao@example.com",
    },
    SeedUser {
        name: "Maria Santos",
        email: "maria@example.com",
    },
    SeedUser {
        name: "Pedro Oliveira",
        email: "pedro@example.com",
    },
];
