use crate::config::Config;
use crate::db::models::{SeedUser, User};
use crate::db::schema::{
    CREATE_USER_ID_SEQ, CREATE_USERS_TABLE, EMAIL_MAX_LEN, INIT_USER_ID_SEQ, NAME_MAX_LEN,
};
use crate::error::RosterError;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{info, warn};

/// Result of the startup connectivity probe. Distinguishes "backend
/// unreachable" from "backend reachable but schema missing" (the latter
/// shows up later as query failures, not here).
#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate health view: backend clock plus row count.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub current_time: DateTime<Utc>,
    pub total_users: i64,
}

/// Gateway over the SQLite pool. Constructed once in `main`, cloned into the
/// router state; explicit `connect`/`close` lifecycle, no global instance.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Connects to the database with bounded exponential backoff.
    ///
    /// Retries up to `db_connect_max_retries` times with jitter, starting at
    /// `db_connect_base_delay_ms`. Exhaustion returns the last error; the
    /// caller treats that as fatal (the process must not serve requests with
    /// no backend).
    pub async fn connect(cfg: &Config) -> Result<Self, RosterError> {
        let connect_opts = SqliteConnectOptions::from_str(&cfg.database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(cfg.db_connect_base_delay_ms))
            .with_max_delay(Duration::from_secs(10))
            .with_max_times(cfg.db_connect_max_retries)
            .with_jitter();

        let pool = (|| {
            let opts = connect_opts.clone();
            async move { SqlitePoolOptions::new().connect_with(opts).await }
        })
        .retry(retry_policy)
        .notify(|err: &sqlx::Error, dur: Duration| {
            warn!(error = %err, retry_in = ?dur, "Database connection failed; will retry");
        })
        .await?;

        Ok(Self { pool })
    }

    /// Closes the underlying pool. Called once at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Idempotently ensures the id sequence and the `users` table exist.
    ///
    /// Best-effort bootstrap: "already exists" is success, and any other DDL
    /// failure is logged and tolerated rather than aborting startup. A
    /// genuinely missing schema surfaces as query failures on the first
    /// request instead.
    pub async fn ensure_schema(&self) {
        self.ensure_ddl(CREATE_USER_ID_SEQ, "sequence table users_id_seq")
            .await;

        if let Err(e) = sqlx::query(INIT_USER_ID_SEQ).execute(&self.pool).await {
            warn!(error = %e, "Failed to initialize users_id_seq counter; continuing");
        }

        self.ensure_ddl(CREATE_USERS_TABLE, "table users").await;
    }

    async fn ensure_ddl(&self, ddl: &str, object: &str) {
        match sqlx::query(ddl).execute(&self.pool).await {
            Ok(_) => info!("Created {object}"),
            Err(e) if RosterError::is_already_exists(&e) => {
                info!("{object} already exists");
            }
            Err(e) => {
                warn!(error = %e, "Failed to create {object}; continuing (best-effort bootstrap)");
            }
        }
    }

    /// Idempotently inserts the fixed seed list, in order.
    ///
    /// Each row is a single conditional insert (`ON CONFLICT(email) DO
    /// NOTHING`), so a row whose email is already present is skipped
    /// atomically. A unique violation can still surface if a concurrent
    /// seeder races the insert; that outcome is expected and swallowed.
    pub async fn seed(&self, seeds: &[SeedUser]) {
        for s in seeds {
            match self.seed_one(s).await {
                Ok(true) => info!(name = s.name, email = s.email, "Seed user inserted"),
                Ok(false) => info!(email = s.email, "Seed user already present"),
                Err(e) if RosterError::is_unique_violation(&e) => {
                    info!(email = s.email, "Seed user inserted concurrently elsewhere");
                }
                Err(e) => {
                    warn!(email = s.email, error = %e, "Failed to insert seed user; continuing");
                }
            }
        }
    }

    /// Returns true when the row was inserted, false when skipped. A skipped
    /// seed burns a sequence value, which is fine: ids permit gaps.
    async fn seed_one(&self, s: &SeedUser) -> Result<bool, sqlx::Error> {
        let id = self.next_id().await?;
        let result = sqlx::query(
            "INSERT INTO users (id, name, email) VALUES (?, ?, ?) ON CONFLICT(email) DO NOTHING",
        )
        .bind(id)
        .bind(s.name)
        .bind(s.email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Allocates the next id from the sequence. Atomic single statement, so
    /// concurrent callers never observe the same value.
    async fn next_id(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("UPDATE users_id_seq SET value = value + 1 RETURNING value")
            .fetch_one(&self.pool)
            .await
    }

    /// All users, ascending by id. Insertion order is not meaningful
    /// otherwise.
    pub async fn list_all(&self) -> Result<Vec<User>, RosterError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at FROM users ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Looks up a user by the unique email key. `Ok(None)` for a miss;
    /// errors only on backend failure.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, RosterError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Creates a user: validate bounds, pre-check the email, insert with a
    /// sequence-allocated id, then re-read the canonical row (including the
    /// backend-assigned timestamp).
    ///
    /// The pre-check leaves a small race window; a unique violation at
    /// insert is translated into the same `Conflict` as the pre-check hit.
    pub async fn create(&self, name: &str, email: &str) -> Result<User, RosterError> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() {
            return Err(RosterError::InvalidInput("name must not be empty".into()));
        }
        if name.chars().count() > NAME_MAX_LEN {
            return Err(RosterError::InvalidInput(format!(
                "name must be at most {NAME_MAX_LEN} characters"
            )));
        }
        if email.is_empty() {
            return Err(RosterError::InvalidInput("email must not be empty".into()));
        }
        if email.chars().count() > EMAIL_MAX_LEN {
            return Err(RosterError::InvalidInput(format!(
                "email must be at most {EMAIL_MAX_LEN} characters"
            )));
        }

        if self.find_by_email(email).await?.is_some() {
            return Err(RosterError::Conflict {
                email: email.to_string(),
            });
        }

        let id = self.next_id().await?;
        let inserted = sqlx::query("INSERT INTO users (id, name, email) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(email)
            .execute(&self.pool)
            .await;

        if let Err(e) = inserted {
            if RosterError::is_unique_violation(&e) {
                return Err(RosterError::Conflict {
                    email: email.to_string(),
                });
            }
            return Err(e.into());
        }

        self.find_by_email(email).await?.ok_or_else(|| {
            RosterError::Unexpected(format!("user vanished after insert: {email}"))
        })
    }

    /// Trivial constant-result query; cheap liveness check for the backend.
    pub async fn probe(&self) -> ProbeReport {
        match sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
        {
            Ok(v) => ProbeReport {
                connected: true,
                detail: Some(format!("SELECT 1 returned {v}")),
                error: None,
            },
            Err(e) => ProbeReport {
                connected: false,
                detail: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Backend clock plus total row count, for health reporting.
    pub async fn status(&self) -> Result<StatusReport, RosterError> {
        let current_time: DateTime<Utc> = sqlx::query_scalar("SELECT CURRENT_TIMESTAMP")
            .fetch_one(&self.pool)
            .await?;

        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(StatusReport {
            current_time,
            total_users,
        })
    }
}
