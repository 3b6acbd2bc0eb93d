use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted roster entry, mirroring a `users` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Natural key for lookups; unique across all rows.
    pub email: String,
    /// Backend-assigned at insert, immutable afterwards.
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// A fixed bootstrap record; static so the seed list can live in a const.
#[derive(Debug, Clone, Copy)]
pub struct SeedUser {
    pub name: &'static str,
    pub email: &'static str,
}
