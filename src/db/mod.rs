//! Database module: the pool-backed store, row models, and schema DDL.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL and the fixed seed list (SQLite-first)
//! - `store.rs`: the `UserStore` gateway (connect, bootstrap, seed, queries)

pub mod models;
pub mod schema;
pub mod store;

pub use models::{NewUser, SeedUser, User};
pub use schema::SEED_USERS;
pub use store::{ProbeReport, StatusReport, UserStore};
