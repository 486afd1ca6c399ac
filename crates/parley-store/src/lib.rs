//! # parley-store
//!
//! Local on-device storage for the Parley client, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for the persisted
//! session token.  Absence of a stored token means logged out.

pub mod database;
pub mod migrations;
pub mod session;

mod error;

pub use database::Database;
pub use error::StoreError;
