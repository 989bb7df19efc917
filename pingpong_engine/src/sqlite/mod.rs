//! SQLite backend for the live match engine.
//!
//! [`SqliteDatabase`] implements both [`MatchStore`](crate::traits::MatchStore) and
//! [`PlayerDirectory`](crate::traits::PlayerDirectory). Schema migrations are bundled and can be applied with
//! [`SqliteDatabase::migrate`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
