//! # Collaborator contracts
//!
//! The live engine does not own match or player documents. It reads and writes them through these traits, so that
//! any document store can act as a backend. [`SqliteDatabase`](crate::SqliteDatabase) is the bundled implementation.
//!
//! * [`MatchStore`] reads and writes match snapshots.
//! * [`PlayerDirectory`] looks up player profiles for display.
mod match_store;
mod player_directory;

pub use match_store::{MatchStore, MatchStoreError};
pub use player_directory::{PlayerDirectory, PlayerDirectoryError};
