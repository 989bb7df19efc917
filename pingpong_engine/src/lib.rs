//! Live Match Engine
//!
//! The live match engine keeps score in table-tennis matches as they are played. It is storage-agnostic: match and
//! player documents are read and written through the collaborator traits in [`traits`].
//!
//! The library is divided into three main sections:
//! 1. The scoring state machine ([`mod@scoring`]). Pure functions that take a match snapshot and an arbiter action
//!    and return the next snapshot along with the situational flags (set point, match point, deuce). Serve rotation
//!    and the set and match win conditions live here. The number of sets needed to win a given match format is
//!    looked up in the [`rules::RuleTable`].
//! 2. The live match API ([`mod@live_api`]). [`LiveMatchApi`] fetches a snapshot, runs it through the state machine
//!    and saves the result, and enriches snapshots with player profiles for display.
//! 3. Storage ([`mod@sqlite`]). SQLite is the bundled backend. Any other document store can be used by implementing
//!    [`MatchStore`] and [`PlayerDirectory`].
pub mod db_types;
pub mod live_api;
pub mod rules;
pub mod scoring;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

pub use live_api::{errors::LiveMatchError, live_match_api::LiveMatchApi, match_objects::LiveMatch};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{MatchStore, MatchStoreError, PlayerDirectory, PlayerDirectoryError};
