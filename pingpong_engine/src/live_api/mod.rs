//! # Live match API
//!
//! [`LiveMatchApi`](live_match_api::LiveMatchApi) is the programmatic entry point for driving a match in real time.
//! It is created by supplying a backend that implements both [`MatchStore`](crate::traits::MatchStore) and
//! [`PlayerDirectory`](crate::traits::PlayerDirectory):
//!
//! ```rust,ignore
//! use pingpong_engine::{LiveMatchApi, SqliteDatabase, scoring::MatchAction, db_types::Side};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = LiveMatchApi::new(db);
//! let outcome = api.apply(&match_id, MatchAction::Point { scorer: Side::A, point_type: "ace".into() }).await?;
//! ```
pub mod errors;
pub mod live_match_api;
pub mod match_objects;
