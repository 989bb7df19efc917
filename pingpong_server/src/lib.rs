//! # Ping-pong live server
//! This crate hosts the real-time side of live table-tennis scoring. It is responsible for:
//! Accepting WebSocket connections from arbiters, spectators, TV screens and admin consoles.
//! Decoding arbiter commands, running them through the scoring engine and saving the result.
//! Fanning every state change out to the match's subscribers and to the global feed.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/pingpong/ws/live`: The live feed for spectators, TVs and admins. Accepts `match_id` and `type` query params.
//! * `/pingpong/ws/arbiter/{match_id}`: The arbiter control channel for a single match.
//! * `/pingpong/ws/stats`: Connection registry statistics.
//! * `/pingpong/ws/broadcast`: Operator tool that pushes an arbitrary JSON message to every connection.

pub mod cli;
pub mod commands;
pub mod config;
pub mod data_objects;
pub mod envelopes;
pub mod errors;
pub mod helpers;
pub mod registry;
pub mod routes;
pub mod server;
pub mod ws;
