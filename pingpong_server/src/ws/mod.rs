//! WebSocket session actors.
//!
//! One actor per socket. On start the actor registers with the [`ConnectionRegistry`](crate::registry) and drains
//! its registry channel into the socket. Inbound text frames are handed to [`commands`](crate::commands) one at a
//! time: the actor waits for each command to finish before it reads the next frame.
//!
//! If a socket is silent for the configured keep-alive period the server sends it an application-level `ping`
//! envelope. Any inbound frame counts as activity.
mod arbiter_session;
mod live_session;

use std::time::{Duration, Instant};

pub use arbiter_session::ArbiterSession;
pub use live_session::LiveSession;

use crate::{
    envelopes::{Envelope, LiveEvent},
    helpers::to_json,
};

const MIN_IDLE_CHECK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
pub struct Heartbeat {
    keepalive: Duration,
    last_activity: Instant,
}

impl Heartbeat {
    pub fn new(keepalive: Duration) -> Self {
        Self { keepalive, last_activity: Instant::now() }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle(&self) -> bool {
        self.last_activity.elapsed() >= self.keepalive
    }

    /// How often the idle timer is checked.
    pub fn check_interval(&self) -> Duration {
        (self.keepalive / 4).max(MIN_IDLE_CHECK)
    }

    /// Returns the `ping` envelope to send if the socket has been idle for too long, and restarts the timer.
    pub fn poll(&mut self) -> Option<String> {
        if !self.is_idle() {
            return None;
        }
        self.touch();
        to_json(&Envelope::now(LiveEvent::Ping))
    }
}
