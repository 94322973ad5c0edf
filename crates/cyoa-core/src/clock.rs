use std::fmt;

use chrono::{DateTime, Utc};

/// A source of "now" for stamping `createdAt`, `updatedAt`, and history entries.
///
/// Production code uses [`SystemClock`]. Replays and tests use [`FixedClock`]
/// so two runs of the same choice sequence produce identical snapshots.
pub trait Clock: fmt::Debug + Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
