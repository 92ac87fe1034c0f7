//! Clock abstraction for deterministic timestamping.

use prost_types::Timestamp;

/// Supplies the current time to event-packing helpers.
///
/// Production code uses [`SystemClock`]. Tests can substitute [`FixedClock`]
/// so packed events get reproducible `created_at` values.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system wall clock.
#[derive(Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        crate::convert::now()
    }
}

/// Clock that always returns the same timestamp.
#[derive(Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0.clone()
    }
}
