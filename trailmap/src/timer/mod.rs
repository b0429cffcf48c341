//! Deferred continuations.
//!
//! Components never sleep. When they need something to happen later they
//! ask a [`Timer`] to deliver a [`Wakeup`] after a delay, and the owner of
//! the session feeds that wakeup back through `handle_event` when it fires.
//!
//! Two implementations are provided:
//!
//! - [`ManualTimer`] - a virtual clock advanced explicitly; used by tests and
//!   by hosts that drive their own event loop
//! - [`TokioTimer`] - real timers that post wakeups into the runtime channel

mod manual;
mod tokio_timer;

pub use manual::ManualTimer;
pub use tokio_timer::TokioTimer;

use std::fmt;
use std::time::{Duration, Instant};

use crate::event::Wakeup;

/// Handle for a scheduled wakeup, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Schedules wakeups and reports the current time.
///
/// Implementations are cheap handles; clones share the same clock.
pub trait Timer: Send + Sync {
    /// Current time on this timer's clock.
    fn now(&self) -> Instant;

    /// Deliver `wakeup` once `delay` has elapsed.
    fn after(&self, delay: Duration, wakeup: Wakeup) -> TimerId;

    /// Cancel a pending wakeup. Cancelling one that already fired is a no-op.
    fn cancel(&self, id: TimerId);
}
