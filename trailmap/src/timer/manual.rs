//! Virtual clock for deterministic scheduling.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{Timer, TimerId};
use crate::event::Wakeup;

#[derive(Debug)]
struct ManualTimerInner {
    origin: Instant,
    elapsed: Duration,
    next_id: u64,
    /// Pending wakeups keyed by (due offset, id) so equal deadlines fire in
    /// scheduling order.
    pending: BTreeMap<(Duration, u64), Wakeup>,
    due_by_id: HashMap<u64, Duration>,
}

/// A timer whose clock only moves when told to.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use trailmap::event::Wakeup;
/// use trailmap::timer::{ManualTimer, Timer};
///
/// let timer = ManualTimer::new();
/// timer.after(Duration::from_millis(50), Wakeup::ViewportSettled { seq: 1 });
///
/// let mut fired = Vec::new();
/// timer.run_for(Duration::from_millis(49), |w| fired.push(w));
/// assert!(fired.is_empty());
///
/// timer.run_for(Duration::from_millis(1), |w| fired.push(w));
/// assert_eq!(fired, vec![Wakeup::ViewportSettled { seq: 1 }]);
/// ```
#[derive(Debug, Clone)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualTimerInner>>,
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTimer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualTimerInner {
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                next_id: 0,
                pending: BTreeMap::new(),
                due_by_id: HashMap::new(),
            })),
        }
    }

    /// Time elapsed on the virtual clock since creation.
    pub fn elapsed(&self) -> Duration {
        self.inner.lock().elapsed
    }

    /// Number of wakeups scheduled and not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Advance the clock by `by`, handing every wakeup that falls due to
    /// `deliver` in deadline order.
    ///
    /// Wakeups scheduled from inside `deliver` are honoured if they fall due
    /// before the end of the window.
    pub fn run_for<F>(&self, by: Duration, mut deliver: F)
    where
        F: FnMut(Wakeup),
    {
        let target = self.inner.lock().elapsed + by;

        loop {
            // The lock is released before delivering so `deliver` may
            // schedule or cancel timers.
            let next = {
                let mut inner = self.inner.lock();
                let due = inner.pending.keys().next().copied();
                match due {
                    Some(key) if key.0 <= target => {
                        let wakeup = inner.pending.remove(&key);
                        inner.due_by_id.remove(&key.1);
                        inner.elapsed = inner.elapsed.max(key.0);
                        wakeup
                    }
                    _ => None,
                }
            };

            match next {
                Some(wakeup) => deliver(wakeup),
                None => break,
            }
        }

        self.inner.lock().elapsed = target;
    }

    /// Advance the clock and collect the wakeups that fell due.
    pub fn advance(&self, by: Duration) -> Vec<Wakeup> {
        let mut fired = Vec::new();
        self.run_for(by, |w| fired.push(w));
        fired
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> Instant {
        let inner = self.inner.lock();
        inner.origin + inner.elapsed
    }

    fn after(&self, delay: Duration, wakeup: Wakeup) -> TimerId {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        let due = inner.elapsed + delay;
        inner.pending.insert((due, id), wakeup);
        inner.due_by_id.insert(id, due);
        TimerId::new(id)
    }

    fn cancel(&self, id: TimerId) {
        let mut inner = self.inner.lock();
        if let Some(due) = inner.due_by_id.remove(&id.0) {
            inner.pending.remove(&(due, id.0));
        }
    }
}
