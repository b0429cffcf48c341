//! Wall-clock timer backed by the tokio runtime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::{Timer, TimerId};
use crate::event::{MapEvent, Wakeup};

#[derive(Debug, Default)]
struct TokioTimerInner {
    next_id: u64,
    tokens: HashMap<TimerId, CancellationToken>,
}

/// Timer that sleeps on the tokio clock and posts [`MapEvent::Timer`] back
/// into the session's event channel.
///
/// `after` spawns a task, so it must be called from within a tokio runtime.
/// Every timer is a child of `shutdown`; cancelling that token drops all
/// pending wakeups at once.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    events: UnboundedSender<MapEvent>,
    shutdown: CancellationToken,
    inner: Arc<Mutex<TokioTimerInner>>,
}

impl TokioTimer {
    pub fn new(events: UnboundedSender<MapEvent>, shutdown: CancellationToken) -> Self {
        Self {
            events,
            shutdown,
            inner: Arc::new(Mutex::new(TokioTimerInner::default())),
        }
    }

    /// Number of wakeups scheduled and not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.inner.lock().tokens.len()
    }
}

impl Timer for TokioTimer {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn after(&self, delay: Duration, wakeup: Wakeup) -> TimerId {
        let token = self.shutdown.child_token();
        let id = {
            let mut inner = self.inner.lock();
            let id = TimerId::new(inner.next_id);
            inner.next_id += 1;
            inner.tokens.insert(id, token.clone());
            id
        };

        let events = self.events.clone();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    inner.lock().tokens.remove(&id);
                    if events.send(MapEvent::Timer(wakeup)).is_err() {
                        tracing::trace!(%id, "Timer fired after session closed");
                    }
                }
            }
        });

        id
    }

    fn cancel(&self, id: TimerId) {
        if let Some(token) = self.inner.lock().tokens.remove(&id) {
            token.cancel();
        }
    }
}
