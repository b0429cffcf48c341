//! Controller state.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::event::Generation;

/// Where the controller is in the provider fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// `start` has not been called yet.
    Idle,
    /// Provider `i` is loaded and no tile has arrived yet.
    Loading(usize),
    /// Provider `i` has delivered at least one tile.
    Ready(usize),
    /// Provider `from` exceeded its tolerance; `to` activates when the
    /// switch delay elapses.
    Switching { from: usize, to: usize },
    /// Every provider failed; synthesized tiles are shown. Terminal.
    Offline,
}

impl ControllerState {
    /// Index of the provider whose events are being counted, if any.
    pub fn active_index(&self) -> Option<usize> {
        match self {
            ControllerState::Loading(i) | ControllerState::Ready(i) => Some(*i),
            ControllerState::Switching { from, .. } => Some(*from),
            ControllerState::Idle | ControllerState::Offline => None,
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, ControllerState::Offline)
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Idle => write!(f, "idle"),
            ControllerState::Loading(i) => write!(f, "loading({i})"),
            ControllerState::Ready(i) => write!(f, "ready({i})"),
            ControllerState::Switching { from, to } => write!(f, "switching({from}->{to})"),
            ControllerState::Offline => write!(f, "offline"),
        }
    }
}

/// Mutable bookkeeping for the active provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderState {
    pub current_index: usize,

    /// Distinct failures since the last success or switch.
    pub error_count: u32,

    /// True once the active provider delivered a tile.
    pub is_ready: bool,

    /// Failed URLs and when their suppression expires.
    pub temporary_error_urls: HashMap<String, Instant>,

    /// Bumped on every provider activation.
    pub generation: Generation,
}

impl ProviderState {
    /// Register a failed URL.
    ///
    /// Returns `false` if the URL is still inside its suppression window and
    /// must not be counted again. Expired entries are pruned first.
    pub fn register_error_url(&mut self, url: &str, now: Instant, window: Duration) -> bool {
        self.temporary_error_urls.retain(|_, expiry| *expiry > now);
        if window.is_zero() {
            return true;
        }
        if self.temporary_error_urls.contains_key(url) {
            return false;
        }
        self.temporary_error_urls.insert(url.to_string(), now + window);
        true
    }

    /// Reset for a freshly activated provider.
    pub fn reset_for(&mut self, index: usize) {
        self.current_index = index;
        self.error_count = 0;
        self.is_ready = false;
        self.temporary_error_urls.clear();
        self.generation = self.generation.next();
    }
}
