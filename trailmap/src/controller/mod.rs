//! Tile provider fallback controller.
//!
//! Keeps the map showing tiles when providers fail. Errors are counted per
//! provider; once a provider exceeds its tolerance the controller waits a
//! role-dependent delay and moves to the next one. When the list is
//! exhausted it switches to locally synthesized tiles for good.
//!
//! # State Machine
//!
//! ```text
//! Idle --start--> Loading(0)
//! Loading(i) --tile loaded--> Ready(i)
//! Loading(i) | Ready(i) --errors > tolerance--> Switching{i, i+1}
//! Loading(i) | Ready(i) --errors > tolerance, no next--> Offline
//! Switching{i, j} --switch delay--> Loading(j)
//! Switching{i, j} --switch delay, j is offline--> Offline
//! Loading(i) --load timeout--> counted as one error, watchdog re-armed
//! ```
//!
//! # Stale events
//!
//! Every activation bumps the provider [`Generation`]. Tile events and
//! wakeups carry the generation they were issued under; anything that does
//! not match the current one belongs to an abandoned provider and is dropped.

mod config;
mod state;

pub use config::{
    ControllerConfig, ControllerConfigError, DEFAULT_BACKUP_SWITCH_DELAY,
    DEFAULT_ERROR_SUPPRESSION, DEFAULT_PRIMARY_SWITCH_DELAY,
};
pub use state::{ControllerState, ProviderState};

use std::sync::Arc;
use std::time::Duration;

use crate::coord::GeoBounds;
use crate::event::{Generation, TileEvent, Wakeup};
use crate::map::{LayerSource, TileLayer};
use crate::provider::{ProviderRegistry, ProviderRole, TileProvider};
use crate::timer::{Timer, TimerId};

/// Input to [`TileProviderController::handle_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    Tile(TileEvent),
    Wakeup(Wakeup),
}

impl From<TileEvent> for ControllerEvent {
    fn from(event: TileEvent) -> Self {
        ControllerEvent::Tile(event)
    }
}

impl From<Wakeup> for ControllerEvent {
    fn from(wakeup: Wakeup) -> Self {
        ControllerEvent::Wakeup(wakeup)
    }
}

/// Why an event did not change anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `start` has not been called.
    NotStarted,
    /// `start` was called twice.
    AlreadyStarted,
    /// Issued under an older provider generation.
    Stale,
    /// Failed URL already counted within the suppression window.
    Suppressed,
    /// A switch is already scheduled; the outgoing provider's events no
    /// longer matter.
    Switching,
    /// The controller is offline and accepts nothing.
    Terminal,
    /// The wakeup belongs to another component.
    Unrelated,
}

/// What an event did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Ignored(IgnoreReason),
    /// A tile loaded; the provider is ready and its error count is zero.
    Ready { index: usize },
    /// An error was counted and is still within tolerance.
    ErrorCounted {
        index: usize,
        error_count: u32,
        tolerance: u32,
    },
    /// Tolerance exceeded; the next provider activates after `delay`.
    SwitchScheduled {
        from: usize,
        to: usize,
        delay: Duration,
    },
    /// A network provider was loaded.
    Activated {
        index: usize,
        generation: Generation,
    },
    /// Every provider failed; fallback tiles are loaded.
    Offline,
}

impl Transition {
    /// True if this transition put the controller into `Offline`.
    pub fn is_offline(&self) -> bool {
        matches!(self, Transition::Offline)
    }
}

/// Drives the provider fallback chain.
///
/// Owns the map's tile layer and talks to it only through [`TileLayer`].
/// Nothing here returns an error: failures are the normal input of this
/// state machine.
pub struct TileProviderController {
    registry: ProviderRegistry,
    config: ControllerConfig,
    layer: Box<dyn TileLayer>,
    timer: Arc<dyn Timer>,

    state: ControllerState,
    provider: ProviderState,

    /// Whether the layer currently holds a loaded source.
    layer_loaded: bool,

    switch_timer: Option<TimerId>,
    watchdog: Option<TimerId>,
}

impl TileProviderController {
    pub fn new(
        registry: ProviderRegistry,
        config: ControllerConfig,
        layer: Box<dyn TileLayer>,
        timer: Arc<dyn Timer>,
    ) -> Self {
        Self {
            registry,
            config,
            layer,
            timer,
            state: ControllerState::Idle,
            provider: ProviderState::default(),
            layer_loaded: false,
            switch_timer: None,
            watchdog: None,
        }
    }

    /// Activate the first provider.
    pub fn start(&mut self) -> Transition {
        if self.state != ControllerState::Idle {
            return Transition::Ignored(IgnoreReason::AlreadyStarted);
        }
        self.activate(0)
    }

    /// Feed one event through the state machine.
    pub fn handle_event(&mut self, event: impl Into<ControllerEvent>) -> Transition {
        match event.into() {
            ControllerEvent::Tile(event) => self.on_tile(&event),
            ControllerEvent::Wakeup(wakeup) => self.on_wakeup(wakeup),
        }
    }

    /// Ask the active network layer to warm tiles inside `bounds`.
    ///
    /// Returns `false` when no network provider is active.
    pub fn preload(&mut self, bounds: GeoBounds) -> bool {
        match self.state {
            ControllerState::Loading(_) | ControllerState::Ready(_) => {
                self.layer.preload(bounds);
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn provider_state(&self) -> &ProviderState {
        &self.provider
    }

    pub fn is_ready(&self) -> bool {
        self.provider.is_ready
    }

    pub fn is_offline(&self) -> bool {
        self.state.is_offline()
    }

    pub fn current_provider_index(&self) -> usize {
        self.provider.current_index
    }

    /// The provider currently serving tiles, if a network provider is active.
    pub fn current_provider(&self) -> Option<&TileProvider> {
        match self.state {
            ControllerState::Loading(i) | ControllerState::Ready(i) => self.registry.get(i).ok(),
            _ => None,
        }
    }

    pub fn error_count(&self) -> u32 {
        self.provider.error_count
    }

    pub fn generation(&self) -> Generation {
        self.provider.generation
    }

    pub fn tile_layer_active(&self) -> bool {
        self.layer_loaded
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// One-line status for logs and the CLI.
    pub fn display_status(&self) -> String {
        let name = self
            .registry
            .get(self.provider.current_index)
            .map(|p| p.name.as_str())
            .unwrap_or("-");
        format!(
            "{} provider={} errors={} ready={} {}",
            self.state, name, self.provider.error_count, self.provider.is_ready, self.provider.generation
        )
    }

    fn on_tile(&mut self, event: &TileEvent) -> Transition {
        let index = match self.state {
            ControllerState::Offline => return Transition::Ignored(IgnoreReason::Terminal),
            ControllerState::Idle => return Transition::Ignored(IgnoreReason::NotStarted),
            _ if event.generation() != self.provider.generation => {
                tracing::debug!(
                    url = event.url(),
                    event_generation = %event.generation(),
                    current_generation = %self.provider.generation,
                    "Ignoring tile event from abandoned provider"
                );
                return Transition::Ignored(IgnoreReason::Stale);
            }
            ControllerState::Switching { .. } => {
                return Transition::Ignored(IgnoreReason::Switching)
            }
            ControllerState::Loading(i) | ControllerState::Ready(i) => i,
        };

        match event {
            TileEvent::Loaded { .. } => self.on_success(index),
            TileEvent::Failed { url, .. } => self.on_error(index, Some(url)),
        }
    }

    fn on_wakeup(&mut self, wakeup: Wakeup) -> Transition {
        let generation = match wakeup {
            Wakeup::SwitchProvider { generation } | Wakeup::LoadTimeout { generation } => {
                generation
            }
            Wakeup::ViewportSettled { .. } | Wakeup::Preload { .. } => {
                return Transition::Ignored(IgnoreReason::Unrelated)
            }
        };

        if self.state.is_offline() {
            return Transition::Ignored(IgnoreReason::Terminal);
        }
        if generation != self.provider.generation {
            tracing::debug!(?wakeup, current_generation = %self.provider.generation, "Ignoring stale wakeup");
            return Transition::Ignored(IgnoreReason::Stale);
        }

        match (wakeup, self.state) {
            (Wakeup::SwitchProvider { .. }, ControllerState::Switching { to, .. }) => {
                self.switch_timer = None;
                self.activate(to)
            }
            (Wakeup::LoadTimeout { .. }, ControllerState::Loading(i)) => {
                self.watchdog = None;
                tracing::warn!(index = i, "Tile provider timed out without loading a tile");
                let transition = self.on_error(i, None);
                if self.state == ControllerState::Loading(i) {
                    self.arm_watchdog(i);
                }
                transition
            }
            _ => Transition::Ignored(IgnoreReason::Stale),
        }
    }

    fn on_success(&mut self, index: usize) -> Transition {
        self.cancel_watchdog();
        self.provider.error_count = 0;
        self.provider.temporary_error_urls.clear();
        if !self.provider.is_ready {
            tracing::info!(
                index,
                provider = self.provider_name(index),
                "Tile provider ready"
            );
        }
        self.provider.is_ready = true;
        self.state = ControllerState::Ready(index);
        Transition::Ready { index }
    }

    /// Count one failure. `url` is `None` for implicit errors, which bypass
    /// suppression. A counted tile error disarms the load watchdog.
    fn on_error(&mut self, index: usize, url: Option<&str>) -> Transition {
        if let Some(url) = url {
            let now = self.timer.now();
            if !self
                .provider
                .register_error_url(url, now, self.config.error_suppression)
            {
                tracing::debug!(url, "Tile error already counted, suppressing");
                return Transition::Ignored(IgnoreReason::Suppressed);
            }
            // The provider answered, so it is no longer silent.
            self.cancel_watchdog();
        }

        self.provider.error_count += 1;
        let error_count = self.provider.error_count;
        let tolerance = self
            .registry
            .get(index)
            .map(|p| p.error_tolerance)
            .unwrap_or(0);

        if error_count <= tolerance {
            tracing::debug!(index, error_count, tolerance, "Tile error counted");
            return Transition::ErrorCounted {
                index,
                error_count,
                tolerance,
            };
        }

        tracing::warn!(
            index,
            provider = self.provider_name(index),
            error_count,
            tolerance,
            "Tile provider exceeded error tolerance"
        );
        self.begin_switch(index)
    }

    fn begin_switch(&mut self, from: usize) -> Transition {
        self.cancel_watchdog();

        let to = from + 1;
        if to >= self.registry.len() {
            return self.enter_offline();
        }

        self.state = ControllerState::Switching { from, to };
        let delay = self.switch_delay(from);
        if delay.is_zero() {
            return self.activate(to);
        }

        self.switch_timer = Some(self.timer.after(
            delay,
            Wakeup::SwitchProvider {
                generation: self.provider.generation,
            },
        ));
        tracing::info!(
            from = self.provider_name(from),
            to = self.provider_name(to),
            delay_ms = delay.as_millis() as u64,
            "Switching tile provider"
        );
        Transition::SwitchScheduled { from, to, delay }
    }

    fn activate(&mut self, index: usize) -> Transition {
        self.cancel_timers();
        self.unload_layer();
        self.provider.reset_for(index);

        let provider = match self.registry.get(index) {
            Ok(provider) => provider,
            Err(e) => {
                tracing::warn!(error = %e, "No provider to activate");
                return self.enter_offline();
            }
        };
        if provider.is_offline() {
            return self.enter_offline();
        }

        let generation = self.provider.generation;
        tracing::info!(
            index,
            provider = %provider.name,
            role = %provider.role,
            %generation,
            "Activating tile provider"
        );
        self.layer.load(LayerSource::Network {
            provider,
            generation,
        });
        self.layer_loaded = true;
        self.state = ControllerState::Loading(index);
        self.arm_watchdog(index);

        Transition::Activated { index, generation }
    }

    fn enter_offline(&mut self) -> Transition {
        self.cancel_timers();
        self.unload_layer();
        self.layer.load(LayerSource::Fallback);
        self.layer_loaded = true;
        self.provider.is_ready = false;
        self.state = ControllerState::Offline;
        tracing::warn!(
            providers = self.registry.len(),
            "All tile providers failed, using offline tiles"
        );
        Transition::Offline
    }

    fn switch_delay(&self, from: usize) -> Duration {
        match self.registry.get(from).map(|p| p.role) {
            Ok(ProviderRole::Primary) => self.config.primary_switch_delay,
            _ => self.config.backup_switch_delay,
        }
    }

    fn arm_watchdog(&mut self, index: usize) {
        let timeout = match self.registry.get(index) {
            Ok(provider) if !provider.timeout.is_zero() => provider.timeout,
            _ => return,
        };
        self.watchdog = Some(self.timer.after(
            timeout,
            Wakeup::LoadTimeout {
                generation: self.provider.generation,
            },
        ));
    }

    fn cancel_watchdog(&mut self) {
        if let Some(id) = self.watchdog.take() {
            self.timer.cancel(id);
        }
    }

    fn cancel_timers(&mut self) {
        self.cancel_watchdog();
        if let Some(id) = self.switch_timer.take() {
            self.timer.cancel(id);
        }
    }

    fn unload_layer(&mut self) {
        if self.layer_loaded {
            self.layer.unload();
            self.layer_loaded = false;
        }
    }

    fn provider_name(&self, index: usize) -> &str {
        self.registry
            .get(index)
            .map(|p| p.name.as_str())
            .unwrap_or("-")
    }
}
