//! Offline fallback: placeholder tiles, landmarks and the offline notice.
//!
//! When every network provider has failed, the map switches to
//! locally synthesized tiles. [`FallbackTileSynthesizer::activate`] then pins
//! the Hong Kong landmarks and tells the user, once.

mod landmarks;
mod tile;

pub use landmarks::{Landmark, LandmarkKind, HONG_KONG_LANDMARKS};
pub use tile::{
    error_tile, synthesize_tile, FallbackError, FallbackTile, TileStyle, BORDERED_MAX_ZOOM,
    CHECKER_MAX_ZOOM,
};

use tracing::info;

use crate::map::MapView;
use crate::notify::{Notifier, Severity};

/// Message shown when offline mode starts.
pub const OFFLINE_NOTICE: &str =
    "Using offline map mode. All features work, but some details may be incomplete.";

/// Owns the offline-mode side effects.
///
/// Tile synthesis itself is the free function [`synthesize_tile`]; this type
/// tracks whether landmarks were placed and whether the user was told.
#[derive(Debug, Default)]
pub struct FallbackTileSynthesizer {
    landmarks_placed: bool,
    notified: bool,
}

impl FallbackTileSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Landmarks shown in offline mode.
    pub fn landmarks(&self) -> &'static [Landmark] {
        &HONG_KONG_LANDMARKS
    }

    /// Pin every landmark on `view`. Repeat calls do nothing.
    pub fn place_landmarks(&mut self, view: &mut dyn MapView) {
        if self.landmarks_placed {
            return;
        }
        for landmark in self.landmarks() {
            view.attach_landmark(landmark);
        }
        self.landmarks_placed = true;
    }

    /// Enter offline mode: place landmarks and notify the user the first time.
    ///
    /// Returns `true` if this call performed the activation.
    pub fn activate(&mut self, view: &mut dyn MapView, notifier: &dyn Notifier) -> bool {
        self.place_landmarks(view);
        if self.notified {
            return false;
        }
        self.notified = true;
        info!(landmarks = self.landmarks().len(), "Offline fallback map active");
        notifier.notify(OFFLINE_NOTICE, Severity::Info);
        true
    }

    pub fn is_active(&self) -> bool {
        self.notified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::LatLon;
    use crate::map::HeadlessMap;
    use crate::notify::RecordingNotifier;

    #[test]
    fn test_landmarks() {
        let synthesizer = FallbackTileSynthesizer::new();
        let landmarks = synthesizer.landmarks();
        assert_eq!(landmarks.len(), 5);
        assert_eq!(landmarks[1].name, "Victoria Peak");
        assert_eq!(landmarks[1].position, LatLon::new(22.2711, 114.1492));
        assert_eq!(landmarks[2].kind, LandmarkKind::Airport);
    }

    #[test]
    fn test_place_landmarks_is_idempotent() {
        let mut map = HeadlessMap::new(LatLon::new(22.3, 114.17), 11);
        let mut synthesizer = FallbackTileSynthesizer::new();

        synthesizer.place_landmarks(&mut map);
        synthesizer.place_landmarks(&mut map);

        assert_eq!(map.landmarks().len(), 5);
    }

    #[test]
    fn test_activate_notifies_once() {
        let mut map = HeadlessMap::new(LatLon::new(22.3, 114.17), 11);
        let notifier = RecordingNotifier::new();
        let mut synthesizer = FallbackTileSynthesizer::new();

        assert!(synthesizer.activate(&mut map, &notifier));
        assert!(!synthesizer.activate(&mut map, &notifier));

        assert!(synthesizer.is_active());
        assert_eq!(
            notifier.messages(),
            vec![(OFFLINE_NOTICE.to_string(), Severity::Info)]
        );
        assert_eq!(map.landmarks().len(), 5);
    }
}
