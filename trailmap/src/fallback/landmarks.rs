//! Fixed landmarks shown while offline.

use std::fmt;

use serde::Serialize;

use crate::coord::LatLon;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LandmarkKind {
    Harbor,
    Peak,
    Airport,
    Business,
    Tourist,
}

impl LandmarkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkKind::Harbor => "harbor",
            LandmarkKind::Peak => "peak",
            LandmarkKind::Airport => "airport",
            LandmarkKind::Business => "business",
            LandmarkKind::Tourist => "tourist",
        }
    }

    /// Glyph used for the marker icon.
    pub fn glyph(&self) -> &'static str {
        match self {
            LandmarkKind::Harbor => "⚓",
            LandmarkKind::Peak => "⛰️",
            LandmarkKind::Airport => "✈️",
            LandmarkKind::Business => "🏢",
            LandmarkKind::Tourist => "🗼",
        }
    }
}

impl fmt::Display for LandmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named place pinned on the offline map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Landmark {
    pub name: &'static str,
    pub position: LatLon,
    pub kind: LandmarkKind,
}

impl Landmark {
    const fn new(name: &'static str, lat: f64, lon: f64, kind: LandmarkKind) -> Self {
        Self {
            name,
            position: LatLon::new(lat, lon),
            kind,
        }
    }
}

/// Well-known Hong Kong places, so the map stays navigable without tiles.
pub static HONG_KONG_LANDMARKS: [Landmark; 5] = [
    Landmark::new("Victoria Harbour", 22.3193, 114.1694, LandmarkKind::Harbor),
    Landmark::new("Victoria Peak", 22.2711, 114.1492, LandmarkKind::Peak),
    Landmark::new(
        "Hong Kong International Airport",
        22.3080,
        113.9150,
        LandmarkKind::Airport,
    ),
    Landmark::new("Central", 22.2816, 114.1583, LandmarkKind::Business),
    Landmark::new("Tsim Sha Tsui", 22.2974, 114.1722, LandmarkKind::Tourist),
];
