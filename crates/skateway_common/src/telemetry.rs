//! Synthetic ice-condition readings.
//!
//! One `Reading` is fabricated per site per cycle. Numeric fields are drawn
//! uniformly from fixed plausible ranges; the timestamp is wall-clock UTC at
//! second precision. The generator never fails and tolerates being called at
//! sub-second cadence (duplicate timestamps are fine).

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Surface temperature bound, °C
pub const SURFACE_TEMPERATURE_C: (f64, f64) = (-20.0, 0.0);
/// External (air) temperature bound, °C
pub const EXTERNAL_TEMPERATURE_C: (f64, f64) = (-25.0, 0.0);
/// Ice thickness bound, cm
pub const ICE_THICKNESS_CM: (f64, f64) = (10.0, 50.0);
/// Snow accumulation bound, cm
pub const SNOW_ACCUMULATION_CM: (f64, f64) = (0.0, 15.0);

/// Wire timestamp format: UTC ISO-8601, second precision, `Z` suffix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One synthetic telemetry sample for a single site at a single instant.
///
/// The JSON encoding of this struct (camelCase names) is the wire payload;
/// dry-run output prints the same encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub surface_temperature: f64,
    pub external_temperature: f64,
    pub ice_thickness: f64,
    pub snow_accumulation: f64,
    /// Registry key of the site this reading belongs to. Left empty by the
    /// generator; the dispatch loop attaches it.
    pub location: String,
    pub timestamp: String,
}

/// Fabricates readings from a seedable random source.
pub struct TelemetryGenerator {
    rng: StdRng,
}

impl TelemetryGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produce one reading. Cannot fail.
    pub fn generate(&mut self) -> Reading {
        Reading {
            surface_temperature: self
                .rng
                .gen_range(SURFACE_TEMPERATURE_C.0..=SURFACE_TEMPERATURE_C.1),
            external_temperature: self
                .rng
                .gen_range(EXTERNAL_TEMPERATURE_C.0..=EXTERNAL_TEMPERATURE_C.1),
            ice_thickness: self.rng.gen_range(ICE_THICKNESS_CM.0..=ICE_THICKNESS_CM.1),
            snow_accumulation: self
                .rng
                .gen_range(SNOW_ACCUMULATION_CM.0..=SNOW_ACCUMULATION_CM.1),
            location: String::new(),
            timestamp: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl Default for TelemetryGenerator {
    fn default() -> Self {
        Self::new()
    }
}
