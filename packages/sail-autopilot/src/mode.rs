//! mode.rs — Sailing mode classification
//!
//! The regime for a leg comes from the angle between the true wind and the
//! leg line. Wind from well astern of the leg is a run, wind on the beam is a
//! reach, anything closer to the bow has to be beaten into.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::wrap_degrees;
use crate::waypoints::Waypoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavigationMode {
    /// Wind from aft of the leg; gybe down the leg line
    Running,
    /// Wind across the leg; steer straight at the mark
    Reaching,
    /// Wind forward of the leg; tack up the leg line
    Beating,
}

impl fmt::Display for NavigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NavigationMode::Running => "running",
            NavigationMode::Reaching => "reaching",
            NavigationMode::Beating => "beating",
        };
        f.write_str(s)
    }
}

/// Lower bounds (inclusive) on the wind/leg angle for each regime, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeThresholds {
    pub running_deg: f64,
    pub reaching_deg: f64,
}

impl Default for ModeThresholds {
    fn default() -> Self {
        Self { running_deg: 125.0, reaching_deg: 55.0 }
    }
}

impl ModeThresholds {
    /// Regime for a wind/leg angle in [0, 180].
    pub fn mode_for(&self, diff_angle: f64) -> NavigationMode {
        if diff_angle >= self.running_deg {
            NavigationMode::Running
        } else if diff_angle >= self.reaching_deg {
            NavigationMode::Reaching
        } else {
            NavigationMode::Beating
        }
    }

    /// Classify the leg `prev → current` against the true wind direction.
    pub fn classify(&self, prev: &Waypoint, current: &Waypoint, true_wind_direction: f64) -> NavigationMode {
        let leg = prev.position.distance_heading_to(&current.position);
        let diff_angle = wrap_degrees(true_wind_direction - leg.heading).abs();
        self.mode_for(diff_angle)
    }
}

/// Classify with the default thresholds.
pub fn classify(prev: &Waypoint, current: &Waypoint, true_wind_direction: f64) -> NavigationMode {
    ModeThresholds::default().classify(prev, current, true_wind_direction)
}
