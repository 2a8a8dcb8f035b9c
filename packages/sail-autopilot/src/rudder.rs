//! Rudder mapping: a saturating proportional turn rate shaped through a sine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RudderConfig {
    /// Turn rate per degree of heading error
    pub gain: f64,
    /// Turn rate saturation, degrees
    pub max_turn_deg: f64,
}

impl Default for RudderConfig {
    fn default() -> Self {
        Self { gain: 2.0, max_turn_deg: 90.0 }
    }
}

impl RudderConfig {
    /// Rudder deflection in [-1, 1] for a desired relative heading (degrees).
    /// NaN in, NaN out.
    pub fn rudder_for(&self, desired_relative_heading: f64) -> f64 {
        let turn_rate = (self.gain * desired_relative_heading).clamp(-self.max_turn_deg, self.max_turn_deg);
        turn_rate.to_radians().sin()
    }
}

/// Rudder deflection with the default gain of 2 and ±90° saturation.
pub fn map_to_rudder(desired_relative_heading: f64) -> f64 {
    RudderConfig::default().rudder_for(desired_relative_heading)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_error_centres_rudder() {
        assert_eq!(map_to_rudder(0.0), 0.0);
    }

    #[test]
    fn test_saturates_at_45_degrees() {
        assert!((map_to_rudder(45.0) - 1.0).abs() < 1e-12);
        assert!((map_to_rudder(145.0) - 1.0).abs() < 1e-12);
        assert!((map_to_rudder(-60.0) + 1.0).abs() < 1e-12);
        assert!((map_to_rudder(1e9) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_proportional_region() {
        // 15° error -> 30° turn -> sin(30°) = 0.5
        assert!((map_to_rudder(15.0) - 0.5).abs() < 1e-12);
        assert!((map_to_rudder(-15.0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_output_bounded_for_any_finite_input() {
        let mut x = -10_000.0;
        while x <= 10_000.0 {
            let r = map_to_rudder(x);
            assert!((-1.0..=1.0).contains(&r), "{x} -> {r}");
            x += 7.3;
        }
    }

    #[test]
    fn test_nan_propagates() {
        assert!(map_to_rudder(f64::NAN).is_nan());
    }

    #[test]
    fn test_custom_gain() {
        let cfg = RudderConfig { gain: 1.0, max_turn_deg: 30.0 };
        assert!((cfg.rudder_for(90.0) - 0.5).abs() < 1e-12);
    }
}
