//! physics.rs — Wind-driven boat response estimators
//!
//! Empirical fits rather than hydrodynamics:
//! 1. Apparent wind from true wind and boat velocity
//! 2. Roll (heel) from apparent wind speed and angle
//! 3. Boat speed from apparent wind speed, angle and roll
//!
//! Angles in degrees, speeds in m/s. Apparent wind heading uses the
//! `boat heading - apparent wind direction` convention from sail-types.

use sail_autopilot::wrap_degrees;

/// Roll per m/s of beam wind, degrees
const ROLL_COEFF: f64 = -8.365469590752099;
/// Speed fit: |sin(awh) · (B · aws + C) · cos(roll)|
const SPEED_B: f64 = -1.113;
const SPEED_C: f64 = 0.0151;

/// Apparent wind seen on the boat
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Apparent {
    pub speed: f64,
    /// Relative to the bow, (-180, 180]
    pub heading: f64,
}

/// Combine the true wind (blowing FROM `wind_from`) with the boat's motion.
pub fn apparent_wind(wind_from: f64, wind_speed: f64, boat_heading: f64, boat_speed: f64) -> Apparent {
    // Velocity vectors (east, north) of the air and the boat
    let toward = (wind_from + 180.0).to_radians();
    let (wx, wy) = (wind_speed * toward.sin(), wind_speed * toward.cos());
    let h = boat_heading.to_radians();
    let (bx, by) = (boat_speed * h.sin(), boat_speed * h.cos());

    let (ax, ay) = (wx - bx, wy - by);
    let speed = (ax * ax + ay * ay).sqrt();
    if speed == 0.0 {
        return Apparent { speed, heading: 0.0 };
    }
    // Direction the apparent wind comes from
    let from = (-ax).atan2(-ay).to_degrees();
    Apparent { speed, heading: wrap_degrees(boat_heading - from) }
}

/// Estimated roll, degrees.
pub fn estimate_roll(apparent_wind_speed: f64, apparent_wind_heading: f64) -> f64 {
    ROLL_COEFF * apparent_wind_speed * apparent_wind_heading.to_radians().sin()
}

/// Estimated speed through the water, m/s.
pub fn estimate_speed(apparent_wind_speed: f64, apparent_wind_heading: f64, roll: f64) -> f64 {
    (apparent_wind_heading.to_radians().sin()
        * (SPEED_B * apparent_wind_speed + SPEED_C)
        * roll.to_radians().cos())
    .abs()
}
