//! # sail-types
//!
//! Shared records exchanged between the sailing robot controller and whatever
//! drives it (the bundled simulator, a hardware bridge, a remote UI).
//!
//! These types are used by:
//! - `sail-autopilot`: consuming per-tick telemetry and producing commands
//! - `sail-simulator`: producing telemetry, applying commands, loading contests
//!
//! ## Conventions
//!
//! - **Angles**: degrees. Absolute headings are 0 = north, clockwise.
//! - **Apparent wind heading**: relative to the boat, wrapped to (-180, 180].
//!   Measured as `boat heading - apparent wind direction`, so steering to
//!   starboard by `d` degrees lowers the value by `d`.
//! - **True wind heading**: the absolute direction the wind blows FROM.
//! - **Wire format**: camelCase JSON, one `Telemetry` per tick in, one
//!   `Command` per tick out.

use serde::{Deserialize, Serialize};

// ── Boat state ────────────────────────────────────────────────────────────────

/// GPS fix (degrees)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Gps {
    pub latitude: f64,
    pub longitude: f64,
}

/// Boat attitude from the IMU (degrees)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    /// Heel, positive = starboard side down
    pub roll: f64,
    pub pitch: f64,
    /// Compass heading, 0 = north
    pub heading: f64,
}

/// Wind as measured on the moving boat
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ApparentWind {
    /// m/s
    pub speed: f64,
    /// Relative to the bow, (-180, 180]
    pub heading: f64,
}

/// Speed over ground (m/s) and course over ground (degrees)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub speed: f64,
    pub direction: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoatState {
    pub gps: Gps,
    pub attitude: Attitude,
    pub apparent_wind: ApparentWind,
    #[serde(default)]
    pub velocity: Velocity,
}

// ── Environment ───────────────────────────────────────────────────────────────

/// Wind relative to the ground
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrueWind {
    /// m/s
    pub speed: f64,
    /// Direction the wind blows from, 0 = north
    pub heading: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub wind: TrueWind,
}

// ── Per-tick telemetry ────────────────────────────────────────────────────────

/// Everything the controller sees on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub boat: BoatState,
    pub environment: Environment,
    /// Seconds since the previous tick
    #[serde(default)]
    pub dt: f64,
    #[serde(default)]
    pub is_simulation: bool,
}

impl Telemetry {
    pub fn true_wind_direction(&self) -> f64 {
        self.environment.wind.heading
    }
}

// ── Outgoing command ──────────────────────────────────────────────────────────

/// Actuator command sent back to the boat once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    Move {
        /// -1.0 (full port) to +1.0 (full starboard)
        servo_rudder: f64,
        servo_sail: f64,
    },
}

impl Command {
    pub fn steer(rudder: f64, sail: f64) -> Self {
        Command::Move { servo_rudder: rudder, servo_sail: sail }
    }

    /// Centred rudder, sail untouched
    pub fn hold(sail: f64) -> Self {
        Command::steer(0.0, sail)
    }

    pub fn rudder(&self) -> f64 {
        match self {
            Command::Move { servo_rudder, .. } => *servo_rudder,
        }
    }

    pub fn sail(&self) -> f64 {
        match self {
            Command::Move { servo_sail, .. } => *servo_sail,
        }
    }
}

// ── Route configuration ───────────────────────────────────────────────────────

/// Leg semantics tag. Opaque to the controller; carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LegType {
    Start,
    #[default]
    Mark,
    Finish,
    Other(String),
}

impl From<String> for LegType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "start" => LegType::Start,
            "mark" => LegType::Mark,
            "finish" => LegType::Finish,
            _ => LegType::Other(s),
        }
    }
}

impl From<LegType> for String {
    fn from(t: LegType) -> Self {
        match t {
            LegType::Start => "start".to_string(),
            LegType::Mark => "mark".to_string(),
            LegType::Finish => "finish".to_string(),
            LegType::Other(s) => s,
        }
    }
}

/// One waypoint as supplied in a contest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Arrival tolerance, meters
    pub radius: f64,
    #[serde(default, rename = "type")]
    pub leg_type: LegType,
    #[serde(default)]
    pub achieved: bool,
}

/// A contest: the route plus the rules it is sailed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contest {
    #[serde(default, rename = "type")]
    pub contest_type: String,
    pub waypoints: Vec<WaypointRecord>,
    /// Seconds, if the contest is timed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<f64>,
}

impl Contest {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
