//! # sail-autopilot
//!
//! Decision core of an autonomous sailboat. Given the boat's position,
//! attitude and wind readings each tick, it picks the route leg to sail,
//! classifies the leg against the true wind and steers it:
//!
//! - **Running** (wind from aft of the leg): gybe down the leg line at 145°
//!   apparent wind angle
//! - **Reaching** (wind across the leg): steer straight at the mark
//! - **Beating** (wind forward of the leg): tack up the leg line at 45°
//!   apparent wind angle
//!
//! In the two tacking regimes a hysteresis band around the leg line keeps the
//! boat from flipping tack sides every tick while it sails close to the line.
//!
//! ## Layout
//!
//! - [`geo`]: positions, bearings, leg-line side and distance
//! - [`waypoints`]: route progress and arrival
//! - [`mode`]: running / reaching / beating classification
//! - [`strategy`]: desired heading per mode, tack memory
//! - [`rudder`]: heading error to rudder deflection
//! - [`controller`]: the per-tick loop tying it together
//!
//! Single-threaded and synchronous: one `Autopilot` per boat, no sharing.

pub mod controller;
pub mod error;
pub mod geo;
pub mod mode;
pub mod rudder;
pub mod strategy;
pub mod waypoints;

pub use controller::{AdvancePolicy, Autopilot, AutopilotConfig, Decision, Player, TickOutcome};
pub use error::AutopilotError;
pub use geo::{wrap_degrees, LineSide, Position};
pub use mode::{classify, ModeThresholds, NavigationMode};
pub use rudder::{map_to_rudder, RudderConfig};
pub use strategy::{HeadingStrategy, StrategyConfig, SteeringInput, TackMemory};
pub use waypoints::{LegStatus, Progress, Waypoint, WaypointTracker};
