//! strategy.rs — Heading strategy per sailing mode
//!
//! Reaching steers straight at the mark. Running and beating cannot, so the
//! boat holds a fixed apparent-wind angle on one side of the leg line and
//! swaps sides once it has strayed far enough from the line. The side
//! currently steered toward is the tack memory; it only changes outside a
//! hysteresis band around the line, so the boat does not tack back and forth
//! while sailing along it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AutopilotError;
use crate::geo::{wrap_degrees, LineSide, Position};
use crate::mode::NavigationMode;
use crate::waypoints::{LegStatus, Waypoint};

// ── Tack memory ───────────────────────────────────────────────────────────────

/// Tack side per tacking regime. `None` until the first evaluation on a leg.
/// Owned by the control loop, reset on every leg change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TackMemory {
    pub running: Option<LineSide>,
    pub beating: Option<LineSide>,
}

impl TackMemory {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, mode: NavigationMode) -> Option<LineSide> {
        match mode {
            NavigationMode::Running => self.running,
            NavigationMode::Beating => self.beating,
            NavigationMode::Reaching => None,
        }
    }

    fn slot_mut(&mut self, mode: NavigationMode) -> Option<&mut Option<LineSide>> {
        match mode {
            NavigationMode::Running => Some(&mut self.running),
            NavigationMode::Beating => Some(&mut self.beating),
            NavigationMode::Reaching => None,
        }
    }
}

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Apparent wind angle held while running, degrees
    pub running_awa_deg: f64,
    /// Apparent wind angle held while beating, degrees
    pub beating_awa_deg: f64,
    /// Hysteresis half-width as a fraction of the current waypoint radius
    pub hysteresis_factor: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            running_awa_deg: 145.0,
            beating_awa_deg: 45.0,
            hysteresis_factor: 0.2,
        }
    }
}

// ── Strategy ──────────────────────────────────────────────────────────────────

/// One tick's worth of steering inputs.
#[derive(Debug, Clone, Copy)]
pub struct SteeringInput<'a> {
    pub position: Position,
    pub leg_status: LegStatus,
    pub current: &'a Waypoint,
    pub previous: &'a Waypoint,
    /// Boat compass heading, degrees
    pub boat_heading: f64,
    /// Apparent wind relative to the boat, degrees
    pub apparent_wind_heading: f64,
}

#[derive(Debug, Clone, Default)]
pub struct HeadingStrategy {
    config: StrategyConfig,
}

impl HeadingStrategy {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Desired heading relative to the bow, degrees. Positive is a turn to
    /// starboard.
    pub fn desired_heading(
        &self,
        mode: NavigationMode,
        input: &SteeringInput<'_>,
        memory: &mut TackMemory,
    ) -> Result<f64, AutopilotError> {
        match mode {
            NavigationMode::Reaching => Ok(input.leg_status.heading - input.boat_heading),
            NavigationMode::Running => self.tacking(mode, self.config.running_awa_deg, input, memory),
            NavigationMode::Beating => self.tacking(mode, self.config.beating_awa_deg, input, memory),
        }
    }

    fn tacking(
        &self,
        mode: NavigationMode,
        optimal_awa: f64,
        input: &SteeringInput<'_>,
        memory: &mut TackMemory,
    ) -> Result<f64, AutopilotError> {
        let current = &input.current.position;
        let previous = &input.previous.position;

        let side = input.position.side_of_line(current, previous);
        let band = self.config.hysteresis_factor * input.current.radius;
        let distance_to_line = input.position.distance_to_line(current, previous);

        // Both regimes steer back across the line; with the wind on the
        // other end of the leg the beating sign is flipped.
        let wanted = match mode {
            NavigationMode::Beating => side.opposite(),
            _ => side,
        };

        let slot = memory
            .slot_mut(mode)
            .ok_or(AutopilotError::UnsetTackMemory(mode))?;

        // An unset slot always takes the current side.
        if distance_to_line >= band || slot.is_none() {
            if *slot != Some(wanted) {
                debug!("{mode}: tack side {:?} -> {wanted:?} ({distance_to_line:.1}m off line)", *slot);
            }
            *slot = Some(wanted);
        }

        let q = slot.ok_or(AutopilotError::UnsetTackMemory(mode))?;
        Ok(wrap_degrees(q.sign() * optimal_awa - input.apparent_wind_heading))
    }
}
