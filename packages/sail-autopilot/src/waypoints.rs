//! waypoints.rs — Waypoint progress tracking
//!
//! Owns the ordered route and the pointer to the active leg. A leg is the
//! line from the previous waypoint to the current one; the previous of the
//! first waypoint is the last one, so the opening leg closes the loop.
//!
//! Progress is a small state machine: `InProgress(index)` until a sequential
//! advance steps past the final waypoint, then `Completed` for good.

use serde::Serialize;
use tracing::{debug, info};

use sail_types::{LegType, WaypointRecord};

use crate::error::AutopilotError;
use crate::geo::Position;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub position: Position,
    /// Arrival tolerance, meters
    pub radius: f64,
    pub leg_type: LegType,
    /// Set only by the tracker when the waypoint is left behind
    pub achieved: bool,
}

impl Waypoint {
    pub fn new(position: Position, radius: f64) -> Self {
        Self { position, radius, leg_type: LegType::default(), achieved: false }
    }

    pub fn with_type(mut self, leg_type: LegType) -> Self {
        self.leg_type = leg_type;
        self
    }
}

impl From<&WaypointRecord> for Waypoint {
    fn from(r: &WaypointRecord) -> Self {
        Self {
            position: Position::new(r.latitude, r.longitude),
            radius: r.radius,
            leg_type: r.leg_type.clone(),
            achieved: r.achieved,
        }
    }
}

/// Where the boat stands against the current waypoint. Recomputed on every
/// query, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegStatus {
    /// Meters to the current waypoint
    pub distance: f64,
    /// Bearing to the current waypoint, degrees
    pub heading: f64,
    /// `distance < radius`
    pub achieved: bool,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Progress {
    InProgress(usize),
    Completed,
}

// ── Tracker ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WaypointTracker {
    waypoints: Vec<Waypoint>,
    progress: Progress,
}

impl WaypointTracker {
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, AutopilotError> {
        if waypoints.is_empty() {
            return Err(AutopilotError::EmptyRoute);
        }
        Ok(Self { waypoints, progress: Progress::InProgress(0) })
    }

    pub fn from_records(records: &[WaypointRecord]) -> Result<Self, AutopilotError> {
        Self::new(records.iter().map(Waypoint::from).collect())
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn is_completed(&self) -> bool {
        self.progress == Progress::Completed
    }

    /// Index of the current waypoint. Stays on the final waypoint once the
    /// route is complete.
    pub fn index(&self) -> usize {
        match self.progress {
            Progress::InProgress(i) => i,
            Progress::Completed => self.waypoints.len() - 1,
        }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn current(&self) -> &Waypoint {
        &self.waypoints[self.index()]
    }

    /// The waypoint the current leg starts from. Wraps to the last waypoint
    /// when the current one is the first.
    pub fn previous(&self) -> &Waypoint {
        let i = self.index();
        let prev = if i == 0 { self.waypoints.len() - 1 } else { i - 1 };
        &self.waypoints[prev]
    }

    /// Distance and bearing from `pos` to the current waypoint.
    pub fn status(&self, pos: &Position) -> LegStatus {
        let wp = self.current();
        let course = pos.distance_heading_to(&wp.position);
        LegStatus {
            distance: course.distance,
            heading: course.heading,
            achieved: course.distance < wp.radius,
            radius: wp.radius,
        }
    }

    /// Mark the current waypoint achieved and move to the next one in route
    /// order. On the final waypoint the route becomes `Completed` and
    /// `IndexExhausted` is returned.
    pub fn advance_sequential(&mut self, pos: &Position) -> Result<LegStatus, AutopilotError> {
        let i = match self.progress {
            Progress::InProgress(i) => i,
            Progress::Completed => {
                return Err(AutopilotError::IndexExhausted { len: self.waypoints.len() })
            }
        };
        self.waypoints[i].achieved = true;

        if i + 1 >= self.waypoints.len() {
            self.progress = Progress::Completed;
            info!("Route complete: final waypoint {i} achieved");
            return Err(AutopilotError::IndexExhausted { len: self.waypoints.len() });
        }

        self.progress = Progress::InProgress(i + 1);
        let status = self.status(pos);
        info!("Waypoint {i} achieved, next {} at {:.1}m", i + 1, status.distance);
        Ok(status)
    }

    /// Mark the current waypoint achieved and jump to whichever waypoint is
    /// nearest `pos`, achieved or not. Ties go to the lowest index.
    pub fn advance_nearest(&mut self, pos: &Position) -> Result<LegStatus, AutopilotError> {
        let i = match self.progress {
            Progress::InProgress(i) => i,
            Progress::Completed => {
                return Err(AutopilotError::IndexExhausted { len: self.waypoints.len() })
            }
        };
        self.waypoints[i].achieved = true;

        let mut nearest = 0;
        let mut min_dist = f64::INFINITY;
        for (j, wp) in self.waypoints.iter().enumerate() {
            let d = wp.position.distance_to(pos);
            if d < min_dist {
                min_dist = d;
                nearest = j;
            }
        }

        self.progress = Progress::InProgress(nearest);
        let status = self.status(pos);
        if nearest == i {
            debug!("Waypoint {i} re-selected as nearest at {:.1}m", status.distance);
        } else {
            info!("Waypoint {i} achieved, nearest is {nearest} at {:.1}m", status.distance);
        }
        Ok(status)
    }
}
