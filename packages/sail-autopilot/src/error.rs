//! Errors raised by the autopilot core.

use crate::mode::NavigationMode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AutopilotError {
    /// A route needs at least one waypoint.
    #[error("route has no waypoints")]
    EmptyRoute,

    /// Sequential advance requested with no waypoint left to advance to.
    #[error("route of {len} waypoints is already complete")]
    IndexExhausted { len: usize },

    /// A tacking regime was evaluated without a tack side to steer toward.
    #[error("tack memory unset for {0} mode")]
    UnsetTackMemory(NavigationMode),

    #[error("invalid contest: {0}")]
    InvalidContest(String),
}
