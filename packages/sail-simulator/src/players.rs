//! players.rs — Who steers the simulated boat
//!
//! `autopilot` runs the decision core each tick. `remote` replays the last
//! rudder value sent from the control panel, the way a radio-control
//! transmitter holds its stick position between updates.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use sail_autopilot::{Autopilot, Player};
use sail_types::{Command, Telemetry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerKind {
    #[default]
    Autopilot,
    Remote,
}

// ── Remote control ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RemoteControl {
    rudder: f64,
    sail: f64,
}

impl RemoteControl {
    pub fn new(sail: f64) -> Self {
        Self { rudder: 0.0, sail }
    }

    /// Non-finite input centres the rudder.
    pub fn set_rudder(&mut self, rudder: f64) {
        self.rudder = if rudder.is_finite() { rudder.clamp(-1.0, 1.0) } else { 0.0 };
    }

    pub fn rudder(&self) -> f64 {
        self.rudder
    }
}

impl Player for RemoteControl {
    fn name(&self) -> &str {
        "remote"
    }

    fn ai(&mut self, _telemetry: &Telemetry) -> Command {
        Command::steer(self.rudder, self.sail)
    }
}

// ── Pilot ─────────────────────────────────────────────────────────────────────

/// The active player for the one simulated boat.
pub enum Pilot {
    Auto(Box<Autopilot>),
    Remote(RemoteControl),
}

impl Pilot {
    pub fn kind(&self) -> PlayerKind {
        match self {
            Pilot::Auto(_) => PlayerKind::Autopilot,
            Pilot::Remote(_) => PlayerKind::Remote,
        }
    }

    /// Forward a control-panel rudder value. Ignored under autopilot.
    pub fn set_rudder(&mut self, rudder: f64) -> bool {
        match self {
            Pilot::Remote(rc) => {
                rc.set_rudder(rudder);
                info!("🎮 Remote rudder {:.2}", rc.rudder());
                true
            }
            Pilot::Auto(_) => false,
        }
    }

    /// Progress snapshot for the control panel.
    pub fn status(&self) -> serde_json::Value {
        match self {
            Pilot::Auto(ap) => serde_json::json!({
                "player":   self.kind(),
                "leg":      ap.tracker().index(),
                "legs":     ap.tracker().len(),
                "mode":     ap.mode(),
                "tack":     ap.tack_memory(),
                "finished": ap.is_finished(),
            }),
            Pilot::Remote(rc) => serde_json::json!({
                "player": self.kind(),
                "rudder": rc.rudder(),
            }),
        }
    }
}

impl Player for Pilot {
    fn name(&self) -> &str {
        match self {
            Pilot::Auto(ap) => ap.name(),
            Pilot::Remote(rc) => rc.name(),
        }
    }

    fn ai(&mut self, telemetry: &Telemetry) -> Command {
        match self {
            Pilot::Auto(ap) => ap.ai(telemetry),
            Pilot::Remote(rc) => rc.ai(telemetry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_autopilot::{AutopilotConfig, Position, Waypoint, WaypointTracker};

    #[test]
    fn test_remote_holds_last_rudder() {
        let mut p = Pilot::Remote(RemoteControl::new(0.3));
        let t = Telemetry::default();
        assert_eq!(p.ai(&t), Command::steer(0.0, 0.3));
        assert!(p.set_rudder(0.4));
        assert_eq!(p.ai(&t).rudder(), 0.4);
        assert_eq!(p.ai(&t).rudder(), 0.4);
        p.set_rudder(7.0);
        assert_eq!(p.ai(&t).rudder(), 1.0);
        p.set_rudder(f64::NAN);
        assert_eq!(p.ai(&t).rudder(), 0.0);
        assert_eq!(p.name(), "remote");
        assert_eq!(p.kind(), PlayerKind::Remote);
    }

    #[test]
    fn test_autopilot_ignores_panel_rudder() {
        let wps = vec![
            Waypoint::new(Position::new(0.0, 0.0), 5.0),
            Waypoint::new(Position::new(0.01, 0.0), 5.0),
        ];
        let ap = Autopilot::new(WaypointTracker::new(wps).unwrap(), AutopilotConfig::default());
        let mut p = Pilot::Auto(Box::new(ap));
        assert!(!p.set_rudder(1.0));
        assert_eq!(p.name(), "autopilot");

        let status = p.status();
        assert_eq!(status["legs"], 2);
        assert_eq!(status["finished"], false);
        assert!(status["mode"].is_null());
    }
}
