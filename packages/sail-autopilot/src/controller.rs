//! controller.rs — Per-tick control loop
//!
//! `Autopilot` owns everything that persists between ticks for one boat: the
//! waypoint tracker, the cached sailing mode and the tack memory. Each tick
//! runs to completion without blocking:
//!
//!   status → [advance on arrival] → classify (only when unset) → heading
//!   strategy → rudder
//!
//! The mode is chosen once per leg and kept even if the wind shifts. Leg
//! changes clear both the mode and the tack memory.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use sail_types::{Command, Contest, Telemetry};

use crate::error::AutopilotError;
use crate::geo::Position;
use crate::mode::{ModeThresholds, NavigationMode};
use crate::rudder::RudderConfig;
use crate::strategy::{HeadingStrategy, StrategyConfig, SteeringInput, TackMemory};
use crate::waypoints::{LegStatus, WaypointTracker};

// ── Config ────────────────────────────────────────────────────────────────────

/// What to do when the current waypoint is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    /// Next waypoint in route order
    #[default]
    Sequential,
    /// Whichever waypoint is nearest, achieved ones included
    Nearest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    pub mode: ModeThresholds,
    pub strategy: StrategyConfig,
    pub rudder: RudderConfig,
    pub advance: AdvancePolicy,
    /// Sail servo value passed through on every command
    pub sail: f64,
}

// ── Tick output ───────────────────────────────────────────────────────────────

/// Everything decided on one steering tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub command: Command,
    pub mode: NavigationMode,
    pub leg_index: usize,
    pub leg_status: LegStatus,
    /// Relative to the bow, degrees
    pub desired_heading: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Steer(Decision),
    /// Route complete; rudder is centred from here on
    Finished(Command),
}

impl TickOutcome {
    pub fn command(&self) -> Command {
        match self {
            TickOutcome::Steer(d) => d.command,
            TickOutcome::Finished(c) => *c,
        }
    }
}

/// Anything that turns telemetry into a command once per tick.
pub trait Player {
    fn name(&self) -> &str;

    fn ai(&mut self, telemetry: &Telemetry) -> Command;
}

// ── Autopilot ─────────────────────────────────────────────────────────────────

pub struct Autopilot {
    tracker: WaypointTracker,
    strategy: HeadingStrategy,
    config: AutopilotConfig,
    mode: Option<NavigationMode>,
    tack: TackMemory,
    finished: bool,
}

impl Autopilot {
    pub fn new(tracker: WaypointTracker, config: AutopilotConfig) -> Self {
        info!(
            "Autopilot loaded: {} waypoints, {:?} advance",
            tracker.len(),
            config.advance
        );
        Self {
            tracker,
            strategy: HeadingStrategy::new(config.strategy),
            config,
            mode: None,
            tack: TackMemory::default(),
            finished: false,
        }
    }

    /// Build from a contest, rejecting waypoints that cannot be sailed to.
    pub fn from_contest(contest: &Contest, config: AutopilotConfig) -> Result<Self, AutopilotError> {
        for (i, wp) in contest.waypoints.iter().enumerate() {
            if !(wp.radius.is_finite() && wp.radius > 0.0) {
                return Err(AutopilotError::InvalidContest(format!(
                    "waypoint {i} has radius {}",
                    wp.radius
                )));
            }
            if !(wp.latitude.is_finite() && wp.longitude.is_finite()) {
                return Err(AutopilotError::InvalidContest(format!(
                    "waypoint {i} has no usable position"
                )));
            }
        }
        let tracker = WaypointTracker::from_records(&contest.waypoints)?;
        Ok(Self::new(tracker, config))
    }

    pub fn tracker(&self) -> &WaypointTracker {
        &self.tracker
    }

    pub fn config(&self) -> &AutopilotConfig {
        &self.config
    }

    pub fn mode(&self) -> Option<NavigationMode> {
        self.mode
    }

    pub fn tack_memory(&self) -> &TackMemory {
        &self.tack
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn start_leg(&mut self) {
        self.mode = None;
        self.tack.reset();
    }

    /// Run one control evaluation.
    pub fn tick(&mut self, telemetry: &Telemetry) -> Result<TickOutcome, AutopilotError> {
        if self.finished {
            return Ok(TickOutcome::Finished(Command::hold(self.config.sail)));
        }

        let pos = Position::from(telemetry.boat.gps);
        let mut status = self.tracker.status(&pos);

        if status.achieved {
            let advanced = match self.config.advance {
                AdvancePolicy::Sequential => self.tracker.advance_sequential(&pos),
                AdvancePolicy::Nearest => self.tracker.advance_nearest(&pos),
            };
            match advanced {
                Ok(next) => {
                    status = next;
                    self.start_leg();
                }
                Err(AutopilotError::IndexExhausted { len }) => {
                    info!("🏁 All {len} waypoints achieved, holding rudder centred");
                    self.finished = true;
                    self.start_leg();
                    return Ok(TickOutcome::Finished(Command::hold(self.config.sail)));
                }
                Err(e) => return Err(e),
            }
        }

        let mode = match self.mode {
            Some(m) => m,
            None => {
                let m = self.config.mode.classify(
                    self.tracker.previous(),
                    self.tracker.current(),
                    telemetry.true_wind_direction(),
                );
                info!(
                    "Leg {} → mode {m} (true wind {:.0}°)",
                    self.tracker.index(),
                    telemetry.true_wind_direction()
                );
                self.mode = Some(m);
                m
            }
        };

        let input = SteeringInput {
            position: pos,
            leg_status: status,
            current: self.tracker.current(),
            previous: self.tracker.previous(),
            boat_heading: telemetry.boat.attitude.heading,
            apparent_wind_heading: telemetry.boat.apparent_wind.heading,
        };
        let desired_heading = self.strategy.desired_heading(mode, &input, &mut self.tack)?;
        let rudder = self.config.rudder.rudder_for(desired_heading);

        debug!(
            "wp={} d={:.1}m brg={:.0}° mode={mode} want={desired_heading:.1}° rudder={rudder:.2}",
            self.tracker.index(),
            status.distance,
            status.heading
        );

        Ok(TickOutcome::Steer(Decision {
            command: Command::steer(rudder, self.config.sail),
            mode,
            leg_index: self.tracker.index(),
            leg_status: status,
            desired_heading,
        }))
    }
}

impl Player for Autopilot {
    fn name(&self) -> &str {
        "autopilot"
    }

    fn ai(&mut self, telemetry: &Telemetry) -> Command {
        match self.tick(telemetry) {
            Ok(outcome) => outcome.command(),
            Err(e) => {
                warn!("Autopilot tick failed: {e}");
                Command::hold(self.config.sail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::LineSide;
    use crate::waypoints::Waypoint;
    use sail_types::{ApparentWind, Attitude, BoatState, Environment, Gps, TrueWind, WaypointRecord};

    fn telemetry(pos: Position, heading: f64, awh: f64, wind_from: f64) -> Telemetry {
        Telemetry {
            boat: BoatState {
                gps: Gps { latitude: pos.latitude, longitude: pos.longitude },
                attitude: Attitude { roll: 0.0, pitch: 0.0, heading },
                apparent_wind: ApparentWind { speed: 5.0, heading: awh },
                ..Default::default()
            },
            environment: Environment { wind: TrueWind { speed: 5.0, heading: wind_from } },
            dt: 0.1,
            is_simulation: true,
        }
    }

    /// Two waypoints 200 m apart on a northbound line
    fn pilot(config: AutopilotConfig) -> Autopilot {
        let a = Position::new(10.0, 20.0);
        let wps = vec![Waypoint::new(a, 10.0), Waypoint::new(a.offset(200.0, 0.0), 10.0)];
        Autopilot::new(WaypointTracker::new(wps).unwrap(), config)
    }

    #[test]
    fn test_arrival_advances_and_classifies_new_leg() {
        let mut ap = pilot(AutopilotConfig::default());
        let start = ap.tracker().current().position;
        let out = ap.tick(&telemetry(start, 0.0, 180.0, 0.0)).unwrap();
        let TickOutcome::Steer(d) = out else { panic!("expected steering, got {out:?}") };
        assert_eq!(d.leg_index, 1);
        // Wind from the north on a northbound leg
        assert_eq!(d.mode, NavigationMode::Beating);
        assert!(ap.tracker().waypoints()[0].achieved);
    }

    #[test]
    fn test_mode_is_kept_for_whole_leg() {
        let mut ap = pilot(AutopilotConfig::default());
        let start = ap.tracker().current().position;
        let p = start.offset(50.0, 0.0);
        ap.tick(&telemetry(start, 0.0, 0.0, 90.0)).unwrap();
        assert_eq!(ap.mode(), Some(NavigationMode::Reaching));
        // Wind swings dead astern; mode must not follow
        let out = ap.tick(&telemetry(p, 0.0, 0.0, 180.0)).unwrap();
        let TickOutcome::Steer(d) = out else { panic!() };
        assert_eq!(d.mode, NavigationMode::Reaching);
    }

    #[test]
    fn test_leg_change_resets_mode_and_memory() {
        let a = Position::new(0.0, 0.0);
        let wps = vec![
            Waypoint::new(a, 10.0),
            Waypoint::new(a.offset(200.0, 0.0), 10.0),
            Waypoint::new(a.offset(200.0, 200.0), 10.0),
        ];
        let mut ap = Autopilot::new(WaypointTracker::new(wps).unwrap(), AutopilotConfig::default());
        ap.tick(&telemetry(a, 0.0, 0.0, 180.0)).unwrap();
        assert_eq!(ap.mode(), Some(NavigationMode::Running));
        assert!(ap.tack_memory().running.is_some());

        // Arrive at waypoint 1; next leg runs east with the same south wind
        let wp1 = ap.tracker().current().position;
        ap.tick(&telemetry(wp1, 0.0, 0.0, 180.0)).unwrap();
        assert_eq!(ap.tracker().index(), 2);
        assert_eq!(ap.mode(), Some(NavigationMode::Reaching));
        assert_eq!(*ap.tack_memory(), TackMemory::default());
    }

    #[test]
    fn test_finished_route_holds_rudder() {
        let mut ap = pilot(AutopilotConfig { sail: 0.3, ..Default::default() });
        let wp0 = ap.tracker().waypoints()[0].position;
        let wp1 = ap.tracker().waypoints()[1].position;
        ap.tick(&telemetry(wp0, 0.0, 90.0, 0.0)).unwrap();
        let out = ap.tick(&telemetry(wp1, 0.0, 90.0, 0.0)).unwrap();
        assert_eq!(out, TickOutcome::Finished(Command::steer(0.0, 0.3)));
        assert!(ap.is_finished());
        assert!(ap.tracker().is_completed());

        // Stays finished wherever the boat drifts
        let out = ap.tick(&telemetry(wp0.offset(-500.0, 0.0), 0.0, 90.0, 0.0)).unwrap();
        assert_eq!(out.command().rudder(), 0.0);
    }

    #[test]
    fn test_nearest_policy() {
        let config = AutopilotConfig { advance: AdvancePolicy::Nearest, ..Default::default() };
        let a = Position::new(0.0, 0.0);
        let wps = vec![
            Waypoint::new(a, 10.0),
            Waypoint::new(a.offset(200.0, 0.0), 10.0),
            Waypoint::new(a.offset(15.0, 0.0), 10.0),
        ];
        let mut ap = Autopilot::new(WaypointTracker::new(wps).unwrap(), config);
        // Inside waypoint 0; nearest after arrival is waypoint 0 itself
        ap.tick(&telemetry(a, 0.0, 0.0, 90.0)).unwrap();
        assert_eq!(ap.tracker().index(), 0);
        // Just outside 0 but closer to 2
        ap.tick(&telemetry(a.offset(9.0, 0.0), 0.0, 0.0, 90.0)).unwrap();
        assert_eq!(ap.tracker().index(), 2);
    }

    #[test]
    fn test_player_returns_commands() {
        let mut ap = pilot(AutopilotConfig::default());
        let p = ap.tracker().current().position.offset(-100.0, 0.0);
        let cmd = ap.ai(&telemetry(p, 0.0, 0.0, 90.0));
        assert_eq!(ap.name(), "autopilot");
        assert!((-1.0..=1.0).contains(&cmd.rudder()));
        assert_eq!(ap.tack_memory().beating, None::<LineSide>);
    }

    #[test]
    fn test_from_contest_validates_radius() {
        let good = WaypointRecord {
            latitude: 1.0,
            longitude: 1.0,
            radius: 5.0,
            leg_type: Default::default(),
            achieved: false,
        };
        let bad = WaypointRecord { radius: 0.0, ..good.clone() };
        let contest = Contest { contest_type: "test".into(), waypoints: vec![good.clone(), bad], time_limit: None };
        assert!(matches!(
            Autopilot::from_contest(&contest, AutopilotConfig::default()),
            Err(AutopilotError::InvalidContest(_))
        ));

        let empty = Contest { contest_type: "test".into(), waypoints: vec![], time_limit: None };
        assert!(matches!(
            Autopilot::from_contest(&empty, AutopilotConfig::default()),
            Err(AutopilotError::EmptyRoute)
        ));

        let ok = Contest { contest_type: "test".into(), waypoints: vec![good], time_limit: None };
        assert!(Autopilot::from_contest(&ok, AutopilotConfig::default()).is_ok());
    }

    #[test]
    fn test_config_deserializes_partial_sections() {
        let cfg: AutopilotConfig = toml::from_str(
            r#"
            advance = "nearest"
            [strategy]
            beating_awa_deg = 40.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.advance, AdvancePolicy::Nearest);
        assert_eq!(cfg.strategy.beating_awa_deg, 40.0);
        assert_eq!(cfg.strategy.running_awa_deg, 145.0);
        assert_eq!(cfg.mode, ModeThresholds::default());
        assert_eq!(cfg.sail, 0.0);
    }
}
