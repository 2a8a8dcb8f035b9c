//! boat_sim.rs — Single-boat sailing simulation
//!
//! Advances one boat through a wind field in fixed ticks:
//! - Heading changes at a rate proportional to the rudder command
//! - Apparent wind from true wind and the boat's own motion
//! - Roll and target speed from the empirical estimators in `physics`
//! - Speed follows the target through a first-order lag
//! - Position integrated on the GPS fix (flat-earth step)
//!
//! Wind carries optional Gaussian direction shifts and gusts so the
//! controller's once-per-leg mode choice and tack hysteresis get exercised.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use sail_autopilot::geo::wrap_360;
use sail_autopilot::Position;
use sail_types::{
    ApparentWind, Attitude, BoatState, Command, Environment, Gps, Telemetry, TrueWind, Velocity,
};

use crate::physics;

// ── Config (populated from config.toml) ───────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimConfig {
    // [boat_physics]
    /// Heading change at full rudder, degrees per second
    pub turn_rate_deg_s: f64,
    /// Speed lag gain, 1/s
    pub speed_response: f64,
    pub initial_heading_deg: f64,

    // [wind]
    pub wind_direction_deg: f64,
    pub wind_speed_mps: f64,
    /// Per-tick direction noise, degrees (0 = steady)
    pub wind_shift_sigma_deg: f64,
    /// Per-tick speed noise as a fraction of base speed
    pub gust_sigma: f64,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

// ── Boat state ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct SimBoat {
    pub position: Position,
    /// True heading (0=N, 90=E), degrees
    pub heading_deg: f64,
    /// Heel, degrees
    pub roll_deg: f64,
    /// Speed through water, m/s
    pub speed_mps: f64,
    pub apparent_wind_speed: f64,
    pub apparent_wind_heading: f64,
    /// Last rudder applied
    pub rudder: f64,
}

// ── Simulation tick ───────────────────────────────────────────────────────────

pub struct BoatSim {
    pub boat: SimBoat,
    /// Wind after this tick's noise
    pub wind: TrueWind,
    pub t_elapsed: f64,
    /// Mean wind the noise is drawn around
    base_wind: TrueWind,
    cfg: SimConfig,
    rng: StdRng,
}

impl BoatSim {
    pub fn new(cfg: &SimConfig, start: Position) -> Self {
        let base_wind = TrueWind { speed: cfg.wind_speed_mps, heading: cfg.wind_direction_deg };
        let rng = match cfg.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let a = physics::apparent_wind(base_wind.heading, base_wind.speed, cfg.initial_heading_deg, 0.0);
        Self {
            boat: SimBoat {
                position: start,
                heading_deg: wrap_360(cfg.initial_heading_deg),
                roll_deg: 0.0,
                speed_mps: 0.0,
                apparent_wind_speed: a.speed,
                apparent_wind_heading: a.heading,
                rudder: 0.0,
            },
            wind: base_wind,
            t_elapsed: 0.0,
            base_wind,
            cfg: cfg.clone(),
            rng,
        }
    }

    pub fn set_wind(&mut self, direction_deg: f64, speed_mps: f64) {
        self.base_wind = TrueWind { speed: speed_mps.max(0.0), heading: wrap_360(direction_deg) };
        self.wind = self.base_wind;
    }

    /// What the boat's sensors report right now.
    pub fn telemetry(&self, dt: f64) -> Telemetry {
        let b = &self.boat;
        Telemetry {
            boat: BoatState {
                gps: Gps { latitude: b.position.latitude, longitude: b.position.longitude },
                attitude: Attitude { roll: b.roll_deg, pitch: 0.0, heading: b.heading_deg },
                apparent_wind: ApparentWind {
                    speed: b.apparent_wind_speed,
                    heading: b.apparent_wind_heading,
                },
                velocity: Velocity { speed: b.speed_mps, direction: b.heading_deg },
            },
            environment: Environment { wind: self.wind },
            dt,
            is_simulation: true,
        }
    }

    fn sample_wind(&mut self) {
        let mut wind = self.base_wind;
        if self.cfg.wind_shift_sigma_deg > 0.0 {
            if let Ok(n) = Normal::new(0.0, self.cfg.wind_shift_sigma_deg) {
                wind.heading = wrap_360(wind.heading + n.sample(&mut self.rng));
            }
        }
        if self.cfg.gust_sigma > 0.0 {
            if let Ok(n) = Normal::new(1.0, self.cfg.gust_sigma) {
                wind.speed = (wind.speed * n.sample(&mut self.rng)).max(0.0);
            }
        }
        self.wind = wind;
    }

    /// Advance simulation by dt seconds with `cmd` applied.
    /// Never panics; NaN commands are treated as a centred rudder.
    pub fn tick(&mut self, dt: f64, cmd: &Command) {
        self.t_elapsed += dt;
        self.sample_wind();

        let rudder = if cmd.rudder().is_finite() { cmd.rudder().clamp(-1.0, 1.0) } else { 0.0 };
        let boat = &mut self.boat;
        boat.rudder = rudder;
        boat.heading_deg = wrap_360(boat.heading_deg + rudder * self.cfg.turn_rate_deg_s * dt);

        // Apparent wind from last tick's speed on the new heading
        let a = physics::apparent_wind(self.wind.heading, self.wind.speed, boat.heading_deg, boat.speed_mps);
        boat.apparent_wind_speed = a.speed;
        boat.apparent_wind_heading = a.heading;

        boat.roll_deg = physics::estimate_roll(a.speed, a.heading);
        let target_speed = physics::estimate_speed(a.speed, a.heading, boat.roll_deg);

        // Smooth speed transition (simple first-order lag)
        boat.speed_mps += (target_speed - boat.speed_mps) * (dt * self.cfg.speed_response).min(1.0);

        let step = boat.speed_mps * dt;
        let h = boat.heading_deg.to_radians();
        boat.position = boat.position.offset(step * h.cos(), step * h.sin());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SimConfig {
        SimConfig {
            turn_rate_deg_s: 20.0,
            speed_response: 2.0,
            initial_heading_deg: 90.0,
            wind_direction_deg: 0.0,
            wind_speed_mps: 4.0,
            wind_shift_sigma_deg: 0.0,
            gust_sigma: 0.0,
            seed: Some(7),
        }
    }

    #[test]
    fn test_beam_reach_moves_east() {
        let start = Position::new(-36.8, 174.7);
        let mut sim = BoatSim::new(&cfg(), start);
        for _ in 0..100 {
            sim.tick(0.1, &Command::hold(0.0));
        }
        let c = start.distance_heading_to(&sim.boat.position);
        assert!(c.distance > 10.0, "only {} m", c.distance);
        assert!((c.heading - 90.0).abs() < 1.0);
        assert!(sim.boat.speed_mps > 0.0);
        assert!(sim.boat.roll_deg != 0.0);
        assert!((sim.t_elapsed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_rudder_turns_boat() {
        let mut sim = BoatSim::new(&cfg(), Position::new(0.0, 0.0));
        sim.tick(1.0, &Command::steer(0.5, 0.0));
        assert!((sim.boat.heading_deg - 100.0).abs() < 1e-9);
        sim.tick(1.0, &Command::steer(-1.0, 0.0));
        assert!((sim.boat.heading_deg - 80.0).abs() < 1e-9);
        sim.tick(1.0, &Command::steer(f64::NAN, 0.0));
        assert!((sim.boat.heading_deg - 80.0).abs() < 1e-9);
        assert_eq!(sim.boat.rudder, 0.0);
    }

    #[test]
    fn test_telemetry_reflects_state() {
        let mut sim = BoatSim::new(&cfg(), Position::new(1.0, 2.0));
        sim.set_wind(-90.0, 6.0);
        let t = sim.telemetry(0.2);
        assert_eq!(t.boat.gps, Gps { latitude: 1.0, longitude: 2.0 });
        assert_eq!(t.boat.attitude.heading, 90.0);
        assert_eq!(t.environment.wind.heading, 270.0);
        assert_eq!(t.environment.wind.speed, 6.0);
        assert_eq!(t.dt, 0.2);
        assert!(t.is_simulation);
    }

    #[test]
    fn test_noisy_wind_stays_near_base() {
        let mut c = cfg();
        c.wind_shift_sigma_deg = 5.0;
        c.gust_sigma = 0.2;
        let mut sim = BoatSim::new(&c, Position::new(0.0, 0.0));
        for _ in 0..500 {
            sim.tick(0.1, &Command::hold(0.0));
            let off = sail_autopilot::wrap_degrees(sim.wind.heading - 0.0).abs();
            assert!(off < 45.0, "wind shifted {off}°");
            assert!(sim.wind.speed >= 0.0);
        }
    }
}
