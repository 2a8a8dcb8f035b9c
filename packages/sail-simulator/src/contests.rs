//! contests.rs — Preset contest routes for the simulator
//!
//! Each preset lays its marks out relative to a start position and the
//! configured wind, so the legs exercise the intended sailing modes no matter
//! where the course is anchored. A contest JSON file can replace the presets.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use sail_autopilot::Position;
use sail_types::{Contest, LegType, WaypointRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ContestPreset {
    /// Windward/leeward loop: beat, run, short reach to the finish
    #[default]
    FleetRace,
    /// Small square held for a fixed time
    StationKeeping,
    /// Straight beat to one mark and a run home
    UpwindReturn,
}

impl ContestPreset {
    pub fn name(self) -> &'static str {
        match self {
            ContestPreset::FleetRace => "fleet-race",
            ContestPreset::StationKeeping => "station-keeping",
            ContestPreset::UpwindReturn => "upwind-return",
        }
    }
}

// ── Course geometry ───────────────────────────────────────────────────────────

/// Point `upwind_m` into the wind and `across_m` to its right, seen from `origin`.
fn point(origin: Position, wind_from: f64, upwind_m: f64, across_m: f64) -> Position {
    let up = wind_from.to_radians();
    let right = (wind_from + 90.0).to_radians();
    origin.offset(
        upwind_m * up.cos() + across_m * right.cos(),
        upwind_m * up.sin() + across_m * right.sin(),
    )
}

fn record(p: Position, radius: f64, leg_type: LegType) -> WaypointRecord {
    WaypointRecord {
        latitude: p.latitude,
        longitude: p.longitude,
        radius,
        leg_type,
        achieved: false,
    }
}

/// Build a preset course anchored at `origin` for wind blowing from `wind_from`.
pub fn build(preset: ContestPreset, origin: Position, wind_from: f64) -> Contest {
    let at = |up: f64, across: f64| point(origin, wind_from, up, across);

    let (waypoints, time_limit) = match preset {
        ContestPreset::FleetRace => (
            vec![
                record(at(0.0, 0.0), 15.0, LegType::Start),
                record(at(400.0, 0.0), 15.0, LegType::Mark),
                record(at(0.0, 30.0), 15.0, LegType::Mark),
                record(at(0.0, 150.0), 15.0, LegType::Finish),
            ],
            None,
        ),
        ContestPreset::StationKeeping => {
            // 40 m box centred 100 m abeam of the start
            let c = (0.0, 100.0);
            (
                vec![
                    record(at(0.0, 0.0), 10.0, LegType::Start),
                    record(at(c.0 + 20.0, c.1 - 20.0), 5.0, LegType::Mark),
                    record(at(c.0 + 20.0, c.1 + 20.0), 5.0, LegType::Mark),
                    record(at(c.0 - 20.0, c.1 + 20.0), 5.0, LegType::Mark),
                    record(at(c.0 - 20.0, c.1 - 20.0), 5.0, LegType::Mark),
                ],
                Some(300.0),
            )
        }
        ContestPreset::UpwindReturn => (
            vec![
                record(at(0.0, 0.0), 15.0, LegType::Start),
                record(at(300.0, 0.0), 15.0, LegType::Mark),
                record(at(0.0, 0.0), 15.0, LegType::Finish),
            ],
            None,
        ),
    };

    Contest {
        contest_type: preset.name().to_string(),
        waypoints,
        time_limit,
    }
}

/// Load a contest from a JSON file.
pub fn load(path: &Path) -> Result<Contest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading contest file {}", path.display()))?;
    Contest::from_json(&raw).with_context(|| format!("parsing contest file {}", path.display()))
}
