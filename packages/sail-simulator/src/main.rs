//! main.rs — Sailboat simulator entry point
//!
//! Runs two concurrent tasks:
//!   1. Sim loop: each epoch the active player turns the boat's telemetry into
//!      a command, the boat model applies it, and the epoch goes out over UDP
//!   2. WebSocket server: control panel (pause/resume, speed, wind, remote
//!      rudder, contest presets) plus a live telemetry feed
//!
//! Player faults are logged and fall back to a centred rudder; the sim never
//! stops on a bad tick.

mod boat_sim;
mod contests;
mod physics;
mod players;
mod udp_tx;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{State, WebSocketUpgrade, ws::{WebSocket, Message}},
    response::Response,
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tokio::sync::{RwLock, broadcast};
use tokio::time::interval;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use sail_autopilot::{Autopilot, AutopilotConfig, Player, Position};
use sail_types::{Command, Contest};

use boat_sim::{BoatSim, SimConfig};
use contests::ContestPreset;
use players::{Pilot, PlayerKind, RemoteControl};
use udp_tx::UdpTransmitter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sail-sim", about = "Autonomous sailboat simulator")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// UDP hub address
    #[arg(long, default_value = "127.0.0.1:5600")]
    hub_addr: String,
    /// Also send each epoch to the multicast group
    #[arg(long)]
    multicast: bool,
    /// Simulation speed multiplier (1.0 = real-time)
    #[arg(long)]
    speed: Option<f64>,
    /// Who steers the boat
    #[arg(long, value_enum)]
    player: Option<PlayerKind>,
    /// Preset course
    #[arg(long, value_enum)]
    contest: Option<ContestPreset>,
    /// Contest JSON file, replaces the preset
    #[arg(long)]
    contest_file: Option<PathBuf>,
    /// Control panel WebSocket port
    #[arg(long)]
    ctrl_port: Option<u16>,
}

// ── Shared state ──────────────────────────────────────────────────────────────

/// Everything needed to rebuild the run on `reset` or `preset`.
#[derive(Debug, Clone)]
struct Setup {
    sim: SimConfig,
    autopilot: AutopilotConfig,
    player: PlayerKind,
    origin: Position,
}

struct SimState {
    setup: Setup,
    contest: Contest,
    sim: BoatSim,
    pilot: Pilot,
    paused: bool,
    epoch_counter: u32,
    speed: f64,
    last_command: Command,
    /// Telemetry snapshot, broadcast to web UI each epoch
    last_telemetry: Option<serde_json::Value>,
}

type SharedState = Arc<RwLock<SimState>>;

impl SimState {
    fn new(setup: Setup, contest: Contest, speed: f64) -> Result<Self> {
        let (sim, pilot) = build_run(&setup, &contest)?;
        Ok(Self {
            last_command: Command::hold(setup.autopilot.sail),
            setup,
            contest,
            sim,
            pilot,
            paused: false,
            epoch_counter: 0,
            speed,
            last_telemetry: None,
        })
    }

    /// Restart the boat at the first mark with a fresh player.
    fn restart(&mut self) -> Result<()> {
        let (sim, pilot) = build_run(&self.setup, &self.contest)?;
        self.sim = sim;
        self.pilot = pilot;
        self.epoch_counter = 0;
        self.paused = false;
        self.last_command = Command::hold(self.setup.autopilot.sail);
        self.last_telemetry = None;
        Ok(())
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "type":    "telemetry",
            "epoch":   self.epoch_counter,
            "t":       self.sim.t_elapsed,
            "paused":  self.paused,
            "boat":    &self.sim.boat,
            "wind":    self.sim.wind,
            "command": self.last_command,
            "pilot":   self.pilot.status(),
        })
    }
}

fn build_run(setup: &Setup, contest: &Contest) -> Result<(BoatSim, Pilot)> {
    let start = contest
        .waypoints
        .first()
        .map(|w| Position::new(w.latitude, w.longitude))
        .unwrap_or(setup.origin);
    let sim = BoatSim::new(&setup.sim, start);
    let pilot = match setup.player {
        PlayerKind::Autopilot => {
            let ap = Autopilot::from_contest(contest, setup.autopilot.clone())
                .with_context(|| format!("loading contest '{}'", contest.contest_type))?;
            Pilot::Auto(Box::new(ap))
        }
        PlayerKind::Remote => Pilot::Remote(RemoteControl::new(setup.autopilot.sail)),
    };
    Ok((sim, pilot))
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sail_simulator=info,sail_autopilot=info".into()),
        )
        .init();

    let args = Args::parse();

    // Load config
    let config_str = std::fs::read_to_string(&args.config)
        .unwrap_or_else(|_| include_str!("../config.toml").to_string());
    let mut cfg: FullConfig = toml::from_str(&config_str).context("Invalid config.toml")?;
    cfg.apply_args(&args);
    anyhow::ensure!(
        cfg.simulation.update_rate_hz > 0.0,
        "update_rate_hz must be positive, got {}",
        cfg.simulation.update_rate_hz
    );

    let setup = Setup {
        sim: sim_config_from(&cfg),
        autopilot: cfg.autopilot.clone(),
        player: cfg.contest.player,
        origin: Position::new(cfg.simulation.origin_lat, cfg.simulation.origin_lon),
    };
    let contest = match &cfg.contest.file {
        Some(path) => contests::load(path)?,
        None => contests::build(cfg.contest.preset, setup.origin, cfg.wind.direction_deg),
    };

    info!(
        "⛵ Sail simulator starting — contest '{}', {} waypoints, player {:?}, wind {:.0}° @ {:.1}m/s",
        contest.contest_type,
        contest.waypoints.len(),
        setup.player,
        cfg.wind.direction_deg,
        cfg.wind.speed_mps
    );

    let state = SimState::new(setup, contest, cfg.simulation.sim_speed)?;
    let shared: SharedState = Arc::new(RwLock::new(state));

    // UDP transmitter
    let mc_addr = if args.multicast { Some(udp_tx::MULTICAST_ADDR) } else { None };
    let transmitter = UdpTransmitter::new(&args.hub_addr, mc_addr)
        .context("Failed to bind UDP socket")?;
    let transmitter = Arc::new(transmitter);

    // Broadcast channel for telemetry (web UI)
    let (telem_tx, _) = broadcast::channel::<String>(64);
    let telem_tx = Arc::new(telem_tx);

    let shared_loop = shared.clone();
    let tx_loop = transmitter.clone();
    let telem_tx_loop = telem_tx.clone();
    let update_rate = cfg.simulation.update_rate_hz;
    tokio::spawn(async move {
        sim_loop(shared_loop, tx_loop, telem_tx_loop, update_rate).await;
    });

    // Control WebSocket server
    let ctrl_addr = format!("0.0.0.0:{}", cfg.simulation.ctrl_port);
    info!("🖥  Control panel WebSocket at ws://{ctrl_addr}");

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "sail-sim ok" }))
        .with_state((shared.clone(), telem_tx.clone()))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let listener = tokio::net::TcpListener::bind(&ctrl_addr)
        .await
        .with_context(|| format!("binding control panel on {ctrl_addr}"))?;
    axum::serve(listener, app).await.context("control panel server")?;
    Ok(())
}

// ── Simulation loop ───────────────────────────────────────────────────────────

async fn sim_loop(
    state: SharedState,
    tx: Arc<UdpTransmitter>,
    telem: Arc<broadcast::Sender<String>>,
    update_rate_hz: f64,
) {
    let epoch_duration_ms = (1000.0 / update_rate_hz) as u64;
    let mut ticker = interval(Duration::from_millis(epoch_duration_ms.max(1)));

    info!("⚓ Sim loop running at {update_rate_hz} Hz ({}ms epoch)", epoch_duration_ms);

    loop {
        ticker.tick().await;

        let (paused, speed) = {
            let s = state.read().await;
            (s.paused, s.speed)
        };

        if paused { continue; }

        // dt = real epoch time × speed multiplier
        let dt = (epoch_duration_ms as f64 / 1000.0) * speed;

        let (epoch, telemetry, command, telemetry_json) = {
            let mut s = state.write().await;
            let telemetry = s.sim.telemetry(dt);
            let command = s.pilot.ai(&telemetry);
            s.sim.tick(dt, &command);
            s.epoch_counter += 1;
            s.last_command = command;

            if let Some(limit) = s.contest.time_limit {
                if s.sim.t_elapsed >= limit {
                    s.paused = true;
                    info!("⏰ Time limit {limit:.0}s reached, sim paused");
                }
            }

            if s.epoch_counter % 20 == 0 {
                let b = &s.sim.boat;
                info!(
                    "⏱ t={:.0}s | epoch={} | hdg={:.0}° spd={:.2}m/s rudder={:.2} | {}",
                    s.sim.t_elapsed,
                    s.epoch_counter,
                    b.heading_deg,
                    b.speed_mps,
                    b.rudder,
                    s.pilot.status()
                );
            }

            let snapshot = s.snapshot();
            s.last_telemetry = Some(snapshot.clone());
            (s.epoch_counter, telemetry, command, snapshot.to_string())
        };

        // Send to hub via UDP
        tx.send_epoch(epoch, &telemetry, &command);

        // Broadcast to web UI
        let _ = telem.send(telemetry_json);
    }
}

// ── WebSocket control handler ─────────────────────────────────────────────────

async fn ws_handler(
    ws: WebSocketUpgrade,
    State((state, telem_tx)): State<(SharedState, Arc<broadcast::Sender<String>>)>,
) -> Response {
    ws.on_upgrade(move |socket| handle_ws(socket, state, telem_tx))
}

async fn handle_ws(
    mut socket: WebSocket,
    state: SharedState,
    telem_tx: Arc<broadcast::Sender<String>>,
) {
    let mut telem_rx = telem_tx.subscribe();

    // Send current state immediately on connect
    for msg in greeting(&state).await {
        if socket.send(Message::Text(msg)).await.is_err() { return; }
    }

    loop {
        tokio::select! {
            // Relay telemetry to client
            Ok(msg) = telem_rx.recv() => {
                if socket.send(Message::Text(msg)).await.is_err() { break; }
            }
            // Handle commands from web UI
            Some(Ok(Message::Text(cmd))) = socket.recv() => {
                handle_command(&state, &cmd).await;
            }
            else => break,
        }
    }
}

/// Latest telemetry (if any) and the contest, rendered under one read lock
/// that is released before anything is sent.
async fn greeting(state: &SharedState) -> Vec<String> {
    let s = state.read().await;
    let mut out = Vec::with_capacity(2);
    if let Some(telem) = s.last_telemetry.as_ref() {
        out.push(telem.to_string());
    }
    out.push(serde_json::json!({"type": "contest", "data": &s.contest}).to_string());
    out
}

/// Handle commands from the web control panel.
/// Commands are JSON: { "cmd": "...", "args": {...} }
async fn handle_command(state: &SharedState, raw: &str) {
    let v: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => { warn!("Malformed control message: {e}"); return; }
    };
    let cmd = v["cmd"].as_str().unwrap_or("");
    match cmd {
        "pause"  => { state.write().await.paused = true;  info!("⏸ Sim paused"); }
        "resume" => { state.write().await.paused = false; info!("▶ Sim resumed"); }
        "reset"  => {
            let mut s = state.write().await;
            match s.restart() {
                Ok(()) => info!("↺ Sim reset"),
                Err(e) => warn!("Reset failed: {e:#}"),
            }
        }
        "set_speed" => {
            if let Some(sp) = v["args"]["speed"].as_f64() {
                let sp = sp.clamp(0.1, 20.0);
                state.write().await.speed = sp;
                info!("⚡ Sim speed set to {sp}×");
            }
        }
        "rudder" => {
            let Some(r) = v["args"]["rudder"].as_f64() else {
                warn!("rudder command without args.rudder");
                return;
            };
            let mut s = state.write().await;
            if !s.pilot.set_rudder(r) {
                warn!("Rudder command ignored, {} is steering", s.pilot.name());
            }
        }
        "set_wind" => {
            let mut s = state.write().await;
            let direction = v["args"]["direction"].as_f64().unwrap_or(s.sim.wind.heading);
            let speed = v["args"]["speed"].as_f64().unwrap_or(s.sim.wind.speed);
            s.sim.set_wind(direction, speed);
            info!("🌬 Wind set to {direction:.0}° @ {speed:.1}m/s");
        }
        "preset" => {
            let name = v["args"]["name"].as_str().unwrap_or("");
            let Ok(preset) = ContestPreset::from_str(name, true) else {
                warn!("Unknown preset: {name}");
                return;
            };
            let mut s = state.write().await;
            let contest = contests::build(preset, s.setup.origin, s.sim.wind.heading);
            let previous = std::mem::replace(&mut s.contest, contest);
            match s.restart() {
                Ok(()) => info!("🏁 Preset '{}' loaded", preset.name()),
                Err(e) => {
                    warn!("Preset '{name}' rejected: {e:#}");
                    s.contest = previous;
                }
            }
        }
        _ => warn!("Unknown control command: {cmd}"),
    }
}

// ── Config structs ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FullConfig {
    simulation:   SimSimConfig,
    boat_physics: BoatPhysicsConfig,
    wind:         WindConfig,
    #[serde(default)]
    autopilot:    AutopilotConfig,
    #[serde(default)]
    contest:      ContestConfig,
}

#[derive(Debug, Deserialize)]
struct SimSimConfig {
    update_rate_hz: f64,
    sim_speed: f64,
    ctrl_port: u16,
    origin_lat: f64,
    origin_lon: f64,
}

#[derive(Debug, Deserialize)]
struct BoatPhysicsConfig {
    turn_rate_deg_s: f64,
    speed_response: f64,
    initial_heading_deg: f64,
}

#[derive(Debug, Deserialize)]
struct WindConfig {
    direction_deg: f64,
    speed_mps: f64,
    #[serde(default)]
    shift_sigma_deg: f64,
    #[serde(default)]
    gust_sigma: f64,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ContestConfig {
    #[serde(default)]
    preset: ContestPreset,
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default)]
    player: PlayerKind,
}

impl FullConfig {
    /// CLI flags win over file values.
    fn apply_args(&mut self, args: &Args) {
        if let Some(sp) = args.speed { self.simulation.sim_speed = sp; }
        if let Some(port) = args.ctrl_port { self.simulation.ctrl_port = port; }
        if let Some(p) = args.player { self.contest.player = p; }
        if let Some(c) = args.contest {
            self.contest.preset = c;
            self.contest.file = None;
        }
        if let Some(f) = &args.contest_file { self.contest.file = Some(f.clone()); }
    }
}

fn sim_config_from(cfg: &FullConfig) -> SimConfig {
    SimConfig {
        turn_rate_deg_s: cfg.boat_physics.turn_rate_deg_s,
        speed_response: cfg.boat_physics.speed_response,
        initial_heading_deg: cfg.boat_physics.initial_heading_deg,
        wind_direction_deg: cfg.wind.direction_deg,
        wind_speed_mps: cfg.wind.speed_mps,
        wind_shift_sigma_deg: cfg.wind.shift_sigma_deg,
        gust_sigma: cfg.wind.gust_sigma,
        seed: cfg.wind.seed,
    }
}
