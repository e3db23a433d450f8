//! Gridfall Simulator
//!
//! Headless driver for the encounter core. Runs a scripted fight, logs the
//! interesting events, replays it to check determinism and prints the final
//! snapshot as JSON.
//!
//! Usage: `gridfall-sim [config.json]`

use std::fs;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gridfall::{
    Encounter, EncounterConfig, InputFrame, PlayerAbility, TilePos, TICK_RATE, VERSION,
    game::{
        events::GameEventData,
        tick::replay_encounter,
    },
};

/// Demo length in ticks (60 seconds at the nominal rate).
const DEMO_TICKS: u32 = 3600;

fn main() -> Result<()> {
    // Initialize logging (RUST_LOG overrides)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Gridfall Simulator v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => EncounterConfig::default(),
    };

    demo_encounter(config)
}

/// Read and validate a JSON config.
fn load_config(path: &str) -> Result<EncounterConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    let config: EncounterConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))?;
    config.validate().with_context(|| format!("validating config {path}"))?;
    Ok(config)
}

/// Scripted player: close in on the boss, slash on a rhythm, whirl when
/// crowded, leap away every few seconds.
fn scripted_input(t: u32, encounter: &Encounter) -> InputFrame {
    let Some(boss) = encounter.boss() else { return InputFrame::new() };
    let aim = boss.origin();

    match t % 240 {
        0 => InputFrame::with_move(aim.offset(-1, 0)),
        60 | 120 | 150 => InputFrame::with_ability(PlayerAbility::Slash, Some(aim)),
        90 => InputFrame::with_ability(PlayerAbility::Whirl, None),
        200 => {
            let away = TilePos::new(1, encounter.grid.height() / 2);
            InputFrame::with_ability(PlayerAbility::Leap, Some(away))
        }
        _ => InputFrame::new(),
    }
}

/// Run the demo, then verify it by replay.
fn demo_encounter(config: EncounterConfig) -> Result<()> {
    info!("=== Starting Demo Encounter ===");
    info!("Encounter ID: {}", hex::encode(config.encounter_id));
    info!("RNG Seed: {}", config.seed);

    let mut encounter = Encounter::new(config.clone()).context("building encounter")?;
    let dt = 1.0 / TICK_RATE as f32;
    let mut frames = Vec::with_capacity(DEMO_TICKS as usize);
    let mut total_events = 0;

    for t in 0..DEMO_TICKS {
        let input = scripted_input(t, &encounter);
        frames.push((input, dt));

        let result = encounter.advance(&input, dt);
        total_events += result.events.len();

        // Log important events
        for event in &result.events {
            match &event.data {
                GameEventData::BossPhaseChanged { old_phase, new_phase } => {
                    info!("Tick {}: boss phase {:?} -> {:?}", event.tick, old_phase, new_phase);
                }
                GameEventData::EscortSpawned { minions } => {
                    info!("Tick {}: {} minions joined", event.tick, minions.len());
                }
                GameEventData::ActorDied { actor, kind } => {
                    info!("Tick {}: {:?} #{} died", event.tick, kind, actor.0);
                }
                GameEventData::EncounterEnded { outcome, duration_ticks } => {
                    info!("Encounter ended: {:?} after {} ticks", outcome, duration_ticks);
                }
                _ => {}
            }
        }

        if t % 600 == 0 {
            let player = encounter.player().map(|p| p.health.current()).unwrap_or(0);
            let boss = encounter.boss().map(|b| b.health.current()).unwrap_or(0);
            info!("Tick {}: player {} hp, boss {} hp, {} pools", t, player, boss, encounter.hazards.len());
        }

        if result.ended {
            break;
        }
    }

    // Print final results
    info!("=== Encounter Results ===");
    info!("Outcome: {:?}", encounter.outcome);
    info!("Total events: {}", total_events);
    let hash = encounter.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (replayed, _) = replay_encounter(config, &frames).context("replaying encounter")?;
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        warn!("DETERMINISM FAILURE: Hashes differ!");
        bail!("replay diverged from the live run");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");

    let snapshot = serde_json::to_string_pretty(&encounter.snapshot()).context("serializing snapshot")?;
    println!("{snapshot}");
    Ok(())
}
