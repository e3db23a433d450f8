//! End-to-end encounter runs through the public API.

use gridfall::game::events::GameEventData;
use gridfall::game::hazard::HazardKind;
use gridfall::game::tick::replay_encounter;
use gridfall::game::{ActorKind, ConfigError};
use gridfall::{Encounter, EncounterConfig, EncounterOutcome, InputFrame, PlayerAbility, TilePos};

const DT: f32 = 1.0 / 60.0;

fn script(t: u32, boss: TilePos) -> InputFrame {
    match t % 180 {
        0 => InputFrame::with_move(boss.offset(-1, 0)),
        45 | 90 => InputFrame::with_ability(PlayerAbility::Slash, Some(boss)),
        120 => InputFrame::with_ability(PlayerAbility::Whirl, None),
        _ => InputFrame::new(),
    }
}

#[test]
fn scripted_fight_is_reproducible() {
    let run = || {
        let mut enc = Encounter::new(EncounterConfig::default()).unwrap();
        let mut events = 0;
        for t in 0..1800 {
            let boss = enc.boss().unwrap().origin();
            let result = enc.advance(&script(t, boss), DT);
            events += result.events.len();
            if result.ended {
                break;
            }
        }
        (enc.compute_hash(), enc.tick, events)
    };

    assert_eq!(run(), run());
}

#[test]
fn replay_reaches_same_hash() {
    let frames: Vec<(InputFrame, f32)> = (0..900)
        .map(|t| (script(t, TilePos::new(10, 5)), DT))
        .collect();

    let (a, events_a) = replay_encounter(EncounterConfig::default(), &frames).unwrap();
    let (b, events_b) = replay_encounter(EncounterConfig::default(), &frames).unwrap();
    assert_eq!(a.compute_hash(), b.compute_hash());
    assert_eq!(events_a.len(), events_b.len());
}

#[test]
fn distant_player_draws_a_bounce_with_poison() {
    let mut enc = Encounter::new(EncounterConfig::default()).unwrap();

    let mut poison = 0;
    let mut boss_passable = false;
    for _ in 0..180 {
        let result = enc.advance(&InputFrame::new(), DT);
        boss_passable |= enc.boss().unwrap().is_passable();
        for event in &result.events {
            if let GameEventData::HazardsSeeded { kind: HazardKind::Poison, count, .. } = event.data {
                poison += count;
            }
        }
    }

    assert!(boss_passable);
    assert!(poison > 0);
    assert!(enc.hazard_snapshot().iter().any(|h| h.kind == HazardKind::Poison));
}

#[test]
fn hazards_never_leave_the_grid() {
    let mut enc = Encounter::new(EncounterConfig::default()).unwrap();
    for t in 0..1200 {
        let boss = enc.boss().unwrap().origin();
        enc.advance(&script(t, boss), DT);

        for hazard in enc.hazard_snapshot() {
            assert!(enc.grid.in_bounds(hazard.position));
        }
        for view in enc.actor_views() {
            assert!(enc.grid.footprint_fits(view.tile, &view.footprint));
            for attack in &view.attacks {
                assert!(attack.tiles.iter().all(|t| enc.grid.in_bounds(*t)));
            }
        }
        if enc.is_over() {
            break;
        }
    }
}

#[test]
fn config_round_trips_through_json() {
    let json = serde_json::to_string(&EncounterConfig::default()).unwrap();
    let config: EncounterConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, EncounterConfig::default());

    // Partial files fall back to defaults
    let partial: EncounterConfig = serde_json::from_str(r#"{ "seed": 7, "escort_count": 3 }"#).unwrap();
    assert_eq!(partial.seed, 7);
    assert_eq!(partial.escort_count, 3);
    assert_eq!(partial.grid_width, 16);
    assert!(Encounter::new(partial).is_ok());
}

#[test]
fn invalid_configs_are_rejected() {
    let config = EncounterConfig { player_spawn: TilePos::new(40, 2), ..EncounterConfig::default() };
    assert!(matches!(Encounter::new(config), Err(ConfigError::BadTile { what: "player spawn", .. })));

    let config = EncounterConfig { boss_health: 0, ..EncounterConfig::default() };
    assert_eq!(Encounter::new(config).unwrap_err(), ConfigError::NotPositive("boss_health"));

    let config: EncounterConfig =
        serde_json::from_str(r#"{ "boss_footprint": { "width": 0, "height": 0 } }"#).unwrap();
    assert_eq!(Encounter::new(config).unwrap_err(), ConfigError::NotPositive("boss_footprint"));
}

#[test]
fn weak_boss_falls_to_slashes() {
    let config = EncounterConfig {
        walls: Vec::new(),
        obstacles: Vec::new(),
        player_spawn: TilePos::new(9, 5),
        player_health: 1000,
        boss_health: 30,
        ..EncounterConfig::default()
    };
    let mut enc = Encounter::new(config).unwrap();

    // Two slashes reach phase two; the third lands after the portal dash
    let mut died = false;
    for t in 0..900 {
        let input = if t % 30 == 0 {
            InputFrame::with_ability(PlayerAbility::Slash, Some(TilePos::new(10, 5)))
        } else {
            InputFrame::new()
        };
        let result = enc.advance(&input, DT);
        died |= result
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::ActorDied { kind: ActorKind::Boss, .. }));
        if result.ended {
            break;
        }
    }

    assert!(died);
    assert_eq!(enc.outcome, EncounterOutcome::Victory);
}
