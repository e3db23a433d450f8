//! Authoritative Simulation Tick
//!
//! One fixed-order step of the encounter. Same state + same inputs + same
//! dt sequence = same result, every time.

use tracing::{debug, info};

use crate::game::actor::{blockers_except, ActorId, ActorKind, ActorRole};
use crate::game::attack::{AttackKind, BossAttack};
use crate::game::combat::{apply_hazard_hits, resolve_combat, DamageEvent};
use crate::game::config::{ConfigError, EncounterConfig};
use crate::game::events::GameEvent;
use crate::game::input::{InputFrame, PlayerAbility};
use crate::game::movement::MoveOutcome;
use crate::game::player::AbilityOutcome;
use crate::game::portal::PortalDashStatus;
use crate::game::state::{Encounter, EncounterOutcome};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, sorted
    pub events: Vec<GameEvent>,
    /// Every damage application this tick, in resolution order
    pub damage: Vec<DamageEvent>,
    /// Outcome after this tick
    pub outcome: EncounterOutcome,
    /// Whether the encounter ended this tick
    pub ended: bool,
}

/// Clamp a frame delta into `[0, max_dt]`. Non-finite input counts as 0.
pub fn clamp_dt(dt: f32, max_dt: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, max_dt) } else { 0.0 }
}

/// Run one simulation tick.
///
/// # Order
///
/// 1. input (move target, ability trigger)
/// 2. movement, each actor against a blocker snapshot of the others
/// 3. actor timers and brains (ground pools seeded here)
/// 4. boss phase and escort checks
/// 5. lasers and portal dash, applied to the player directly
/// 6. combat resolution
/// 7. ground hazard damage
/// 8. deaths and outcome
///
/// A finished encounter does not advance.
pub fn tick(enc: &mut Encounter, input: &InputFrame, dt: f32) -> TickResult {
    let mut result = TickResult { outcome: enc.outcome, ..Default::default() };
    if enc.outcome.is_over() {
        return result;
    }

    let dt = clamp_dt(dt, enc.config.max_dt);

    // 0. Advance clock
    enc.tick += 1;
    enc.elapsed += dt;

    // 1. Apply player input
    apply_input(enc, input);

    // 2. Move actors
    update_movement(enc, dt);

    // 3. Actor timers and attack machines
    update_actors(enc, dt);

    // 4. Boss phase and escort
    update_boss_phase(enc);

    // 5. Lasers and portal dash
    let hazard_damage = update_line_hazards(enc, dt);
    result.damage.extend(hazard_damage);

    // 6. Resolve queued hits
    let combat = resolve_combat(&mut enc.actors, &enc.grid);
    result.damage.extend(combat);

    // 7. Ground pools (after knockback, against the player's current tile)
    let target = enc.hazard_target();
    let mut hits = Vec::new();
    enc.hazards.advance(dt, target.as_ref(), &mut hits);
    result.damage.extend(apply_hazard_hits(&mut enc.actors, &hits));

    // 8. Deaths and end conditions
    process_deaths(enc, &result.damage);
    for damage in &result.damage {
        enc.push_event(GameEvent::damage(enc.tick, *damage));
    }
    result.ended = check_end_conditions(enc);
    result.outcome = enc.outcome;

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(tick = enc.tick, hash = %hex::encode(enc.compute_hash()), "Tick state");

    // Collect events
    result.events = enc.take_events();
    result.events.sort();

    result
}

/// Move target and ability trigger for the player.
fn apply_input(enc: &mut Encounter, input: &InputFrame) {
    let tick = enc.tick;
    let grid = &enc.grid;
    let Some(player) = enc.actors.get_mut(&enc.player_id) else { return };
    if !player.is_alive() {
        return;
    }

    if let Some(target) = input.move_target {
        player.mover.set_target(grid.clamp_origin(target, &player.footprint));
    }

    let Some(trigger) = input.ability else { return };
    let origin = player.origin();
    let footprint = player.footprint;
    let facing = player.mover.facing();
    let ActorRole::Player(brain) = &mut player.role else { return };

    let event = match brain.trigger(trigger.ability, trigger.aim, grid, origin, &footprint, facing) {
        AbilityOutcome::Attack(attack) => {
            let tiles = match trigger.ability {
                PlayerAbility::Whirl => brain.whirl.hit_tiles().to_vec(),
                _ => brain.slash.hit_tiles().to_vec(),
            };
            debug!(?attack, ?origin, "Player attack started");
            GameEvent::attack_started(tick, player.id, attack, tiles)
        }
        AbilityOutcome::Leap(to) => {
            player.mover.clear_path();
            player.position.snap_to(grid, origin);
            player.mover.set_target(to);
            debug!(?origin, ?to, "Player leapt");
            GameEvent::leap_started(tick, player.id, to)
        }
        AbilityOutcome::Refused => return,
    };
    enc.push_event(event);
}

/// Move every mobile actor one step along its path.
fn update_movement(enc: &mut Encounter, dt: f32) {
    let ids: Vec<ActorId> = enc.actors.keys().copied().collect();

    for id in ids {
        let blockers = blockers_except(&enc.actors, id);

        let Some(actor) = enc.actors.get_mut(&id) else { continue };
        if !actor.is_alive() {
            continue;
        }

        let movement = &enc.config.movement;
        let speed = match &actor.role {
            ActorRole::Player(p) if p.is_airborne() => movement.leap_speed,
            ActorRole::Player(_) => movement.player_speed,
            // Hidden or mid-bounce: the brain owns the position
            ActorRole::Boss(b) if b.is_passable() => continue,
            ActorRole::Boss(_) => movement.boss_speed,
            ActorRole::Minion(_) => movement.minion_speed,
            ActorRole::Obstacle => continue,
        };

        let footprint = actor.footprint;
        let outcome = actor.mover.advance(
            &mut actor.position,
            &footprint,
            &enc.grid,
            &blockers,
            speed,
            dt,
            movement,
        );
        if outcome == MoveOutcome::Halted {
            debug!(?id, "No route, movement halted");
        }
    }
}

/// Timers, brains and ground-pool seeding.
fn update_actors(enc: &mut Encounter, dt: f32) {
    let tick = enc.tick;
    let target = enc.player().filter(|p| p.is_alive()).map(|p| p.origin());
    let ids: Vec<ActorId> = enc.actors.keys().copied().collect();
    let mut events = Vec::new();

    for id in ids {
        let blockers = if id == enc.boss_id { blockers_except(&enc.actors, id) } else { Vec::new() };
        let Some(actor) = enc.actors.get_mut(&id) else { continue };
        actor.tick_timers(dt);
        if !actor.is_alive() {
            continue;
        }

        let origin = actor.origin();
        let footprint = actor.footprint;
        let mid_step = actor.mover.step().is_some();

        match &mut actor.role {
            ActorRole::Player(brain) => {
                brain.think(dt);
            }
            ActorRole::Boss(brain) => {
                let Some(target) = target else { continue };
                let step = brain.think(
                    dt,
                    &enc.grid,
                    &mut actor.position,
                    &footprint,
                    target,
                    &mut enc.hazards,
                    &blockers,
                    mid_step,
                );

                if let Some(kind) = step.started {
                    events.push(GameEvent::attack_started(tick, id, kind.id(), brain.attack.hit_tiles().to_vec()));
                }
                if step.seeded > 0 {
                    let effect = brain
                        .attack
                        .kind()
                        .or(step.finished)
                        .and_then(BossAttack::ground_effect);
                    if let Some(effect) = effect {
                        events.push(GameEvent::hazards_seeded(tick, id, effect.kind, step.seeded));
                    }
                }

                // Selection only happens on a settled tile, so no snap is needed
                if step.started.is_some() {
                    actor.mover.clear_path();
                } else if step.holding {
                    actor.mover.stop();
                } else if let Some(goal) = step.approach {
                    actor.mover.set_target(goal);
                }
            }
            ActorRole::Minion(brain) => {
                let Some(target) = target else { continue };
                let step = brain.think(dt, &enc.grid, origin, &footprint, target, mid_step);

                if let Some(kind) = step.started {
                    events.push(GameEvent::attack_started(tick, id, kind.id(), brain.attack.hit_tiles().to_vec()));
                    actor.mover.clear_path();
                } else if step.holding {
                    actor.mover.stop();
                } else if let Some(goal) = step.approach {
                    actor.mover.set_target(goal);
                }
            }
            ActorRole::Obstacle => {}
        }
    }

    for event in events {
        enc.push_event(event);
    }
}

/// Escort call and the Phase Two transition.
fn update_boss_phase(enc: &mut Encounter) {
    let tick = enc.tick;
    let Some(boss) = enc.actors.get_mut(&enc.boss_id) else { return };
    if !boss.is_alive() {
        return;
    }

    let health = boss.health;
    let Some(brain) = boss.boss_brain_mut() else { return };
    let escort = brain.should_spawn_escort(&health);
    let transition = brain.check_phase(&health);
    if transition.is_some() {
        // Settle on the tile so the boss reappears where it left
        let origin = boss.origin();
        boss.mover.clear_path();
        boss.position.snap_to(&enc.grid, origin);
    }

    if escort {
        let minions = enc.spawn_escort();
        info!(count = minions.len(), "Boss called its escort");
        enc.push_event(GameEvent::escort_spawned(tick, minions));
    }

    if let Some((old_phase, new_phase)) = transition {
        enc.push_event(GameEvent::boss_phase_changed(tick, old_phase, new_phase));
        enc.portal.start(&enc.grid, &mut enc.rng);
        let sweeps = enc.portal.sweeps().len();
        info!(sweeps, "Portal dash started");
        enc.push_event(GameEvent::portal_dash_started(tick, sweeps));
    }
}

/// Lasers and the portal dash damage the player directly.
fn update_line_hazards(enc: &mut Encounter, dt: f32) -> Vec<DamageEvent> {
    let tick = enc.tick;
    let target = enc.hazard_target();
    let mut hits = Vec::new();

    if let Some((orientation, coordinate)) =
        enc.lasers.advance(dt, &enc.grid, &mut enc.rng, target.as_ref(), &mut hits)
    {
        enc.push_event(GameEvent::laser_spawned(tick, orientation, coordinate));
    }

    if enc.portal.advance(dt, &enc.grid, target.as_ref(), &mut hits) == PortalDashStatus::Completed {
        if let Some(brain) = enc.actors.get_mut(&enc.boss_id).and_then(|b| b.boss_brain_mut()) {
            brain.reveal();
        }
        enc.lasers.enable();
        info!("Portal dash completed, lasers online");
        enc.push_event(GameEvent::portal_dash_completed(tick));
    }

    apply_hazard_hits(&mut enc.actors, &hits)
}

/// Emit a death event for every lethal hit.
fn process_deaths(enc: &mut Encounter, damage: &[DamageEvent]) {
    let tick = enc.tick;
    for lethal in damage.iter().filter(|d| d.lethal) {
        let Some(kind) = enc.actor(lethal.target).map(|a| a.kind()) else { continue };
        info!(actor = lethal.target.0, ?kind, "Actor died");
        enc.push_event(GameEvent::actor_died(tick, lethal.target, kind));
    }
}

/// Victory when the boss dies, defeat when the player dies. Defeat wins a tie.
fn check_end_conditions(enc: &mut Encounter) -> bool {
    let player_dead = enc.player().map_or(true, |p| !p.is_alive());
    let boss_dead = enc.boss().map_or(true, |b| !b.is_alive());

    let outcome = if player_dead {
        EncounterOutcome::Defeat
    } else if boss_dead {
        EncounterOutcome::Victory
    } else {
        return false;
    };

    enc.outcome = outcome;
    enc.lasers.disable();
    let minions = enc.count_alive(|a| a.kind() == ActorKind::Minion);
    info!(?outcome, tick = enc.tick, minions, "Encounter ended");
    enc.push_event(GameEvent::encounter_ended(enc.tick, outcome));
    true
}

/// Replay an encounter from its config and a recorded (input, dt) stream.
///
/// Stops early once the encounter ends. Returns the final state and every
/// event in tick order.
pub fn replay_encounter(
    config: EncounterConfig,
    frames: &[(InputFrame, f32)],
) -> Result<(Encounter, Vec<GameEvent>), ConfigError> {
    let mut enc = Encounter::new(config)?;
    let mut events = Vec::new();

    for (input, dt) in frames {
        if enc.is_over() {
            break;
        }
        events.extend(tick(&mut enc, input, *dt).events);
    }

    Ok((enc, events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::core::grid::TilePos;
    use crate::game::attack::AttackPhase;
    use crate::game::boss::BossPhase;
    use crate::game::events::GameEventData;

    const DT: f32 = 1.0 / 60.0;

    /// Open arena: no walls, no obstacles.
    fn open_config() -> EncounterConfig {
        EncounterConfig {
            walls: Vec::new(),
            obstacles: Vec::new(),
            ..EncounterConfig::default()
        }
    }

    fn run(enc: &mut Encounter, ticks: usize, input: InputFrame) -> Vec<TickResult> {
        (0..ticks).map(|_| tick(enc, &input, DT)).collect()
    }

    #[test]
    fn test_tick_increments() {
        let mut enc = Encounter::new(open_config()).unwrap();
        tick(&mut enc, &InputFrame::new(), DT);
        assert_eq!(enc.tick, 1);
        assert!((enc.elapsed - DT).abs() < 1e-6);
    }

    #[test]
    fn test_dt_clamped() {
        assert_eq!(clamp_dt(1.0, 0.25), 0.25);
        assert_eq!(clamp_dt(-0.5, 0.25), 0.0);
        assert_eq!(clamp_dt(f32::NAN, 0.25), 0.0);

        let mut enc = Encounter::new(open_config()).unwrap();
        tick(&mut enc, &InputFrame::new(), 5.0);
        assert_eq!(enc.elapsed, 0.25);
    }

    #[test]
    fn test_determinism() {
        let script = |i: usize| match i % 90 {
            0 => InputFrame::with_move(TilePos::new(7, 6)),
            30 => InputFrame::with_ability(PlayerAbility::Slash, Some(TilePos::new(10, 6))),
            60 => InputFrame::with_ability(PlayerAbility::Whirl, None),
            _ => InputFrame::new(),
        };

        let mut a = Encounter::new(EncounterConfig::default()).unwrap();
        let mut b = Encounter::new(EncounterConfig::default()).unwrap();
        for i in 0..600 {
            tick(&mut a, &script(i), DT);
            tick(&mut b, &script(i), DT);
        }
        assert_eq!(a.compute_hash(), b.compute_hash());
        assert_eq!(a.actor_views(), b.actor_views());
    }

    #[test]
    fn test_enemies_never_jump_between_ticks() {
        let mut enc = Encounter::new(EncounterConfig::default()).unwrap();
        let m = &enc.config.movement;
        let max_step = m.boss_speed.max(m.minion_speed) * DT + m.snap_epsilon + 1e-4;
        let script = |i: usize| match i % 120 {
            0 => InputFrame::with_move(TilePos::new(2, 2)),
            60 => InputFrame::with_move(TilePos::new(12, 9)),
            _ => InputFrame::new(),
        };

        // Walking enemies start attacks on a settled tile, never mid-step
        let mut last: BTreeMap<ActorId, (f32, f32)> = BTreeMap::new();
        for i in 0..1200 {
            tick(&mut enc, &script(i), DT);
            let mut now = BTreeMap::new();
            for actor in enc.actors.values() {
                if !matches!(actor.kind(), ActorKind::Boss | ActorKind::Minion)
                    || !actor.is_alive()
                    || actor.is_passable()
                {
                    continue;
                }
                let here = actor.position.smooth();
                if let Some(&(px, py)) = last.get(&actor.id) {
                    let jump = ((here.0 - px).powi(2) + (here.1 - py).powi(2)).sqrt();
                    assert!(jump <= max_step, "tick {i}: {:?} moved {jump}", actor.id);
                }
                now.insert(actor.id, here);
            }
            last = now;
            if enc.is_over() {
                break;
            }
        }
    }

    #[test]
    fn test_boss_telegraphs_before_damage() {
        let mut config = open_config();
        config.player_spawn = TilePos::new(7, 5);
        let mut enc = Encounter::new(config).unwrap();

        // Boss at (10,5), player 3 away: Wave starts on the first tick
        let first = tick(&mut enc, &InputFrame::new(), DT);
        assert!(first.events.iter().any(|e| matches!(e.data, GameEventData::AttackStarted { actor, .. } if actor == enc.boss_id)));
        assert!(first.damage.is_empty());

        let brain = enc.boss().unwrap().boss_brain().unwrap();
        assert_eq!(brain.attack.phase(), AttackPhase::Telegraph);
    }

    #[test]
    fn test_player_slash_damages_boss() {
        let mut config = open_config();
        config.player_spawn = TilePos::new(9, 5);
        let mut enc = Encounter::new(config).unwrap();

        let results = run(&mut enc, 1, InputFrame::with_ability(PlayerAbility::Slash, Some(TilePos::new(10, 5))));
        assert!(results[0].events.iter().any(|e| matches!(e.data, GameEventData::AttackStarted { actor, .. } if actor == enc.player_id)));

        let results = run(&mut enc, 20, InputFrame::new());
        let dealt: i32 = results
            .iter()
            .flat_map(|r| &r.damage)
            .filter(|d| d.target == enc.boss_id)
            .map(|d| d.amount)
            .sum();
        assert_eq!(dealt, 12);
    }

    #[test]
    fn test_phase_two_runs_portal_then_lasers() {
        let mut config = open_config();
        config.player_health = 1000;
        let mut enc = Encounter::new(config).unwrap();
        let boss_id = enc.boss_id;
        enc.actor_mut(boss_id).unwrap().health.set(200);

        let results = run(&mut enc, 1, InputFrame::new());
        let kinds: Vec<_> = results[0].events.iter().map(|e| &e.data).collect();
        assert!(kinds.iter().any(|d| matches!(d, GameEventData::EscortSpawned { minions } if minions.len() == 2)));
        assert!(kinds.iter().any(|d| matches!(d, GameEventData::BossPhaseChanged { new_phase: BossPhase::Two, .. })));
        assert!(kinds.iter().any(|d| matches!(d, GameEventData::PortalDashStarted { sweeps: 4 })));
        assert!(enc.boss().unwrap().view().hidden);
        assert!(enc.portal.is_active());

        // 4 sweeps x (0.9 + 0.6 + 0.4) s = 7.6 s
        let mut completed = false;
        for _ in 0..(9.0 / DT) as usize {
            let r = tick(&mut enc, &InputFrame::new(), DT);
            completed |= r.events.iter().any(|e| e.data == GameEventData::PortalDashCompleted);
            if completed {
                break;
            }
        }
        assert!(!enc.is_over());
        assert!(completed);
        assert!(!enc.boss().unwrap().view().hidden);
        assert!(enc.lasers.is_enabled());
        assert!(!enc.portal.is_active());
    }

    #[test]
    fn test_victory_when_boss_dies() {
        let mut config = open_config();
        config.player_spawn = TilePos::new(9, 5);
        config.boss_health = 10;
        let mut enc = Encounter::new(config).unwrap();

        let mut results = run(&mut enc, 1, InputFrame::with_ability(PlayerAbility::Slash, Some(TilePos::new(10, 5))));
        results.extend(run(&mut enc, 20, InputFrame::new()));

        assert_eq!(enc.outcome, EncounterOutcome::Victory);
        let ended: Vec<_> = results.iter().filter(|r| r.ended).collect();
        assert_eq!(ended.len(), 1);
        assert!(ended[0].events.iter().any(|e| matches!(e.data, GameEventData::ActorDied { kind: ActorKind::Boss, .. })));

        // Finished encounters do not advance
        let before = enc.tick;
        tick(&mut enc, &InputFrame::new(), DT);
        assert_eq!(enc.tick, before);
    }

    #[test]
    fn test_defeat_when_player_dies() {
        let mut config = open_config();
        // Inside the Wave band (columns 8 and 9)
        config.player_spawn = TilePos::new(8, 5);
        config.player_health = 1;
        let mut enc = Encounter::new(config).unwrap();

        run(&mut enc, 120, InputFrame::new());
        assert_eq!(enc.outcome, EncounterOutcome::Defeat);
        assert!(!enc.player().unwrap().is_alive());
    }

    #[test]
    fn test_replay_matches_live_run() {
        let frames: Vec<(InputFrame, f32)> = (0..300)
            .map(|i| match i {
                0 => (InputFrame::with_move(TilePos::new(6, 6)), DT),
                30 => (InputFrame::with_ability(PlayerAbility::Leap, Some(TilePos::new(2, 2))), DT),
                _ => (InputFrame::new(), DT),
            })
            .collect();

        let mut live = Encounter::new(EncounterConfig::default()).unwrap();
        for (input, dt) in &frames {
            tick(&mut live, input, *dt);
        }

        let (replayed, events) = replay_encounter(EncounterConfig::default(), &frames).unwrap();
        assert_eq!(live.compute_hash(), replayed.compute_hash());
        assert!(events.iter().any(|e| matches!(e.data, GameEventData::LeapStarted { .. })));
    }
}
