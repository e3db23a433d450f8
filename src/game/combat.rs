//! Combat Resolver
//!
//! Turns queued hits into damage. Runs once per tick after every actor has
//! updated, so hits are tested against positions as of this tick.
//!
//! Each pending hit gets its own visited set: a target is damaged at most
//! once per hit no matter how many of its footprint tiles the hit covers,
//! and two different hits never share that bookkeeping.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};

use crate::core::grid::{Grid, TilePos};
use crate::game::actor::{blockers_except, is_hostile, Actor, ActorId, ActorKind};
use crate::game::attack::{AttackId, PendingHit};
use crate::game::hazard::{HazardHit, HazardSource};
use crate::game::movement::{is_free, Blocker};

/// Where damage came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    /// An actor's attack
    Attack {
        /// Attacker
        attacker: ActorId,
        /// Attack kind
        attack: AttackId,
    },
    /// A hazard system
    Hazard(HazardSource),
}

/// One damage application, for the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Origin
    pub source: DamageSource,
    /// Damaged actor
    pub target: ActorId,
    /// Damage dealt (after clamping to remaining health)
    pub amount: i32,
    /// Tile where the hit registered
    pub tile: TilePos,
    /// Target died from this hit
    pub lethal: bool,
}

/// Drain every actor's pending hits and apply them.
pub fn resolve_combat(actors: &mut BTreeMap<ActorId, Actor>, grid: &Grid) -> Vec<DamageEvent> {
    let mut events = Vec::new();
    let ids: Vec<ActorId> = actors.keys().copied().collect();

    for id in ids {
        let Some(attacker) = actors.get_mut(&id) else { continue };
        let hits = attacker.take_pending_hits();
        if hits.is_empty() || !attacker.is_alive() {
            continue;
        }
        let kind = attacker.kind();
        let centre = attacker.centre();

        for hit in &hits {
            resolve_hit(actors, grid, id, kind, centre, hit, &mut events);
        }
    }
    events
}

fn resolve_hit(
    actors: &mut BTreeMap<ActorId, Actor>,
    grid: &Grid,
    attacker: ActorId,
    attacker_kind: ActorKind,
    attacker_centre: (f32, f32),
    hit: &PendingHit,
    events: &mut Vec<DamageEvent>,
) {
    let mut visited: BTreeSet<ActorId> = BTreeSet::new();
    let ids: Vec<ActorId> = actors.keys().copied().collect();

    for tile in &hit.tiles {
        for target_id in &ids {
            let Some(target) = actors.get(target_id) else { continue };
            if *target_id == attacker
                || visited.contains(target_id)
                || !target.is_targetable()
                || !is_hostile(attacker_kind, target.kind())
                || !target.covers(*tile)
            {
                continue;
            }
            visited.insert(*target_id);

            let blockers = if hit.knockback > 0 {
                blockers_except(actors, *target_id)
            } else {
                Vec::new()
            };
            let Some(target) = actors.get_mut(target_id) else { continue };
            let (amount, lethal) = target.apply_damage(hit.damage);
            if hit.knockback > 0 && !lethal {
                knock_back(target, grid, attacker_centre, hit.knockback, &blockers);
            }
            events.push(DamageEvent {
                source: DamageSource::Attack { attacker, attack: hit.attack },
                target: *target_id,
                amount,
                tile: *tile,
                lethal,
            });
        }
    }
}

/// Push `target` up to `distance` tiles away from `from` (rounded
/// direction), clamped to bounds minus footprint.
///
/// The push walks one tile at a time and stops before the first wall or
/// blocker in the way.
pub fn knock_back(target: &mut Actor, grid: &Grid, from: (f32, f32), distance: i32, blockers: &[Blocker]) {
    let (cx, cy) = target.centre();
    let (dx, dy) = (cx - from.0, cy - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    let dir = if len > f32::EPSILON {
        ((dx / len).round() as i32, (dy / len).round() as i32)
    } else {
        (1, 0)
    };

    let origin = target.origin();
    let mut landing = origin;
    for d in 1..=distance {
        let next = grid.clamp_origin(origin.offset(dir.0 * d, dir.1 * d), &target.footprint);
        if next == landing || !is_free(grid, next, &target.footprint, blockers) {
            break;
        }
        landing = next;
    }

    if landing != origin {
        target.position.snap_to(grid, landing);
        target.mover.clear_path();
    }
}

/// Apply hazard hits to their targets.
pub fn apply_hazard_hits(actors: &mut BTreeMap<ActorId, Actor>, hits: &[HazardHit]) -> Vec<DamageEvent> {
    let mut events = Vec::with_capacity(hits.len());
    for hit in hits {
        let Some(target) = actors.get_mut(&hit.target) else { continue };
        if !target.is_targetable() {
            continue;
        }
        let (amount, lethal) = target.apply_damage(hit.damage);
        events.push(DamageEvent {
            source: DamageSource::Hazard(hit.source),
            target: hit.target,
            amount,
            tile: hit.tile,
            lethal,
        });
    }
    events
}
