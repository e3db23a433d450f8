//! Ground Hazards
//!
//! Persistent fire/poison pools keyed by tile. At most one record exists per
//! tile; seeding an occupied tile extends the existing pool instead of
//! stacking a second one.
//!
//! The types shared by all three hazard systems (ground, laser, portal) also
//! live here: the tracked [`HazardTarget`] and the [`HazardHit`] they emit.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::core::grid::{Footprint, Grid, TilePos};
use crate::game::actor::ActorId;

/// Ground hazard kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HazardKind {
    /// Left by the boss slam
    Fire = 0,
    /// Left by bounce landings
    Poison = 1,
}

/// Which hazard system produced a hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardSource {
    /// Ground pool
    Ground(HazardKind),
    /// Laser line sweep
    Laser,
    /// Portal band dash
    Portal,
}

/// The single actor hazard systems test against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardTarget {
    /// Actor id
    pub id: ActorId,
    /// Footprint origin
    pub origin: TilePos,
    /// Footprint
    pub footprint: Footprint,
    /// Airborne; every hazard system skips the target
    pub immune: bool,
}

impl HazardTarget {
    /// Does the target cover `tile`?
    #[inline]
    pub fn covers(&self, tile: TilePos) -> bool {
        self.footprint.contains(self.origin, tile)
    }
}

/// Damage a hazard system wants applied to its target.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardHit {
    /// Producer
    pub source: HazardSource,
    /// Target actor
    pub target: ActorId,
    /// Tile the hit registered on
    pub tile: TilePos,
    /// Damage amount
    pub damage: i32,
}

// =============================================================================
// GROUND HAZARD
// =============================================================================

/// One ground pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Tile
    pub position: TilePos,
    /// Kind
    pub kind: HazardKind,
    /// Seconds left (removed at <= 0)
    pub remaining: f32,
    /// Longest duration this record has been given (for fades)
    pub max_duration: f32,
    /// Seconds until the next damage application
    pub tick_countdown: f32,
    /// Damage per application
    pub damage_per_tick: i32,
}

/// All ground pools.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GroundHazards {
    hazards: BTreeMap<TilePos, Hazard>,
    tick_interval: f32,
}

impl GroundHazards {
    /// Empty set with the given damage interval.
    pub fn new(tick_interval: f32) -> Self {
        Self { hazards: BTreeMap::new(), tick_interval }
    }

    /// Add or extend the pool at `tile`.
    ///
    /// An existing pool keeps its kind and damage; only its duration grows
    /// to `max(current, duration)`. Returns true when a new record was made.
    pub fn add_hazard(&mut self, tile: TilePos, kind: HazardKind, duration: f32, damage_per_tick: i32) -> bool {
        match self.hazards.get_mut(&tile) {
            Some(existing) => {
                existing.remaining = existing.remaining.max(duration);
                existing.max_duration = existing.max_duration.max(existing.remaining);
                false
            }
            None => {
                self.hazards.insert(tile, Hazard {
                    position: tile,
                    kind,
                    remaining: duration,
                    max_duration: duration,
                    // First contact damages immediately
                    tick_countdown: 0.0,
                    damage_per_tick,
                });
                true
            }
        }
    }

    /// Seed pools over `tiles`, skipping anything off the grid.
    ///
    /// Returns the number of new records.
    pub fn seed_hazards(
        &mut self,
        grid: &Grid,
        tiles: &[TilePos],
        kind: HazardKind,
        duration: f32,
        damage_per_tick: i32,
    ) -> usize {
        tiles
            .iter()
            .filter(|t| grid.in_bounds(**t))
            .filter(|t| self.add_hazard(**t, kind, duration, damage_per_tick))
            .count()
    }

    /// Pool at a tile.
    pub fn get(&self, tile: TilePos) -> Option<&Hazard> {
        self.hazards.get(&tile)
    }

    /// Number of pools.
    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    /// No pools.
    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }

    /// Pools in tile order.
    pub fn iter(&self) -> impl Iterator<Item = &Hazard> {
        self.hazards.values()
    }

    /// Owned copy for the presentation layer.
    pub fn snapshot(&self) -> Vec<Hazard> {
        self.hazards.values().cloned().collect()
    }

    /// Drop every pool.
    pub fn clear(&mut self) {
        self.hazards.clear();
    }

    /// Age every pool and damage the target where it stands.
    pub fn advance(&mut self, dt: f32, target: Option<&HazardTarget>, hits: &mut Vec<HazardHit>) {
        let interval = self.tick_interval;
        self.hazards.retain(|tile, hazard| {
            hazard.remaining -= dt;
            if hazard.remaining <= 0.0 {
                return false;
            }

            if let Some(target) = target {
                if !target.immune && target.covers(*tile) {
                    hazard.tick_countdown -= dt;
                    if hazard.tick_countdown <= 0.0 {
                        hazard.tick_countdown = interval;
                        hits.push(HazardHit {
                            source: HazardSource::Ground(hazard.kind),
                            target: target.id,
                            tile: *tile,
                            damage: hazard.damage_per_tick,
                        });
                    }
                }
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target_at(x: i32, y: i32) -> HazardTarget {
        HazardTarget {
            id: ActorId(1),
            origin: TilePos::new(x, y),
            footprint: Footprint::UNIT,
            immune: false,
        }
    }

    #[test]
    fn test_seed_twice_keeps_one_record_with_max_duration() {
        let mut hazards = GroundHazards::new(0.5);
        let tile = TilePos::new(3, 3);

        assert!(hazards.add_hazard(tile, HazardKind::Fire, 4.0, 8));
        assert!(!hazards.add_hazard(tile, HazardKind::Fire, 2.0, 8));
        assert_eq!(hazards.len(), 1);
        assert_eq!(hazards.get(tile).map(|h| h.remaining), Some(4.0));

        assert!(!hazards.add_hazard(tile, HazardKind::Fire, 6.0, 8));
        assert_eq!(hazards.len(), 1);
        let h = hazards.get(tile).unwrap();
        assert_eq!(h.remaining, 6.0);
        assert_eq!(h.max_duration, 6.0);
    }

    #[test]
    fn test_existing_kind_and_damage_kept() {
        let mut hazards = GroundHazards::new(0.5);
        let tile = TilePos::new(1, 1);
        hazards.add_hazard(tile, HazardKind::Fire, 1.0, 8);
        hazards.add_hazard(tile, HazardKind::Poison, 3.0, 2);

        let h = hazards.get(tile).unwrap();
        assert_eq!(h.kind, HazardKind::Fire);
        assert_eq!(h.damage_per_tick, 8);
        assert_eq!(h.remaining, 3.0);
    }

    #[test]
    fn test_seed_filters_out_of_bounds() {
        let grid = Grid::new(4, 4).unwrap();
        let mut hazards = GroundHazards::new(0.5);
        let tiles = [TilePos::new(0, 0), TilePos::new(-1, 0), TilePos::new(3, 4), TilePos::new(0, 0)];

        assert_eq!(hazards.seed_hazards(&grid, &tiles, HazardKind::Poison, 2.0, 3), 1);
        assert_eq!(hazards.len(), 1);
    }

    #[test]
    fn test_first_contact_damages_then_interval() {
        let mut hazards = GroundHazards::new(0.5);
        hazards.add_hazard(TilePos::new(2, 2), HazardKind::Fire, 4.0, 8);
        let target = target_at(2, 2);

        let mut hits = Vec::new();
        hazards.advance(0.1, Some(&target), &mut hits);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].damage, 8);

        // 0.4s later: countdown not yet expired
        for _ in 0..4 {
            hazards.advance(0.1, Some(&target), &mut hits);
        }
        assert_eq!(hits.len(), 1);

        hazards.advance(0.11, Some(&target), &mut hits);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_immune_and_absent_target_take_nothing() {
        let mut hazards = GroundHazards::new(0.5);
        hazards.add_hazard(TilePos::new(2, 2), HazardKind::Poison, 4.0, 5);

        let mut airborne = target_at(2, 2);
        airborne.immune = true;

        let mut hits = Vec::new();
        hazards.advance(0.1, Some(&airborne), &mut hits);
        hazards.advance(0.1, Some(&target_at(5, 5)), &mut hits);
        hazards.advance(0.1, None, &mut hits);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_expired_pools_removed() {
        let mut hazards = GroundHazards::new(0.5);
        hazards.add_hazard(TilePos::new(0, 0), HazardKind::Fire, 0.3, 8);
        hazards.add_hazard(TilePos::new(1, 0), HazardKind::Fire, 1.0, 8);

        let mut hits = Vec::new();
        hazards.advance(0.3, None, &mut hits);
        assert_eq!(hazards.len(), 1);
        assert!(hazards.get(TilePos::new(0, 0)).is_none());

        // A pool that expires this tick does not damage
        hazards.advance(0.8, Some(&target_at(1, 0)), &mut hits);
        assert!(hazards.is_empty());
        assert!(hits.is_empty());
    }
}
