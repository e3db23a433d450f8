//! Boss Behaviour
//!
//! Attack selection by strict priority, bounce travel, phase transition and
//! the one-shot escort call.
//!
//! Selection (first match wins, once per tick while idle):
//! 1. target at least `FAR_THRESHOLD` away and Bounce ready -> Bounce
//! 2. target within `CLOSE_DISTANCE` for `CHARGE_DURATION` and Shockwave
//!    ready -> Shockwave (the close timer resets)
//! 3. the rest by ascending range: first whose range covers the distance
//!
//! Nothing qualifies: the boss walks toward the target instead. An attack
//! that qualifies while a walking step is still in progress is held until
//! the boss stands on its tile.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::grid::{Footprint, Grid, GridPosition, TilePos};
use crate::game::actor::Health;
use crate::game::attack::{AttackKind, AttackPhase, AttackState, BossAttack};
use crate::game::hazard::GroundHazards;
use crate::game::movement::{approach_goal, is_free, Blocker};
use crate::game::pattern::{generate, BounceZones};

/// Distance at or beyond which Bounce is preferred.
pub const FAR_THRESHOLD: f32 = 7.0;

/// Distance counted as "close" for the Shockwave charge.
pub const CLOSE_DISTANCE: f32 = 2.5;

/// Seconds the target must stay close before Shockwave.
pub const CHARGE_DURATION: f32 = 1.5;

/// Health fraction at which Phase Two begins.
pub const PHASE_TWO_THRESHOLD: f32 = 0.5;

/// Health fraction at which the escort is called.
pub const ESCORT_THRESHOLD: f32 = 0.6;

/// Cooldown multiplier in Phase Two.
pub const PHASE_TWO_COOLDOWN_SCALE: f32 = 0.75;

/// Boss phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    /// Opening phase
    One,
    /// Below half health: portal dash, then lasers
    Two,
}

/// What the boss did this tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BossStep {
    /// Attack selected
    pub started: Option<BossAttack>,
    /// Telegraph ended
    pub execute_started: bool,
    /// Bounce stages that landed
    pub landed: Vec<usize>,
    /// Attack finished
    pub finished: Option<BossAttack>,
    /// New ground hazard records
    pub seeded: usize,
    /// Walk here instead of attacking
    pub approach: Option<TilePos>,
    /// An attack is due but a step is unfinished: stop walking
    pub holding: bool,
}

/// Boss brain.
#[derive(Clone, Debug)]
pub struct BossBrain {
    /// Attack machine
    pub attack: AttackState<BossAttack>,
    phase: BossPhase,
    close_timer: f32,
    escort_called: bool,
    hidden: bool,
    bounce_from: TilePos,
}

impl Default for BossBrain {
    fn default() -> Self {
        Self::new()
    }
}

impl BossBrain {
    /// Phase One, everything ready.
    pub fn new() -> Self {
        Self {
            attack: AttackState::new(),
            phase: BossPhase::One,
            close_timer: 0.0,
            escort_called: false,
            hidden: false,
            bounce_from: TilePos::default(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    /// Off the field during the portal dash.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Others may walk through: hidden, or mid-bounce.
    pub fn is_passable(&self) -> bool {
        self.hidden
            || (self.attack.kind() == Some(BossAttack::Bounce) && self.attack.phase() == AttackPhase::Execute)
    }

    /// Seconds the target has been continuously close.
    pub fn close_timer(&self) -> f32 {
        self.close_timer
    }

    /// Pick an attack for `distance`, or None to approach.
    pub fn select_attack(&self, distance: f32) -> Option<BossAttack> {
        let ready = |k: BossAttack| self.attack.is_ready(k);

        if distance >= FAR_THRESHOLD && ready(BossAttack::Bounce) {
            return Some(BossAttack::Bounce);
        }
        if self.close_timer >= CHARGE_DURATION && ready(BossAttack::Shockwave) {
            return Some(BossAttack::Shockwave);
        }

        let mut rest: Vec<BossAttack> = BossAttack::ALL
            .iter()
            .copied()
            .filter(|k| !matches!(k, BossAttack::Bounce | BossAttack::Shockwave))
            .collect();
        rest.sort_by(|a, b| a.config().range.total_cmp(&b.config().range));
        rest.into_iter().find(|k| distance <= k.config().range && ready(*k))
    }

    /// Update timers, run the attack machine, select or approach.
    ///
    /// `blockers` are the other actors' footprints (bounce landings must be
    /// clear of them). `mid_step` is true while the mover is between tiles.
    #[allow(clippy::too_many_arguments)]
    pub fn think(
        &mut self,
        dt: f32,
        grid: &Grid,
        position: &mut GridPosition,
        footprint: &Footprint,
        target: TilePos,
        hazards: &mut GroundHazards,
        blockers: &[Blocker],
        mid_step: bool,
    ) -> BossStep {
        let mut step = BossStep::default();
        let origin = position.tile();
        let distance = origin.distance(target);

        self.attack.tick_cooldowns(dt);
        if distance <= CLOSE_DISTANCE {
            self.close_timer += dt;
        } else {
            self.close_timer = 0.0;
        }

        if self.hidden {
            return step;
        }

        if let Some(kind) = self.attack.kind() {
            self.run_attack(kind, dt, grid, position, footprint, hazards, blockers, &mut step);
            return step;
        }

        match self.select_attack(distance) {
            Some(_) if mid_step => step.holding = true,
            Some(kind) => {
                let tiles = generate(kind.shape(), grid, origin, footprint, target);
                if self.attack.begin(kind, tiles) {
                    debug!(?kind, distance, "Boss attack selected");
                    if kind == BossAttack::Shockwave {
                        self.close_timer = 0.0;
                    }
                    if kind == BossAttack::Bounce {
                        self.bounce_from = origin;
                    }
                    step.started = Some(kind);
                }
            }
            None => {
                step.approach = approach_goal(grid, origin, footprint, target);
            }
        }
        step
    }

    #[allow(clippy::too_many_arguments)]
    fn run_attack(
        &mut self,
        kind: BossAttack,
        dt: f32,
        grid: &Grid,
        position: &mut GridPosition,
        footprint: &Footprint,
        hazards: &mut GroundHazards,
        blockers: &[Blocker],
        step: &mut BossStep,
    ) {
        // Advancing past execute clears the cached tiles; keep what the
        // ground effect needs
        let effect = kind.ground_effect();
        let flat_tiles = if effect.is_some() && !kind.is_multi_stage() {
            self.attack.hit_tiles().to_vec()
        } else {
            Vec::new()
        };
        let zones: Option<BounceZones> = self.attack.stages().cloned();

        let adv = self.attack.advance(dt);
        step.execute_started = adv.execute_started;

        if let Some(zones) = &zones {
            for &stage in &adv.landed {
                if let Some(landing) = zones.landings.get(stage) {
                    // Walls and other actors refuse the landing; the boss stays put
                    if is_free(grid, *landing, footprint, blockers) {
                        position.snap_to(grid, *landing);
                    }
                }
                if let (Some(effect), Some(zone)) = (effect, zones.zones.get(stage)) {
                    step.seeded += hazards.seed_hazards(grid, zone, effect.kind, effect.duration, effect.damage_per_tick);
                }
            }
            step.landed = adv.landed.clone();

            if let Some((idx, t)) = self.attack.stage_progress() {
                let from = if idx == 0 { self.bounce_from } else { zones.landings[idx - 1] };
                let to = zones.landings[idx];
                let (fx, fy) = from.to_f32();
                let (tx, ty) = to.to_f32();
                position.set_smooth(fx + (tx - fx) * t, fy + (ty - fy) * t);
            }
        }

        if let Some(done) = adv.finished {
            if let Some(effect) = effect.filter(|_| !done.is_multi_stage()) {
                step.seeded += hazards.seed_hazards(grid, &flat_tiles, effect.kind, effect.duration, effect.damage_per_tick);
            }
            // Settle the smooth position on the resting tile
            let rest = position.tile();
            position.snap_to(grid, rest);
            step.finished = Some(done);
        }
    }

    /// Enter Phase Two at half health. Returns the transition when it happens.
    ///
    /// The current attack is abandoned, later cooldowns shrink and the boss
    /// hides until the portal dash completes.
    pub fn check_phase(&mut self, health: &Health) -> Option<(BossPhase, BossPhase)> {
        if self.phase != BossPhase::One || health.fraction() > PHASE_TWO_THRESHOLD {
            return None;
        }
        self.phase = BossPhase::Two;
        self.attack.interrupt();
        self.attack.set_cooldown_scale(PHASE_TWO_COOLDOWN_SCALE);
        self.close_timer = 0.0;
        self.hidden = true;
        info!("Boss entered phase two");
        Some((BossPhase::One, BossPhase::Two))
    }

    /// True exactly once: the first time health is at or below the escort threshold.
    pub fn should_spawn_escort(&mut self, health: &Health) -> bool {
        if self.escort_called || health.fraction() > ESCORT_THRESHOLD {
            return false;
        }
        self.escort_called = true;
        true
    }

    /// Return to the field after the portal dash.
    pub fn reveal(&mut self) {
        self.hidden = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::actor::ActorId;

    fn setup(origin: TilePos) -> (Grid, GridPosition, Footprint, GroundHazards) {
        let grid = Grid::new(20, 12).unwrap();
        let pos = GridPosition::new(&grid, origin).unwrap();
        (grid, pos, Footprint::new(2, 2), GroundHazards::new(0.5))
    }

    #[test]
    fn test_far_target_selects_bounce() {
        let brain = BossBrain::new();
        assert_eq!(brain.select_attack(7.0), Some(BossAttack::Bounce));
        assert_eq!(brain.select_attack(9.5), Some(BossAttack::Bounce));
    }

    #[test]
    fn test_range_scan_is_ascending() {
        let brain = BossBrain::new();
        // Wave (4.5) before Slam (8.0)
        assert_eq!(brain.select_attack(4.0), Some(BossAttack::Wave));
        assert_eq!(brain.select_attack(5.0), Some(BossAttack::Slam));
        // Close but not charged: no Shockwave yet
        assert_eq!(brain.select_attack(1.0), Some(BossAttack::Wave));
    }

    #[test]
    fn test_cooldowns_fall_through_to_approach() {
        let mut brain = BossBrain::new();
        let (grid, mut pos, fp, mut hazards) = setup(TilePos::new(2, 5));
        let target = TilePos::new(6, 5);

        let step = brain.think(0.016, &grid, &mut pos, &fp, target, &mut hazards, &[], false);
        assert_eq!(step.started, Some(BossAttack::Wave));

        // Run the wave out; its cooldown is still running
        for _ in 0..200 {
            brain.think(0.016, &grid, &mut pos, &fp, target, &mut hazards, &[], false);
            if !brain.attack.is_attacking() {
                break;
            }
        }
        assert!(!brain.attack.is_ready(BossAttack::Wave));
        // 4.0 away: Slam covers it
        let step = brain.think(0.016, &grid, &mut pos, &fp, target, &mut hazards, &[], false);
        assert_eq!(step.started, Some(BossAttack::Slam));
    }

    #[test]
    fn test_shockwave_after_charge() {
        let mut brain = BossBrain::new();
        let (grid, mut pos, fp, mut hazards) = setup(TilePos::new(5, 5));
        let target = TilePos::new(7, 5);

        // Burn the Wave so the close timer can build while idle
        brain.attack.begin(BossAttack::Wave, generate(BossAttack::Wave.shape(), &grid, pos.tile(), &fp, target));
        brain.attack.interrupt();
        brain.attack.begin(BossAttack::Slam, generate(BossAttack::Slam.shape(), &grid, pos.tile(), &fp, target));
        brain.attack.interrupt();

        let mut started = None;
        for _ in 0..100 {
            let step = brain.think(0.05, &grid, &mut pos, &fp, target, &mut hazards, &[], false);
            if step.started.is_some() {
                started = step.started;
                break;
            }
        }
        assert_eq!(started, Some(BossAttack::Shockwave));
        assert_eq!(brain.close_timer(), 0.0);
    }

    #[test]
    fn test_slam_seeds_fire_on_finish() {
        let mut brain = BossBrain::new();
        let (grid, mut pos, fp, mut hazards) = setup(TilePos::new(2, 5));
        let target = TilePos::new(8, 5);

        let step = brain.think(0.016, &grid, &mut pos, &fp, target, &mut hazards, &[], false);
        assert_eq!(step.started, Some(BossAttack::Slam));

        let mut seeded = 0;
        for _ in 0..200 {
            let step = brain.think(0.05, &grid, &mut pos, &fp, target, &mut hazards, &[], false);
            seeded += step.seeded;
            if step.finished.is_some() {
                break;
            }
        }
        assert_eq!(seeded, 13);
        assert_eq!(hazards.len(), 13);
        assert!(hazards.iter().all(|h| h.kind == crate::game::hazard::HazardKind::Fire));
    }

    #[test]
    fn test_bounce_travels_and_lands_each_stage() {
        let mut brain = BossBrain::new();
        let (grid, mut pos, fp, mut hazards) = setup(TilePos::new(1, 5));
        let target = TilePos::new(15, 5);

        let step = brain.think(0.016, &grid, &mut pos, &fp, target, &mut hazards, &[], false);
        assert_eq!(step.started, Some(BossAttack::Bounce));

        let mut landed = Vec::new();
        let mut passable_seen = false;
        for _ in 0..400 {
            let step = brain.think(0.02, &grid, &mut pos, &fp, target, &mut hazards, &[], false);
            passable_seen |= brain.is_passable();
            landed.extend(step.landed);
            if step.finished.is_some() {
                break;
            }
        }
        assert_eq!(landed, vec![0, 1, 2]);
        assert!(passable_seen);
        assert!(!brain.is_passable());
        assert_eq!(pos.tile(), TilePos::new(10, 5));
        assert_eq!(pos.smooth(), (10.0, 5.0));
        assert!(!hazards.is_empty());
    }

    #[test]
    fn test_bounce_landing_refused_by_an_actor() {
        let mut brain = BossBrain::new();
        let (grid, mut pos, fp, mut hazards) = setup(TilePos::new(1, 5));
        let target = TilePos::new(15, 5);
        // A rock sits on the last landing
        let rock = [Blocker { id: ActorId(9), origin: TilePos::new(11, 6), footprint: Footprint::UNIT }];

        let step = brain.think(0.016, &grid, &mut pos, &fp, target, &mut hazards, &rock, false);
        assert_eq!(step.started, Some(BossAttack::Bounce));

        let mut landed = Vec::new();
        for _ in 0..400 {
            let step = brain.think(0.02, &grid, &mut pos, &fp, target, &mut hazards, &rock, false);
            landed.extend(step.landed);
            if step.finished.is_some() {
                break;
            }
        }
        assert_eq!(landed, vec![0, 1, 2]);
        assert_eq!(pos.tile(), TilePos::new(7, 5));
        assert_eq!(pos.smooth(), (7.0, 5.0));
    }

    #[test]
    fn test_selection_waits_for_the_step_to_finish() {
        let mut brain = BossBrain::new();
        let (grid, mut pos, fp, mut hazards) = setup(TilePos::new(2, 5));
        let target = TilePos::new(6, 5);

        let step = brain.think(0.016, &grid, &mut pos, &fp, target, &mut hazards, &[], true);
        assert!(step.holding);
        assert_eq!(step.started, None);
        assert_eq!(step.approach, None);
        assert!(!brain.attack.is_attacking());

        let step = brain.think(0.016, &grid, &mut pos, &fp, target, &mut hazards, &[], false);
        assert!(!step.holding);
        assert_eq!(step.started, Some(BossAttack::Wave));
    }

    #[test]
    fn test_phase_two_interrupts_and_hides() {
        let mut brain = BossBrain::new();
        let (grid, mut pos, fp, mut hazards) = setup(TilePos::new(2, 5));
        brain.think(0.016, &grid, &mut pos, &fp, TilePos::new(6, 5), &mut hazards, &[], false);
        assert!(brain.attack.is_attacking());

        let mut hp = Health::new(400).unwrap();
        hp.set(201);
        assert_eq!(brain.check_phase(&hp), None);
        hp.set(200);
        assert_eq!(brain.check_phase(&hp), Some((BossPhase::One, BossPhase::Two)));
        assert!(!brain.attack.is_attacking());
        assert!(brain.is_hidden());
        assert_eq!(brain.check_phase(&hp), None);

        // Hidden: no selection, no approach
        let step = brain.think(0.016, &grid, &mut pos, &fp, TilePos::new(6, 5), &mut hazards, &[], false);
        assert_eq!(step, BossStep::default());

        brain.reveal();
        assert!(!brain.is_hidden());
    }

    #[test]
    fn test_escort_called_once() {
        let mut brain = BossBrain::new();
        let mut hp = Health::new(100).unwrap();
        assert!(!brain.should_spawn_escort(&hp));
        hp.set(60);
        assert!(brain.should_spawn_escort(&hp));
        assert!(!brain.should_spawn_escort(&hp));
        hp.set(10);
        assert!(!brain.should_spawn_escort(&hp));
    }
}
