//! Attack State Machine
//!
//! Timed per-actor attacks: idle -> telegraph -> execute -> idle.
//!
//! Attack kinds are closed enums with an exhaustive config lookup, and the
//! per-kind cooldowns live in a fixed-size array indexed by the kind. The
//! machine never touches other actors; it queues [`PendingHit`]s that the
//! combat resolver drains once per tick.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::grid::TilePos;
use crate::game::hazard::HazardKind;
use crate::game::pattern::{
    AttackTiles, BounceZones, PatternShape,
    BOUNCE_STAGES, BOUNCE_STEP, WAVE_DEPTH, WAVE_WIDTH,
};

// =============================================================================
// CONFIG TABLE TYPES
// =============================================================================

/// Per-kind attack tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackConfig {
    /// Damage per hit (per stage for multi-stage kinds)
    pub damage: i32,
    /// Telegraph duration (seconds)
    pub telegraph: f32,
    /// Execute duration (seconds)
    pub execute: f32,
    /// Cooldown started when the attack is selected (seconds)
    pub cooldown: f32,
    /// Trigger range (tiles)
    pub range: f32,
}

/// Terrain left behind by an attack.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundEffect {
    /// Hazard kind seeded
    pub kind: HazardKind,
    /// Hazard lifetime (seconds)
    pub duration: f32,
    /// Damage per hazard tick
    pub damage_per_tick: i32,
}

/// Current attack phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackPhase {
    /// Not attacking
    #[default]
    None,
    /// Warning; tiles fixed and visible
    Telegraph,
    /// Damage applies
    Execute,
}

/// A closed set of attack kinds with a config table.
pub trait AttackKind: Copy + Eq + fmt::Debug + 'static {
    /// Enum-indexed cooldown table (a fixed-size array).
    type Cooldowns: Default + Clone + fmt::Debug + AsRef<[f32]> + AsMut<[f32]>;

    /// Every kind, in declaration order.
    const ALL: &'static [Self];

    /// Index into the cooldown table.
    fn index(self) -> usize;

    /// Tuning for this kind.
    fn config(self) -> AttackConfig;

    /// Tile geometry for this kind.
    fn shape(self) -> PatternShape;

    /// Umbrella id for events and snapshots.
    fn id(self) -> AttackId;

    /// Terrain seeded when the attack ends (or per stage when multi-stage).
    fn ground_effect(self) -> Option<GroundEffect> {
        None
    }

    /// Tiles a hit target is pushed away.
    fn knockback(self) -> i32 {
        0
    }

    /// Hits land in ordered stages rather than all at once.
    fn is_multi_stage(self) -> bool {
        matches!(self.shape(), PatternShape::Bounce { .. })
    }
}

// =============================================================================
// ATTACK KINDS
// =============================================================================

/// Boss attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BossAttack {
    /// Directional band in front of the boss
    Wave = 0,
    /// Cross on the target; leaves fire
    Slam = 1,
    /// Ring around the boss
    Shockwave = 2,
    /// Three leaps toward the target; leaves poison, knocks back
    Bounce = 3,
}

impl AttackKind for BossAttack {
    type Cooldowns = [f32; 4];

    const ALL: &'static [Self] = &[
        BossAttack::Wave,
        BossAttack::Slam,
        BossAttack::Shockwave,
        BossAttack::Bounce,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn config(self) -> AttackConfig {
        match self {
            BossAttack::Wave => AttackConfig { damage: 14, telegraph: 0.8, execute: 0.3, cooldown: 3.0, range: 4.5 },
            BossAttack::Slam => AttackConfig { damage: 20, telegraph: 1.1, execute: 0.4, cooldown: 5.0, range: 8.0 },
            BossAttack::Shockwave => AttackConfig { damage: 16, telegraph: 1.0, execute: 0.3, cooldown: 6.0, range: 2.5 },
            BossAttack::Bounce => AttackConfig { damage: 18, telegraph: 1.2, execute: 1.5, cooldown: 8.0, range: 7.0 },
        }
    }

    fn shape(self) -> PatternShape {
        match self {
            BossAttack::Wave => PatternShape::Band { depth: WAVE_DEPTH, width: WAVE_WIDTH },
            BossAttack::Slam => PatternShape::Cross,
            BossAttack::Shockwave => PatternShape::Ring { radius: 2 },
            BossAttack::Bounce => PatternShape::Bounce { stages: BOUNCE_STAGES, step: BOUNCE_STEP },
        }
    }

    fn id(self) -> AttackId {
        AttackId::Boss(self)
    }

    fn ground_effect(self) -> Option<GroundEffect> {
        match self {
            BossAttack::Slam => Some(GroundEffect { kind: HazardKind::Fire, duration: 4.0, damage_per_tick: 8 }),
            BossAttack::Bounce => Some(GroundEffect { kind: HazardKind::Poison, duration: 3.0, damage_per_tick: 5 }),
            BossAttack::Wave | BossAttack::Shockwave => None,
        }
    }

    fn knockback(self) -> i32 {
        match self {
            BossAttack::Bounce => 2,
            _ => 0,
        }
    }
}

/// Minion attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MinionAttack {
    /// Single tile in front
    Melee = 0,
}

impl AttackKind for MinionAttack {
    type Cooldowns = [f32; 1];

    const ALL: &'static [Self] = &[MinionAttack::Melee];

    fn index(self) -> usize {
        self as usize
    }

    fn config(self) -> AttackConfig {
        match self {
            MinionAttack::Melee => AttackConfig { damage: 6, telegraph: 0.5, execute: 0.2, cooldown: 1.5, range: 1.0 },
        }
    }

    fn shape(self) -> PatternShape {
        match self {
            MinionAttack::Melee => PatternShape::Band { depth: 1, width: 1 },
        }
    }

    fn id(self) -> AttackId {
        AttackId::Minion(self)
    }
}

/// Player attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerAttack {
    /// Three tiles in front, toward the aim
    Slash = 0,
    /// Ring around the player
    Whirl = 1,
}

impl AttackKind for PlayerAttack {
    type Cooldowns = [f32; 2];

    const ALL: &'static [Self] = &[PlayerAttack::Slash, PlayerAttack::Whirl];

    fn index(self) -> usize {
        self as usize
    }

    fn config(self) -> AttackConfig {
        match self {
            PlayerAttack::Slash => AttackConfig { damage: 12, telegraph: 0.05, execute: 0.1, cooldown: 0.45, range: 1.0 },
            PlayerAttack::Whirl => AttackConfig { damage: 9, telegraph: 0.15, execute: 0.2, cooldown: 2.5, range: 1.0 },
        }
    }

    fn shape(self) -> PatternShape {
        match self {
            PlayerAttack::Slash => PatternShape::Band { depth: 1, width: 3 },
            PlayerAttack::Whirl => PatternShape::Ring { radius: 1 },
        }
    }

    fn id(self) -> AttackId {
        AttackId::Player(self)
    }
}

/// Any attack kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttackId {
    /// Boss attack
    Boss(BossAttack),
    /// Minion attack
    Minion(MinionAttack),
    /// Player attack
    Player(PlayerAttack),
}

// =============================================================================
// PENDING HIT
// =============================================================================

/// One-shot "apply this damage on the next resolution pass" signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingHit {
    /// Which attack produced it
    pub attack: AttackId,
    /// Tiles to test against target footprints
    pub tiles: Vec<TilePos>,
    /// Damage per target
    pub damage: i32,
    /// Push distance applied to hit targets (0 = none)
    pub knockback: i32,
    /// Stage index for multi-stage attacks
    pub stage: Option<usize>,
}

/// What changed during one [`AttackState::advance`].
#[derive(Clone, Debug, PartialEq)]
pub struct AttackAdvance<K> {
    /// Telegraph expired this tick
    pub execute_started: bool,
    /// Stages that landed this tick, ascending
    pub landed: Vec<usize>,
    /// Attack finished this tick
    pub finished: Option<K>,
}

impl<K> Default for AttackAdvance<K> {
    fn default() -> Self {
        Self { execute_started: false, landed: Vec::new(), finished: None }
    }
}

// =============================================================================
// ATTACK STATE
// =============================================================================

/// Timed attack state for one actor (or one ability slot).
#[derive(Clone, Debug)]
pub struct AttackState<K: AttackKind> {
    kind: Option<K>,
    phase: AttackPhase,
    timer: f32,
    cooldowns: K::Cooldowns,
    cooldown_scale: f32,
    tiles: Vec<TilePos>,
    stages: Option<BounceZones>,
    stages_landed: usize,
    pending: Vec<PendingHit>,
}

impl<K: AttackKind> Default for AttackState<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: AttackKind> AttackState<K> {
    /// Idle, all cooldowns ready.
    pub fn new() -> Self {
        Self {
            kind: None,
            phase: AttackPhase::None,
            timer: 0.0,
            cooldowns: K::Cooldowns::default(),
            cooldown_scale: 1.0,
            tiles: Vec::new(),
            stages: None,
            stages_landed: 0,
            pending: Vec::new(),
        }
    }

    /// Current attack kind (None when idle).
    #[inline]
    pub fn kind(&self) -> Option<K> {
        self.kind
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    /// Telegraphing or executing.
    #[inline]
    pub fn is_attacking(&self) -> bool {
        self.phase != AttackPhase::None
    }

    /// Seconds left in the current phase.
    #[inline]
    pub fn remaining(&self) -> f32 {
        self.timer
    }

    /// Fraction of the current phase elapsed, in [0,1].
    pub fn progress(&self) -> f32 {
        let Some(kind) = self.kind else { return 0.0 };
        let cfg = kind.config();
        let total = match self.phase {
            AttackPhase::None => return 0.0,
            AttackPhase::Telegraph => cfg.telegraph,
            AttackPhase::Execute => cfg.execute,
        };
        if total <= 0.0 {
            return 1.0;
        }
        (1.0 - self.timer / total).clamp(0.0, 1.0)
    }

    /// Cached hit tiles (all stages flattened for multi-stage kinds).
    #[inline]
    pub fn hit_tiles(&self) -> &[TilePos] {
        &self.tiles
    }

    /// Ordered stage zones for multi-stage kinds.
    #[inline]
    pub fn stages(&self) -> Option<&BounceZones> {
        self.stages.as_ref()
    }

    /// Number of stages that have landed in the current execute.
    #[inline]
    pub fn stages_landed(&self) -> usize {
        self.stages_landed
    }

    /// During a multi-stage execute: (stage being travelled, progress within it).
    pub fn stage_progress(&self) -> Option<(usize, f32)> {
        let stages = self.stages.as_ref()?;
        if self.phase != AttackPhase::Execute || stages.landings.is_empty() {
            return None;
        }
        let count = stages.landings.len();
        let total = self.progress() * count as f32;
        let idx = (total.floor() as usize).min(count - 1);
        Some((idx, (total - idx as f32).clamp(0.0, 1.0)))
    }

    /// Remaining cooldown for a kind.
    #[inline]
    pub fn cooldown(&self, kind: K) -> f32 {
        self.cooldowns.as_ref()[kind.index()]
    }

    /// Cooldown elapsed for a kind.
    #[inline]
    pub fn is_ready(&self, kind: K) -> bool {
        self.cooldown(kind) <= 0.0
    }

    /// Scale applied to cooldowns started from now on.
    pub fn set_cooldown_scale(&mut self, scale: f32) {
        self.cooldown_scale = scale.max(0.0);
    }

    /// Decay every cooldown.
    pub fn tick_cooldowns(&mut self, dt: f32) {
        for cd in self.cooldowns.as_mut() {
            *cd = (*cd - dt).max(0.0);
        }
    }

    /// Start telegraphing `kind` with precomputed tiles.
    ///
    /// Refused (returns false) while another attack is running or the
    /// kind is cooling down.
    pub fn begin(&mut self, kind: K, tiles: AttackTiles) -> bool {
        if self.is_attacking() || !self.is_ready(kind) {
            return false;
        }
        let cfg = kind.config();

        self.kind = Some(kind);
        self.phase = AttackPhase::Telegraph;
        self.timer = cfg.telegraph;
        self.cooldowns.as_mut()[kind.index()] = cfg.cooldown * self.cooldown_scale;
        self.tiles = tiles.all_tiles();
        self.stages = match tiles {
            AttackTiles::Staged(zones) => Some(zones),
            AttackTiles::Flat(_) => None,
        };
        self.stages_landed = 0;
        true
    }

    /// Advance timers by `dt`.
    ///
    /// A phase that expires ends the call; leftover time is not carried
    /// into the next phase, so every phase is observed for at least one tick.
    pub fn advance(&mut self, dt: f32) -> AttackAdvance<K> {
        let mut out = AttackAdvance::default();
        let Some(kind) = self.kind else { return out };
        let cfg = kind.config();

        match self.phase {
            AttackPhase::None => {}
            AttackPhase::Telegraph => {
                self.timer -= dt;
                if self.timer <= 0.0 {
                    self.phase = AttackPhase::Execute;
                    self.timer = cfg.execute;
                    out.execute_started = true;
                    if kind.is_multi_stage() {
                        self.stages_landed = 0;
                    } else {
                        self.pending.push(PendingHit {
                            attack: kind.id(),
                            tiles: self.tiles.clone(),
                            damage: cfg.damage,
                            knockback: kind.knockback(),
                            stage: None,
                        });
                    }
                }
            }
            AttackPhase::Execute => {
                self.timer -= dt;
                if kind.is_multi_stage() {
                    self.land_stages(kind, &mut out);
                }
                if self.timer <= 0.0 {
                    self.finish();
                    out.finished = Some(kind);
                }
            }
        }
        out
    }

    /// Queue a hit for every stage whose boundary was crossed since the
    /// previous tick. The landed count only ever increases.
    fn land_stages(&mut self, kind: K, out: &mut AttackAdvance<K>) {
        let Some(stages) = self.stages.as_ref() else { return };
        let count = stages.zones.len();
        let now = ((self.progress() * count as f32).floor() as usize).min(count);

        if now > self.stages_landed {
            let cfg = kind.config();
            for stage in self.stages_landed..now {
                self.pending.push(PendingHit {
                    attack: kind.id(),
                    tiles: stages.zones[stage].clone(),
                    damage: cfg.damage,
                    knockback: kind.knockback(),
                    stage: Some(stage),
                });
                out.landed.push(stage);
            }
            self.stages_landed = now;
        }
    }

    fn finish(&mut self) {
        self.kind = None;
        self.phase = AttackPhase::None;
        self.timer = 0.0;
        self.tiles.clear();
        self.stages = None;
        self.stages_landed = 0;
    }

    /// A hit is waiting for the resolver.
    #[inline]
    pub fn has_pending_hit(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain queued hits (clears the flags).
    pub fn take_pending_hits(&mut self) -> Vec<PendingHit> {
        std::mem::take(&mut self.pending)
    }

    /// Abandon the current attack: tiles and pending hits are dropped so
    /// nothing half-applied fires later. Cooldowns are kept.
    pub fn interrupt(&mut self) {
        self.finish();
        self.pending.clear();
    }
}
