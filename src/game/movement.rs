//! Movement & Pathfinding
//!
//! Actors walk tile by tile (8 directions) toward a destination while their
//! smooth position interpolates between tiles. When the direct step is
//! blocked, an A* search over the grid finds a detour around the other
//! actors' footprints. No route is a normal outcome: the actor holds still.

use std::collections::VecDeque;
use pathfinding::prelude::astar;
use serde::{Serialize, Deserialize};

use crate::core::grid::{Footprint, Grid, GridPosition, TilePos};
use crate::game::actor::ActorId;
use crate::game::config::MovementConfig;

/// A footprint other actors may not step into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blocker {
    /// Owner
    pub id: ActorId,
    /// Footprint origin
    pub origin: TilePos,
    /// Footprint
    pub footprint: Footprint,
}

/// Would `footprint` at `origin` overlap any blocker?
pub fn is_blocked(origin: TilePos, footprint: &Footprint, blockers: &[Blocker]) -> bool {
    blockers
        .iter()
        .any(|b| footprint.overlaps(origin, &b.footprint, b.origin))
}

/// Can `footprint` stand at `origin`: on walkable tiles and clear of blockers?
#[inline]
pub fn is_free(grid: &Grid, origin: TilePos, footprint: &Footprint, blockers: &[Blocker]) -> bool {
    grid.footprint_fits(origin, footprint) && !is_blocked(origin, footprint, blockers)
}

const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0), (-1, 0), (0, 1), (0, -1),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

/// A* from `start` to `dest` for an actor of `footprint`.
///
/// 8-directional, unit step cost, Manhattan heuristic. Returns the
/// waypoints after `start` (ending at `dest`), or None when no route exists.
pub fn find_path(
    grid: &Grid,
    start: TilePos,
    dest: TilePos,
    footprint: &Footprint,
    blockers: &[Blocker],
) -> Option<Vec<TilePos>> {
    let (path, _cost) = astar(
        &start,
        |&tile| {
            NEIGHBOURS
                .iter()
                .map(move |(dx, dy)| tile.offset(*dx, *dy))
                .filter(|n| is_free(grid, *n, footprint, blockers))
                .map(|n| (n, 1u32))
                .collect::<Vec<_>>()
        },
        |&tile| tile.manhattan(dest),
        |&tile| tile == dest,
    )?;
    Some(path.into_iter().skip(1).collect())
}

/// Nearest origin from which `footprint` is orthogonally adjacent to `target`.
///
/// Corner-adjacent placements are skipped so directional attacks facing the
/// target actually cover it. Walls are respected; other actors are not.
pub fn approach_goal(grid: &Grid, origin: TilePos, footprint: &Footprint, target: TilePos) -> Option<TilePos> {
    let mut best: Option<(u32, u32, TilePos)> = None;

    for oy in (target.y - footprint.height)..=(target.y + 1) {
        for ox in (target.x - footprint.width)..=(target.x + 1) {
            let candidate = TilePos::new(ox, oy);
            let in_x = target.x >= ox && target.x < ox + footprint.width;
            let in_y = target.y >= oy && target.y < oy + footprint.height;
            // Covering the target, or touching only at a corner
            if in_x == in_y {
                continue;
            }
            if !grid.footprint_fits(candidate, footprint) {
                continue;
            }
            let key = (origin.chebyshev(candidate), origin.manhattan(candidate), candidate);
            if best.map_or(true, |b| key < b) {
                best = Some(key);
            }
        }
    }
    best.map(|(_, _, tile)| tile)
}

/// What one movement update did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// No destination
    Idle,
    /// Travelling toward the next tile
    Moving,
    /// Blocked; holding this tick
    Waiting,
    /// A detour of this many waypoints was found
    Repathed(usize),
    /// Destination reached
    Arrived,
    /// No route; destination dropped
    Halted,
}

/// Per-actor movement state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mover {
    target: Option<TilePos>,
    waypoints: VecDeque<TilePos>,
    step: Option<TilePos>,
    repath_timer: f32,
    facing: (i32, i32),
}

impl Default for Mover {
    fn default() -> Self {
        Self::new()
    }
}

impl Mover {
    /// At rest, facing +X.
    pub fn new() -> Self {
        Self {
            target: None,
            waypoints: VecDeque::new(),
            step: None,
            repath_timer: 0.0,
            facing: (1, 0),
        }
    }

    /// Final destination.
    pub fn target(&self) -> Option<TilePos> {
        self.target
    }

    /// Tile currently being entered.
    pub fn step(&self) -> Option<TilePos> {
        self.step
    }

    /// Remaining detour waypoints.
    pub fn waypoints(&self) -> impl Iterator<Item = &TilePos> {
        self.waypoints.iter()
    }

    /// Following a detour?
    pub fn is_mid_path(&self) -> bool {
        !self.waypoints.is_empty()
    }

    /// Has a destination or an unfinished step.
    pub fn is_moving(&self) -> bool {
        self.target.is_some() || self.step.is_some()
    }

    /// Last step direction.
    pub fn facing(&self) -> (i32, i32) {
        self.facing
    }

    /// Set a new destination; any detour toward the old one is dropped.
    pub fn set_target(&mut self, dest: TilePos) {
        if self.target != Some(dest) {
            self.target = Some(dest);
            self.waypoints.clear();
        }
    }

    /// Drop destination and detour. A step in progress still completes.
    pub fn stop(&mut self) {
        self.target = None;
        self.waypoints.clear();
    }

    /// Drop everything, including the step in progress.
    pub fn clear_path(&mut self) {
        self.stop();
        self.step = None;
    }

    /// Advance one tick.
    #[allow(clippy::too_many_arguments)]
    pub fn advance(
        &mut self,
        position: &mut GridPosition,
        footprint: &Footprint,
        grid: &Grid,
        blockers: &[Blocker],
        speed: f32,
        dt: f32,
        config: &MovementConfig,
    ) -> MoveOutcome {
        self.repath_timer = (self.repath_timer - dt).max(0.0);

        if self.step.is_none() {
            let here = position.tile();
            let goal = loop {
                let goal = match (self.waypoints.front(), self.target) {
                    (Some(w), _) => *w,
                    (None, Some(t)) => t,
                    (None, None) => return MoveOutcome::Idle,
                };
                if here != goal {
                    break goal;
                }
                if self.waypoints.pop_front().is_none() {
                    self.target = None;
                    return MoveOutcome::Arrived;
                }
            };

            let dir = ((goal.x - here.x).signum(), (goal.y - here.y).signum());
            let next = here.offset(dir.0, dir.1);

            if is_free(grid, next, footprint, blockers) {
                self.step = Some(next);
                self.facing = dir;
            } else if self.is_mid_path() {
                // Detour went stale; search again once the cooldown allows
                self.waypoints.clear();
                return MoveOutcome::Waiting;
            } else if self.repath_timer > 0.0 {
                return MoveOutcome::Waiting;
            } else {
                self.repath_timer = config.repath_cooldown;
                let Some(dest) = self.target else { return MoveOutcome::Idle };
                return match find_path(grid, here, dest, footprint, blockers) {
                    Some(path) if !path.is_empty() => {
                        let len = path.len();
                        self.waypoints = path.into();
                        MoveOutcome::Repathed(len)
                    }
                    _ => {
                        self.target = None;
                        MoveOutcome::Halted
                    }
                };
            }
        }

        let Some(step) = self.step else { return MoveOutcome::Waiting };
        let (sx, sy) = position.smooth();
        let (tx, ty) = step.to_f32();
        let (dx, dy) = (tx - sx, ty - sy);
        let dist = (dx * dx + dy * dy).sqrt();
        let travel = speed * dt;

        if dist - travel <= config.snap_epsilon {
            position.snap_to(grid, step);
            self.step = None;
        } else {
            position.set_smooth(sx + dx / dist * travel, sy + dy / dist * travel);
        }
        MoveOutcome::Moving
    }
}
