//! Laser Line Sweeps
//!
//! Full-length row/column beams spawned near the target on a timer. Each
//! beam telegraphs, then fires once on its first execute frame, then
//! disappears when execute ends.

use serde::{Serialize, Deserialize};
use tracing::trace;

use crate::core::grid::{Grid, TilePos};
use crate::core::rng::DeterministicRng;
use crate::game::config::LaserConfig;
use crate::game::hazard::{HazardHit, HazardSource, HazardTarget};

/// Line orientation shared by lasers and portal sweeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LineOrientation {
    /// Fixed y; covers every x
    Row = 0,
    /// Fixed x; covers every y
    Column = 1,
}

impl LineOrientation {
    /// The other orientation.
    pub fn flipped(self) -> Self {
        match self {
            LineOrientation::Row => LineOrientation::Column,
            LineOrientation::Column => LineOrientation::Row,
        }
    }

    /// Grid extent across lines of this orientation (height for rows).
    pub fn line_count(self, grid: &Grid) -> i32 {
        match self {
            LineOrientation::Row => grid.height(),
            LineOrientation::Column => grid.width(),
        }
    }

    /// Grid extent along a line of this orientation (width for rows).
    pub fn line_length(self, grid: &Grid) -> i32 {
        match self {
            LineOrientation::Row => grid.width(),
            LineOrientation::Column => grid.height(),
        }
    }

    /// Coordinate of `tile` across lines (y for rows).
    #[inline]
    pub fn across(self, tile: TilePos) -> i32 {
        match self {
            LineOrientation::Row => tile.y,
            LineOrientation::Column => tile.x,
        }
    }

    /// Coordinate of `tile` along a line (x for rows).
    #[inline]
    pub fn along(self, tile: TilePos) -> i32 {
        match self {
            LineOrientation::Row => tile.x,
            LineOrientation::Column => tile.y,
        }
    }

    /// Tile at (`along`, `across`) in this orientation.
    #[inline]
    pub fn tile(self, along: i32, across: i32) -> TilePos {
        match self {
            LineOrientation::Row => TilePos::new(along, across),
            LineOrientation::Column => TilePos::new(across, along),
        }
    }
}

/// Laser phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaserPhase {
    /// Warning line
    Telegraph,
    /// Beam active
    Execute,
}

/// One laser line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Laser {
    /// Row or column
    pub orientation: LineOrientation,
    /// The fixed y (row) or x (column)
    pub coordinate: i32,
    /// Current phase
    pub phase: LaserPhase,
    /// Seconds left in the phase
    pub timer: f32,
    hit_pending: bool,
}

impl Laser {
    /// Telegraphing laser.
    pub fn new(orientation: LineOrientation, coordinate: i32, telegraph: f32) -> Self {
        Self {
            orientation,
            coordinate,
            phase: LaserPhase::Telegraph,
            timer: telegraph,
            hit_pending: false,
        }
    }

    /// Covered tiles.
    pub fn tiles(&self, grid: &Grid) -> Vec<TilePos> {
        (0..self.orientation.line_length(grid))
            .map(|along| self.orientation.tile(along, self.coordinate))
            .collect()
    }

    /// Does the line cross the target's footprint?
    pub fn covers(&self, target: &HazardTarget) -> bool {
        let (start, size) = match self.orientation {
            LineOrientation::Row => (target.origin.y, target.footprint.height),
            LineOrientation::Column => (target.origin.x, target.footprint.width),
        };
        self.coordinate >= start && self.coordinate < start + size
    }
}

/// Laser spawner and the live beams.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LaserSystem {
    config: LaserConfig,
    lasers: Vec<Laser>,
    spawn_timer: f32,
    enabled: bool,
}

impl LaserSystem {
    /// Disabled system.
    pub fn new(config: LaserConfig) -> Self {
        Self { config, lasers: Vec::new(), spawn_timer: 0.0, enabled: false }
    }

    /// Start spawning. The first beam appears one spawn interval later.
    pub fn enable(&mut self) {
        if !self.enabled {
            self.enabled = true;
            self.spawn_timer = self.config.spawn_interval;
        }
    }

    /// Stop spawning and drop live beams.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.lasers.clear();
    }

    /// Spawning?
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Live beams.
    pub fn lasers(&self) -> &[Laser] {
        &self.lasers
    }

    /// Seconds until the next spawn attempt.
    pub fn spawn_timer(&self) -> f32 {
        self.spawn_timer
    }

    /// Pick a line near the target, never the target's own line.
    ///
    /// The offset is drawn from `[-range, range]` with zero forced to +/-1.
    /// If clamping pushes the line back onto the target, the adjacent line
    /// on the other side is used.
    pub fn pick_line(&self, grid: &Grid, rng: &mut DeterministicRng, target: &HazardTarget) -> (LineOrientation, i32) {
        let orientation = if rng.next_bool(0.5) { LineOrientation::Row } else { LineOrientation::Column };
        let own = orientation.across(target.origin);
        let max = orientation.line_count(grid) - 1;
        let range = self.config.offset_range.max(1);

        let mut offset = rng.next_int_range(-range, range);
        if offset == 0 {
            offset = rng.next_sign();
        }

        let mut coordinate = (own + offset).clamp(0, max);
        if coordinate == own {
            coordinate = (if offset < 0 { own + 1 } else { own - 1 }).clamp(0, max);
        }
        (orientation, coordinate)
    }

    /// Spawn, advance and fire beams. Returns the line spawned this tick.
    pub fn advance(
        &mut self,
        dt: f32,
        grid: &Grid,
        rng: &mut DeterministicRng,
        target: Option<&HazardTarget>,
        hits: &mut Vec<HazardHit>,
    ) -> Option<(LineOrientation, i32)> {
        let mut spawned = None;
        if self.enabled {
            self.spawn_timer -= dt;
            if self.spawn_timer <= 0.0 && self.lasers.len() < self.config.max_concurrent {
                if let Some(target) = target {
                    let (orientation, coordinate) = self.pick_line(grid, rng, target);
                    trace!(?orientation, coordinate, "Laser spawned");
                    self.lasers.push(Laser::new(orientation, coordinate, self.config.telegraph));
                    self.spawn_timer = self.config.spawn_interval;
                    spawned = Some((orientation, coordinate));
                }
            }
        }

        let execute = self.config.execute;
        let damage = self.config.damage;
        self.lasers.retain_mut(|laser| {
            laser.timer -= dt;
            match laser.phase {
                LaserPhase::Telegraph => {
                    if laser.timer <= 0.0 {
                        laser.phase = LaserPhase::Execute;
                        laser.timer = execute;
                        laser.hit_pending = true;
                    }
                }
                LaserPhase::Execute => {
                    if laser.timer <= 0.0 {
                        return false;
                    }
                }
            }

            // One-shot on the first execute frame
            if laser.hit_pending {
                laser.hit_pending = false;
                if let Some(target) = target {
                    if !target.immune && laser.covers(target) {
                        hits.push(HazardHit {
                            source: HazardSource::Laser,
                            target: target.id,
                            tile: laser.orientation.tile(
                                laser.orientation.along(target.origin),
                                laser.coordinate,
                            ),
                            damage,
                        });
                    }
                }
            }
            true
        });
        spawned
    }
}
