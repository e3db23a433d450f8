//! Portal Band Dash
//!
//! A scripted run of band sweeps. Each sweep telegraphs its strip, drags a
//! moving edge across the whole map, then pauses before the next one.
//! `advance` reports `Completed` once, on the tick the last pause ends.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::grid::{Grid, TilePos};
use crate::core::rng::DeterministicRng;
use crate::game::actor::ActorId;
use crate::game::config::PortalConfig;
use crate::game::hazard::{HazardHit, HazardSource, HazardTarget};
use crate::game::laser::LineOrientation;

/// One sweep directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sweep {
    /// Row band (edge moves along x) or column band (edge moves along y)
    pub orientation: LineOrientation,
    /// Band centre: y for rows, x for columns
    pub band: i32,
    /// Edge travels toward increasing coordinates
    pub forward: bool,
}

/// Per-sweep phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepPhase {
    /// Strip highlighted
    Telegraph,
    /// Edge moving
    Execute,
    /// Pause before the next sweep
    Delay,
}

/// Result of one `advance`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalDashStatus {
    /// Not running
    Idle,
    /// Sweeps remain
    Running,
    /// The last sweep's pause ended this tick
    Completed,
}

/// Presentation view of the active sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortalView {
    /// Index of the active sweep
    pub index: usize,
    /// Total sweeps
    pub total: usize,
    /// Active sweep
    pub sweep: Sweep,
    /// Phase of the active sweep
    pub phase: SweepPhase,
    /// Edge progress in [0,1]
    pub progress: f32,
    /// Edge position along the sweep axis (tiles), while executing
    pub edge: Option<f32>,
    /// Tiles of the strip, while telegraphing or executing
    pub tiles: Vec<TilePos>,
}

/// The band-dash sequence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortalDash {
    config: PortalConfig,
    sweeps: Vec<Sweep>,
    index: usize,
    phase: SweepPhase,
    timer: f32,
    progress: f32,
    active: bool,
    already_hit: BTreeMap<ActorId, TilePos>,
}

impl PortalDash {
    /// Inactive dash.
    pub fn new(config: PortalConfig) -> Self {
        Self {
            config,
            sweeps: Vec::new(),
            index: 0,
            phase: SweepPhase::Telegraph,
            timer: 0.0,
            progress: 0.0,
            active: false,
            already_hit: BTreeMap::new(),
        }
    }

    /// Dash that runs a fixed list of sweeps.
    pub fn with_sweeps(config: PortalConfig, sweeps: Vec<Sweep>) -> Self {
        let mut dash = Self::new(config);
        dash.begin(sweeps);
        dash
    }

    /// Generate sweeps and start the first one.
    ///
    /// Orientations alternate from a random first one. Band coordinates
    /// do not repeat within an orientation until the candidates run out.
    pub fn start(&mut self, grid: &Grid, rng: &mut DeterministicRng) {
        let sweeps = generate_sweeps(grid, rng, self.config.sweep_count);
        debug!(sweeps = sweeps.len(), "Portal dash started");
        self.begin(sweeps);
    }

    fn begin(&mut self, sweeps: Vec<Sweep>) {
        self.active = !sweeps.is_empty();
        self.sweeps = sweeps;
        self.index = 0;
        self.enter(SweepPhase::Telegraph);
    }

    fn enter(&mut self, phase: SweepPhase) {
        self.phase = phase;
        self.progress = 0.0;
        self.timer = match phase {
            SweepPhase::Telegraph => self.config.telegraph,
            SweepPhase::Execute => self.config.execute,
            SweepPhase::Delay => self.config.delay,
        };
        if phase == SweepPhase::Telegraph {
            self.already_hit.clear();
        }
    }

    /// Running?
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Generated sweeps.
    pub fn sweeps(&self) -> &[Sweep] {
        &self.sweeps
    }

    /// Active sweep.
    pub fn current_sweep(&self) -> Option<&Sweep> {
        if self.active { self.sweeps.get(self.index) } else { None }
    }

    /// Phase of the active sweep.
    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    /// Edge progress of the active sweep.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Half the band thickness; the band covers `band +/- half_width`.
    fn half_width(&self) -> i32 {
        self.config.band_width / 2
    }

    /// Edge position along the sweep axis, interpolated over the map.
    pub fn band_edge(&self, grid: &Grid) -> Option<f32> {
        let sweep = self.current_sweep()?;
        if self.phase != SweepPhase::Execute {
            return None;
        }
        let length = sweep.orientation.line_length(grid) as f32;
        Some(if sweep.forward { self.progress * length } else { length - self.progress * length })
    }

    /// Strip tiles for the telegraph.
    pub fn telegraph_tiles(&self, grid: &Grid) -> Vec<TilePos> {
        let Some(sweep) = self.current_sweep() else { return Vec::new() };
        if self.phase == SweepPhase::Delay {
            return Vec::new();
        }
        let half = self.half_width();
        let mut tiles = Vec::new();
        for across in (sweep.band - half)..=(sweep.band + half) {
            for along in 0..sweep.orientation.line_length(grid) {
                tiles.push(sweep.orientation.tile(along, across));
            }
        }
        grid.filter_in_bounds(tiles)
    }

    /// Presentation snapshot.
    pub fn view(&self, grid: &Grid) -> Option<PortalView> {
        let sweep = *self.current_sweep()?;
        Some(PortalView {
            index: self.index,
            total: self.sweeps.len(),
            sweep,
            phase: self.phase,
            progress: self.progress,
            edge: self.band_edge(grid),
            tiles: self.telegraph_tiles(grid),
        })
    }

    /// Has the edge of `sweep` reached the target, and is the target inside the band?
    fn sweep_hits(&self, sweep: &Sweep, edge: f32, target: &HazardTarget) -> Option<TilePos> {
        let o = sweep.orientation;
        let (along_start, along_size, across_start, across_size) = match o {
            LineOrientation::Row => (target.origin.x, target.footprint.width, target.origin.y, target.footprint.height),
            LineOrientation::Column => (target.origin.y, target.footprint.height, target.origin.x, target.footprint.width),
        };

        let reached = if sweep.forward {
            edge >= along_start as f32
        } else {
            edge <= (along_start + along_size) as f32
        };
        if !reached {
            return None;
        }

        let half = self.half_width();
        let lo = sweep.band - half;
        let hi = sweep.band + half;
        (across_start..across_start + across_size)
            .find(|a| (lo..=hi).contains(a))
            .map(|across| o.tile(o.along(target.origin), across))
    }

    /// Advance timers, test the moving edge, report completion.
    pub fn advance(
        &mut self,
        dt: f32,
        grid: &Grid,
        target: Option<&HazardTarget>,
        hits: &mut Vec<HazardHit>,
    ) -> PortalDashStatus {
        let Some(sweep) = self.current_sweep().copied() else {
            return PortalDashStatus::Idle;
        };

        self.timer -= dt;
        match self.phase {
            SweepPhase::Telegraph => {
                if self.timer <= 0.0 {
                    self.enter(SweepPhase::Execute);
                }
            }
            SweepPhase::Execute => {
                let total = self.config.execute;
                self.progress = if total > 0.0 { (1.0 - self.timer / total).clamp(0.0, 1.0) } else { 1.0 };

                if let (Some(target), Some(edge)) = (target, self.band_edge(grid)) {
                    if !target.immune && !self.already_hit.contains_key(&target.id) {
                        if let Some(tile) = self.sweep_hits(&sweep, edge, target) {
                            self.already_hit.insert(target.id, tile);
                            hits.push(HazardHit {
                                source: HazardSource::Portal,
                                target: target.id,
                                tile,
                                damage: self.config.damage,
                            });
                        }
                    }
                }

                if self.timer <= 0.0 {
                    self.enter(SweepPhase::Delay);
                }
            }
            SweepPhase::Delay => {
                if self.timer <= 0.0 {
                    self.index += 1;
                    if self.index >= self.sweeps.len() {
                        self.active = false;
                        debug!("Portal dash completed");
                        return PortalDashStatus::Completed;
                    }
                    self.enter(SweepPhase::Telegraph);
                }
            }
        }
        PortalDashStatus::Running
    }
}

/// Build `count` sweeps with alternating orientation.
pub fn generate_sweeps(grid: &Grid, rng: &mut DeterministicRng, count: usize) -> Vec<Sweep> {
    let mut orientation = if rng.next_bool(0.5) { LineOrientation::Row } else { LineOrientation::Column };
    let mut used_rows: Vec<i32> = Vec::new();
    let mut used_cols: Vec<i32> = Vec::new();
    let mut sweeps = Vec::with_capacity(count);

    for _ in 0..count {
        let lines = orientation.line_count(grid);
        // Keep the band off the outermost lines when the grid allows it
        let (lo, hi) = if lines >= 3 { (1, lines - 2) } else { (0, lines - 1) };
        let used = match orientation {
            LineOrientation::Row => &mut used_rows,
            LineOrientation::Column => &mut used_cols,
        };

        let mut candidates: Vec<i32> = (lo..=hi).filter(|c| !used.contains(c)).collect();
        if candidates.is_empty() {
            used.clear();
            candidates = (lo..=hi).collect();
        }
        let band = rng.choose(&candidates).copied().unwrap_or(lo);
        used.push(band);

        sweeps.push(Sweep { orientation, band, forward: rng.next_bool(0.5) });
        orientation = orientation.flipped();
    }
    sweeps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::Footprint;

    fn target_at(x: i32, y: i32) -> HazardTarget {
        HazardTarget {
            id: ActorId(1),
            origin: TilePos::new(x, y),
            footprint: Footprint::UNIT,
            immune: false,
        }
    }

    fn run(dash: &mut PortalDash, grid: &Grid, target: &HazardTarget) -> (Vec<HazardHit>, usize) {
        let mut hits = Vec::new();
        let mut completed = 0;
        for _ in 0..2000 {
            match dash.advance(1.0 / 60.0, grid, Some(target), &mut hits) {
                PortalDashStatus::Completed => completed += 1,
                PortalDashStatus::Idle => break,
                PortalDashStatus::Running => {}
            }
        }
        (hits, completed)
    }

    #[test]
    fn test_three_sweeps_hit_stationary_target_three_times() {
        let grid = Grid::new(12, 12).unwrap();
        let sweeps = vec![
            Sweep { orientation: LineOrientation::Row, band: 5, forward: true },
            Sweep { orientation: LineOrientation::Column, band: 5, forward: false },
            Sweep { orientation: LineOrientation::Row, band: 4, forward: true },
        ];
        let mut dash = PortalDash::with_sweeps(PortalConfig::default(), sweeps);
        let target = target_at(5, 5);

        let (hits, completed) = run(&mut dash, &grid, &target);
        assert_eq!(hits.len(), 3);
        assert_eq!(completed, 1);
        assert!(hits.iter().all(|h| h.source == HazardSource::Portal));
        assert!(!dash.is_active());
    }

    #[test]
    fn test_target_outside_band_untouched() {
        let grid = Grid::new(12, 12).unwrap();
        let sweeps = vec![Sweep { orientation: LineOrientation::Row, band: 2, forward: true }];
        let mut dash = PortalDash::with_sweeps(PortalConfig::default(), sweeps);

        let (hits, completed) = run(&mut dash, &grid, &target_at(5, 9));
        assert!(hits.is_empty());
        assert_eq!(completed, 1);
    }

    #[test]
    fn test_edge_must_reach_target() {
        let grid = Grid::new(10, 10).unwrap();
        let sweeps = vec![Sweep { orientation: LineOrientation::Row, band: 5, forward: true }];
        let mut dash = PortalDash::with_sweeps(PortalConfig::default(), sweeps);
        let target = target_at(8, 5);
        let mut hits = Vec::new();

        // Finish the telegraph, then a quarter of the sweep
        dash.advance(1.0, &grid, Some(&target), &mut hits);
        assert_eq!(dash.phase(), SweepPhase::Execute);
        dash.advance(0.15, &grid, Some(&target), &mut hits);
        assert!(hits.is_empty());
        assert!(dash.band_edge(&grid).unwrap() < 8.0);

        dash.advance(0.45, &grid, Some(&target), &mut hits);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tile, TilePos::new(8, 5));
    }

    #[test]
    fn test_generated_sweeps_alternate_and_do_not_repeat() {
        let grid = Grid::new(16, 12).unwrap();
        let mut rng = DeterministicRng::new(77);
        let sweeps = generate_sweeps(&grid, &mut rng, 6);

        assert_eq!(sweeps.len(), 6);
        for pair in sweeps.windows(2) {
            assert_ne!(pair[0].orientation, pair[1].orientation);
        }
        for o in [LineOrientation::Row, LineOrientation::Column] {
            let bands: Vec<i32> = sweeps.iter().filter(|s| s.orientation == o).map(|s| s.band).collect();
            let mut dedup = bands.clone();
            dedup.sort();
            dedup.dedup();
            assert_eq!(bands.len(), dedup.len());
            let lines = o.line_count(&grid);
            assert!(bands.iter().all(|b| *b >= 1 && *b <= lines - 2));
        }
    }

    #[test]
    fn test_idle_dash_reports_idle() {
        let grid = Grid::new(4, 4).unwrap();
        let mut dash = PortalDash::new(PortalConfig::default());
        let mut hits = Vec::new();
        assert_eq!(dash.advance(0.1, &grid, None, &mut hits), PortalDashStatus::Idle);
        assert!(dash.view(&grid).is_none());
    }
}
