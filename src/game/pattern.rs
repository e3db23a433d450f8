//! Attack Pattern Generation
//!
//! Pure functions from (origin tile, origin footprint, target tile) to the
//! set of grid tiles an attack covers. Every generator drops out-of-bounds
//! tiles before returning, so nothing downstream ever sees one.

use serde::{Serialize, Deserialize};

use crate::core::grid::{Footprint, Grid, TilePos};

/// Boss wave band depth (tiles ahead of the forward edge).
pub const WAVE_DEPTH: i32 = 2;

/// Boss wave band width (tiles across).
pub const WAVE_WIDTH: i32 = 3;

/// Number of bounce landings.
pub const BOUNCE_STAGES: usize = 3;

/// Distance between successive bounce landings (tiles).
pub const BOUNCE_STEP: f32 = 3.0;

/// Slam template: radius-2 cross plus the four diagonal corners around centre.
///
/// Thirteen tiles: the centre, eight arm tiles (two per cardinal direction)
/// and four diagonals.
pub const CROSS_OFFSETS: [(i32, i32); 13] = [
    (0, 0),
    // Cross arms
    (1, 0), (-1, 0), (0, 1), (0, -1),
    (2, 0), (-2, 0), (0, 2), (0, -2),
    // Diagonal corners
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

/// Cardinal direction used by directional bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinal {
    /// +X
    East,
    /// -X
    West,
    /// +Y
    South,
    /// -Y
    North,
}

impl Cardinal {
    /// Unit step for this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Cardinal::East => (1, 0),
            Cardinal::West => (-1, 0),
            Cardinal::South => (0, 1),
            Cardinal::North => (0, -1),
        }
    }
}

/// Snap the origin->target vector to a cardinal direction.
///
/// Compares |dx| against |dy|; ties go to the X axis. A zero vector faces East.
pub fn snap_direction(origin: TilePos, target: TilePos) -> Cardinal {
    let dx = target.x - origin.x;
    let dy = target.y - origin.y;
    if dx.abs() >= dy.abs() {
        if dx >= 0 { Cardinal::East } else { Cardinal::West }
    } else if dy > 0 {
        Cardinal::South
    } else {
        Cardinal::North
    }
}

/// Directional band before bounds filtering.
///
/// Emits `depth x width` tiles in front of the footprint's forward edge,
/// depth-major, lateral offsets centred on the origin tile's perpendicular
/// coordinate.
pub fn directional_band_raw(
    origin: TilePos,
    footprint: &Footprint,
    target: TilePos,
    depth: i32,
    width: i32,
) -> Vec<TilePos> {
    let dir = snap_direction(origin, target);
    let lateral = -(width - 1) / 2..=width / 2;
    let mut tiles = Vec::with_capacity((depth.max(0) * width.max(0)) as usize);

    for d in 1..=depth {
        for l in lateral.clone() {
            let tile = match dir {
                Cardinal::East => TilePos::new(origin.x + footprint.width - 1 + d, origin.y + l),
                Cardinal::West => TilePos::new(origin.x - d, origin.y + l),
                Cardinal::South => TilePos::new(origin.x + l, origin.y + footprint.height - 1 + d),
                Cardinal::North => TilePos::new(origin.x + l, origin.y - d),
            };
            tiles.push(tile);
        }
    }
    tiles
}

/// Directional band, filtered to the grid.
pub fn directional_band(
    grid: &Grid,
    origin: TilePos,
    footprint: &Footprint,
    target: TilePos,
    depth: i32,
    width: i32,
) -> Vec<TilePos> {
    grid.filter_in_bounds(directional_band_raw(origin, footprint, target, depth, width))
}

/// Cross/plus centred on the target, independent of the attacker.
pub fn cross(grid: &Grid, target: TilePos) -> Vec<TilePos> {
    grid.filter_in_bounds(CROSS_OFFSETS.iter().map(|(dx, dy)| target.offset(*dx, *dy)))
}

/// Every tile in the footprint's bounding box grown by `radius`,
/// minus the footprint itself.
pub fn ring(grid: &Grid, origin: TilePos, footprint: &Footprint, radius: i32) -> Vec<TilePos> {
    let mut tiles = Vec::new();
    for y in (origin.y - radius)..(origin.y + footprint.height + radius) {
        for x in (origin.x - radius)..(origin.x + footprint.width + radius) {
            let tile = TilePos::new(x, y);
            if !footprint.contains(origin, tile) {
                tiles.push(tile);
            }
        }
    }
    grid.filter_in_bounds(tiles)
}

/// Ordered landing points and their hit zones for a bounce attack.
///
/// Zones stay separate so telegraphs can reveal them one at a time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BounceZones {
    /// Footprint origin at each landing
    pub landings: Vec<TilePos>,
    /// Footprint + 1-tile border at each landing, in bounds
    pub zones: Vec<Vec<TilePos>>,
}

impl BounceZones {
    /// All zone tiles in stage order (duplicates kept).
    pub fn flattened(&self) -> Vec<TilePos> {
        self.zones.iter().flatten().copied().collect()
    }
}

/// Project `stages` landings along the normalised origin->target vector.
///
/// Each landing is rounded, then clamped to bounds minus footprint size.
pub fn bounce_zones(
    grid: &Grid,
    origin: TilePos,
    footprint: &Footprint,
    target: TilePos,
    step: f32,
    stages: usize,
) -> BounceZones {
    let dx = (target.x - origin.x) as f32;
    let dy = (target.y - origin.y) as f32;
    let len = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = if len > f32::EPSILON { (dx / len, dy / len) } else { (1.0, 0.0) };

    let mut result = BounceZones::default();
    for k in 1..=stages {
        let dist = step * k as f32;
        let raw = TilePos::new(
            origin.x + (nx * dist).round() as i32,
            origin.y + (ny * dist).round() as i32,
        );
        let landing = grid.clamp_origin(raw, footprint);

        let mut zone = Vec::new();
        for y in (landing.y - 1)..=(landing.y + footprint.height) {
            for x in (landing.x - 1)..=(landing.x + footprint.width) {
                zone.push(TilePos::new(x, y));
            }
        }

        result.landings.push(landing);
        result.zones.push(grid.filter_in_bounds(zone));
    }
    result
}

// =============================================================================
// PATTERN SHAPES
// =============================================================================

/// Geometry an attack kind uses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PatternShape {
    /// Directional band toward the target
    Band {
        /// Tiles ahead of the forward edge
        depth: i32,
        /// Tiles across
        width: i32,
    },
    /// Cross centred on the target
    Cross,
    /// Ring around the attacker's footprint
    Ring {
        /// Border thickness
        radius: i32,
    },
    /// Sequential bounce landings toward the target
    Bounce {
        /// Landing count
        stages: usize,
        /// Distance between landings
        step: f32,
    },
}

/// Tiles produced for one attack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttackTiles {
    /// One tile set hit all at once
    Flat(Vec<TilePos>),
    /// Ordered per-stage zones
    Staged(BounceZones),
}

impl AttackTiles {
    /// Every tile, stage order preserved.
    pub fn all_tiles(&self) -> Vec<TilePos> {
        match self {
            AttackTiles::Flat(tiles) => tiles.clone(),
            AttackTiles::Staged(zones) => zones.flattened(),
        }
    }
}

/// Generate the tiles for `shape`.
pub fn generate(
    shape: PatternShape,
    grid: &Grid,
    origin: TilePos,
    footprint: &Footprint,
    target: TilePos,
) -> AttackTiles {
    match shape {
        PatternShape::Band { depth, width } => {
            AttackTiles::Flat(directional_band(grid, origin, footprint, target, depth, width))
        }
        PatternShape::Cross => AttackTiles::Flat(cross(grid, target)),
        PatternShape::Ring { radius } => AttackTiles::Flat(ring(grid, origin, footprint, radius)),
        PatternShape::Bounce { stages, step } => {
            AttackTiles::Staged(bounce_zones(grid, origin, footprint, target, step, stages))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_snap_direction_ties_go_to_x() {
        let o = TilePos::new(5, 5);
        assert_eq!(snap_direction(o, TilePos::new(8, 8)), Cardinal::East);
        assert_eq!(snap_direction(o, TilePos::new(2, 8)), Cardinal::West);
        assert_eq!(snap_direction(o, TilePos::new(6, 9)), Cardinal::South);
        assert_eq!(snap_direction(o, TilePos::new(5, 1)), Cardinal::North);
        assert_eq!(snap_direction(o, o), Cardinal::East);
    }

    #[test]
    fn test_boss_wave_scenario() {
        // 2x2 boss at (5,5), target at (9,5)
        let origin = TilePos::new(5, 5);
        let target = TilePos::new(9, 5);
        let fp = Footprint::new(2, 2);

        assert_eq!(origin.distance(target), 4.0);
        assert_eq!(snap_direction(origin, target).delta(), (1, 0));

        let tiles = directional_band_raw(origin, &fp, target, WAVE_DEPTH, WAVE_WIDTH);
        assert_eq!(
            tiles,
            vec![
                TilePos::new(7, 4), TilePos::new(7, 5), TilePos::new(7, 6),
                TilePos::new(8, 4), TilePos::new(8, 5), TilePos::new(8, 6),
            ]
        );
    }

    #[test]
    fn test_band_filters_out_of_bounds() {
        let grid = Grid::new(8, 8).unwrap();
        let tiles = directional_band(
            &grid,
            TilePos::new(0, 0),
            &Footprint::UNIT,
            TilePos::new(-3, 0),
            WAVE_DEPTH,
            WAVE_WIDTH,
        );
        assert!(tiles.is_empty());
    }

    #[test]
    fn test_cross_template() {
        let grid = Grid::new(10, 10).unwrap();
        let tiles = cross(&grid, TilePos::new(5, 5));
        assert_eq!(tiles.len(), 13);
        assert!(tiles.contains(&TilePos::new(7, 5)));
        assert!(tiles.contains(&TilePos::new(4, 4)));
        assert!(!tiles.contains(&TilePos::new(7, 7)));

        // Corner target keeps only in-bounds offsets
        let corner = cross(&grid, TilePos::new(0, 0));
        assert_eq!(corner.len(), 6);
    }

    #[test]
    fn test_ring_excludes_footprint() {
        let grid = Grid::new(12, 12).unwrap();
        let fp = Footprint::new(2, 2);
        let origin = TilePos::new(5, 5);
        let tiles = ring(&grid, origin, &fp, 2);

        // 6x6 box minus 2x2 footprint
        assert_eq!(tiles.len(), 32);
        assert!(tiles.iter().all(|t| !fp.contains(origin, *t)));
        assert!(tiles.contains(&TilePos::new(3, 3)));
        assert!(tiles.contains(&TilePos::new(8, 8)));
    }

    #[test]
    fn test_bounce_zones_clamp_and_stay_grouped() {
        let grid = Grid::new(12, 10).unwrap();
        let fp = Footprint::new(2, 2);
        let zones = bounce_zones(&grid, TilePos::new(1, 4), &fp, TilePos::new(11, 4), BOUNCE_STEP, 3);

        assert_eq!(zones.landings, vec![
            TilePos::new(4, 4),
            TilePos::new(7, 4),
            // 1 + 9 = 10 clamps to width - footprint = 10
            TilePos::new(10, 4),
        ]);
        assert_eq!(zones.zones.len(), 3);
        // Full 4x4 zone in the middle of the map
        assert_eq!(zones.zones[0].len(), 16);
        // Edge landing loses its right border column
        assert_eq!(zones.zones[2].len(), 12);
    }

    proptest! {
        #[test]
        fn prop_patterns_stay_in_bounds(
            w in 1i32..24,
            h in 1i32..24,
            ox in -4i32..28,
            oy in -4i32..28,
            tx in -4i32..28,
            ty in -4i32..28,
            fw in 1i32..4,
            fh in 1i32..4,
        ) {
            let grid = Grid::new(w, h).unwrap();
            let fp = Footprint::new(fw, fh);
            let origin = TilePos::new(ox, oy);
            let target = TilePos::new(tx, ty);

            let shapes = [
                PatternShape::Band { depth: WAVE_DEPTH, width: WAVE_WIDTH },
                PatternShape::Cross,
                PatternShape::Ring { radius: 2 },
                PatternShape::Bounce { stages: BOUNCE_STAGES, step: BOUNCE_STEP },
            ];
            for shape in shapes {
                for tile in generate(shape, &grid, origin, &fp, target).all_tiles() {
                    prop_assert!(tile.x >= 0 && tile.x < w && tile.y >= 0 && tile.y < h);
                }
            }
        }
    }
}
