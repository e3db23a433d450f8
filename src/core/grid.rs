//! Tile Grid Model
//!
//! Bounds, walkability and tile <-> world mapping. Every other module
//! depends on this one and nothing here depends on them.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Errors raised at grid construction/assignment boundaries.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// Grid was created with a zero dimension.
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    ZeroSize {
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
    },

    /// A tile outside `[0,width) x [0,height)` reached a boundary.
    #[error("tile ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        /// Tile x
        x: i32,
        /// Tile y
        y: i32,
        /// Grid width
        width: i32,
        /// Grid height
        height: i32,
    },
}

// =============================================================================
// TILE POSITION
// =============================================================================

/// Integer tile coordinate.
///
/// Implements Ord so tiles can key BTreeMaps/BTreeSets (deterministic order).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl TilePos {
    /// Create a new tile position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by (dx, dy).
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// Manhattan distance in tiles.
    #[inline]
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Chebyshev (8-directional step) distance in tiles.
    #[inline]
    pub fn chebyshev(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// Euclidean distance between tile centres.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        let dx = (other.x - self.x) as f32;
        let dy = (other.y - self.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// As float coordinates (tile units).
    #[inline]
    pub fn to_f32(self) -> (f32, f32) {
        (self.x as f32, self.y as f32)
    }
}

// =============================================================================
// FOOTPRINT
// =============================================================================

/// Rectangular set of tiles an actor occupies, axis-aligned from its origin tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    /// Width in tiles (>= 1)
    pub width: i32,
    /// Height in tiles (>= 1)
    pub height: i32,
}

impl Default for Footprint {
    fn default() -> Self {
        Self::UNIT
    }
}

impl Footprint {
    /// Single tile footprint.
    pub const UNIT: Self = Self { width: 1, height: 1 };

    /// Create a footprint. Dimensions below 1 are raised to 1.
    pub fn new(width: i32, height: i32) -> Self {
        Self { width: width.max(1), height: height.max(1) }
    }

    /// Does the footprint placed at `origin` cover `tile`?
    #[inline]
    pub fn contains(&self, origin: TilePos, tile: TilePos) -> bool {
        tile.x >= origin.x
            && tile.x < origin.x + self.width
            && tile.y >= origin.y
            && tile.y < origin.y + self.height
    }

    /// Do two placed footprints overlap?
    #[inline]
    pub fn overlaps(&self, origin: TilePos, other: &Footprint, other_origin: TilePos) -> bool {
        origin.x < other_origin.x + other.width
            && other_origin.x < origin.x + self.width
            && origin.y < other_origin.y + other.height
            && other_origin.y < origin.y + self.height
    }

    /// All tiles covered when placed at `origin` (row-major).
    pub fn tiles(&self, origin: TilePos) -> Vec<TilePos> {
        let mut tiles = Vec::with_capacity((self.width.max(0) * self.height.max(0)) as usize);
        for dy in 0..self.height {
            for dx in 0..self.width {
                tiles.push(origin.offset(dx, dy));
            }
        }
        tiles
    }

    /// Geometric centre when placed at `origin`, in tile units
    /// (tile (x,y) spans [x, x+1)).
    #[inline]
    pub fn centre(&self, origin: TilePos) -> (f32, f32) {
        (
            origin.x as f32 + self.width as f32 / 2.0,
            origin.y as f32 + self.height as f32 / 2.0,
        )
    }
}

// =============================================================================
// GRID POSITION
// =============================================================================

/// Discrete tile plus a fractional "smooth" position for interpolated visuals.
///
/// The integer tile is always inside the grid; construction refuses anything else.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridPosition {
    tile: TilePos,
    smooth: (f32, f32),
}

impl GridPosition {
    /// Create at a tile, with the smooth position resting on it.
    pub fn new(grid: &Grid, tile: TilePos) -> Result<Self, GridError> {
        grid.check(tile)?;
        Ok(Self { tile, smooth: tile.to_f32() })
    }

    /// Discrete tile.
    #[inline]
    pub fn tile(&self) -> TilePos {
        self.tile
    }

    /// Smooth (interpolated) position in tile units.
    #[inline]
    pub fn smooth(&self) -> (f32, f32) {
        self.smooth
    }

    /// Move the smooth position. The discrete tile is untouched.
    #[inline]
    pub fn set_smooth(&mut self, x: f32, y: f32) {
        self.smooth = (x, y);
    }

    /// Snap both tile and smooth position to `tile`, clamped into the grid.
    pub fn snap_to(&mut self, grid: &Grid, tile: TilePos) {
        let tile = grid.clamp_tile(tile);
        self.tile = tile;
        self.smooth = tile.to_f32();
    }
}

// =============================================================================
// GRID
// =============================================================================

/// Default world units per tile.
pub const DEFAULT_TILE_SIZE: f32 = 32.0;

/// Rectangular tile grid with static walls.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid {
    width: i32,
    height: i32,
    tile_size: f32,
    walls: BTreeSet<TilePos>,
}

impl Grid {
    /// Create an empty grid.
    pub fn new(width: i32, height: i32) -> Result<Self, GridError> {
        if width <= 0 || height <= 0 {
            return Err(GridError::ZeroSize { width, height });
        }
        Ok(Self {
            width,
            height,
            tile_size: DEFAULT_TILE_SIZE,
            walls: BTreeSet::new(),
        })
    }

    /// Override the world units per tile.
    pub fn with_tile_size(mut self, tile_size: f32) -> Self {
        if tile_size > 0.0 {
            self.tile_size = tile_size;
        }
        self
    }

    /// Grid width in tiles.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in tiles.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Mark a tile as a wall.
    pub fn add_wall(&mut self, tile: TilePos) -> Result<(), GridError> {
        self.check(tile)?;
        self.walls.insert(tile);
        Ok(())
    }

    /// Static walls.
    pub fn walls(&self) -> impl Iterator<Item = &TilePos> {
        self.walls.iter()
    }

    /// Is the tile inside `[0,width) x [0,height)`?
    #[inline]
    pub fn in_bounds(&self, tile: TilePos) -> bool {
        tile.x >= 0 && tile.x < self.width && tile.y >= 0 && tile.y < self.height
    }

    /// In bounds and not a wall.
    #[inline]
    pub fn is_walkable(&self, tile: TilePos) -> bool {
        self.in_bounds(tile) && !self.walls.contains(&tile)
    }

    /// Every tile of `footprint` placed at `origin` is walkable.
    pub fn footprint_fits(&self, origin: TilePos, footprint: &Footprint) -> bool {
        footprint.tiles(origin).into_iter().all(|t| self.is_walkable(t))
    }

    /// Refuse out-of-bounds tiles.
    pub fn check(&self, tile: TilePos) -> Result<TilePos, GridError> {
        if self.in_bounds(tile) {
            Ok(tile)
        } else {
            Err(GridError::OutOfBounds {
                x: tile.x,
                y: tile.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Clamp a tile into the grid.
    #[inline]
    pub fn clamp_tile(&self, tile: TilePos) -> TilePos {
        TilePos::new(tile.x.clamp(0, self.width - 1), tile.y.clamp(0, self.height - 1))
    }

    /// Clamp a footprint origin so the whole footprint stays in bounds
    /// (bounds minus footprint size).
    #[inline]
    pub fn clamp_origin(&self, origin: TilePos, footprint: &Footprint) -> TilePos {
        let max_x = (self.width - footprint.width).max(0);
        let max_y = (self.height - footprint.height).max(0);
        TilePos::new(origin.x.clamp(0, max_x), origin.y.clamp(0, max_y))
    }

    /// Keep only in-bounds tiles.
    pub fn filter_in_bounds(&self, tiles: impl IntoIterator<Item = TilePos>) -> Vec<TilePos> {
        tiles.into_iter().filter(|t| self.in_bounds(*t)).collect()
    }

    /// World coordinates of a tile's centre.
    #[inline]
    pub fn tile_to_world(&self, tile: TilePos) -> (f32, f32) {
        (
            (tile.x as f32 + 0.5) * self.tile_size,
            (tile.y as f32 + 0.5) * self.tile_size,
        )
    }

    /// Tile containing a world coordinate, or None if outside the grid.
    pub fn world_to_tile(&self, x: f32, y: f32) -> Option<TilePos> {
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let tile = TilePos::new((x / self.tile_size) as i32, (y / self.tile_size) as i32);
        self.in_bounds(tile).then_some(tile)
    }
}
