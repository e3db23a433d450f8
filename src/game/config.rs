//! Encounter Configuration
//!
//! Tunables for one encounter. Everything has a default so a JSON file only
//! needs to name what it changes. Attack tables live next to the attack
//! kinds in `attack.rs`; this is the per-encounter layer on top.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::grid::{Footprint, GridError, TilePos};
use crate::game::actor::ActorError;

/// Invalid configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid could not be built.
    #[error("invalid grid: {0}")]
    Grid(#[from] GridError),

    /// A spawn or wall tile is unusable.
    #[error("{what} at ({x}, {y}) is out of bounds or blocked")]
    BadTile {
        /// Which entry
        what: &'static str,
        /// Tile x
        x: i32,
        /// Tile y
        y: i32,
    },

    /// A value that must be positive was not.
    #[error("{0} must be positive")]
    NotPositive(&'static str),

    /// An actor could not be placed.
    #[error("actor placement failed: {0}")]
    Placement(#[from] ActorError),
}

/// Movement tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Player speed (tiles/sec)
    pub player_speed: f32,
    /// Player speed while leaping (tiles/sec)
    pub leap_speed: f32,
    /// Boss walking speed (tiles/sec)
    pub boss_speed: f32,
    /// Minion speed (tiles/sec)
    pub minion_speed: f32,
    /// Minimum seconds between path searches per actor
    pub repath_cooldown: f32,
    /// Distance (tiles) at which the smooth position snaps to its tile
    pub snap_epsilon: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            player_speed: 6.0,
            leap_speed: 12.0,
            boss_speed: 2.5,
            minion_speed: 3.5,
            repath_cooldown: 0.5,
            snap_epsilon: 0.05,
        }
    }
}

/// Ground hazard tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    /// Seconds between damage ticks while standing in a hazard
    pub tick_interval: f32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self { tick_interval: 0.5 }
    }
}

/// Laser sweep tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserConfig {
    /// Seconds between spawns
    pub spawn_interval: f32,
    /// Maximum live lasers
    pub max_concurrent: usize,
    /// Warning time (seconds)
    pub telegraph: f32,
    /// Active time (seconds)
    pub execute: f32,
    /// Damage on hit
    pub damage: i32,
    /// Maximum line offset from the target's own line
    pub offset_range: i32,
}

impl Default for LaserConfig {
    fn default() -> Self {
        Self {
            spawn_interval: 1.6,
            max_concurrent: 2,
            telegraph: 1.0,
            execute: 0.25,
            damage: 10,
            offset_range: 2,
        }
    }
}

/// Portal band-dash tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Sweeps per activation
    pub sweep_count: usize,
    /// Band thickness in tiles (odd values centre on the band coordinate)
    pub band_width: i32,
    /// Warning time per sweep (seconds)
    pub telegraph: f32,
    /// Sweep travel time (seconds)
    pub execute: f32,
    /// Pause after each sweep (seconds)
    pub delay: f32,
    /// Damage on hit
    pub damage: i32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            sweep_count: 4,
            band_width: 3,
            telegraph: 0.9,
            execute: 0.6,
            delay: 0.4,
            damage: 15,
        }
    }
}

/// Full encounter description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Encounter identifier (seed derivation)
    pub encounter_id: [u8; 16],
    /// Base RNG seed
    pub seed: u64,
    /// Grid width in tiles
    pub grid_width: i32,
    /// Grid height in tiles
    pub grid_height: i32,
    /// World units per tile
    pub tile_size: f32,
    /// Static wall tiles
    pub walls: Vec<TilePos>,
    /// Player spawn tile
    pub player_spawn: TilePos,
    /// Player max health
    pub player_health: i32,
    /// Boss spawn origin
    pub boss_spawn: TilePos,
    /// Boss footprint
    pub boss_footprint: Footprint,
    /// Boss max health
    pub boss_health: i32,
    /// Destructible obstacle tiles
    pub obstacles: Vec<TilePos>,
    /// Obstacle max health
    pub obstacle_health: i32,
    /// Minions spawned when the boss calls its escort
    pub escort_count: u32,
    /// Minion max health
    pub minion_health: i32,
    /// Largest accepted time step (seconds)
    pub max_dt: f32,
    /// Movement tunables
    pub movement: MovementConfig,
    /// Ground hazard tunables
    pub hazards: HazardConfig,
    /// Laser tunables
    pub lasers: LaserConfig,
    /// Portal dash tunables
    pub portal: PortalConfig,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            encounter_id: [0x47; 16],
            seed: 12345,
            grid_width: 16,
            grid_height: 12,
            tile_size: 32.0,
            walls: vec![TilePos::new(4, 3), TilePos::new(4, 8), TilePos::new(12, 3), TilePos::new(12, 8)],
            player_spawn: TilePos::new(2, 6),
            player_health: 100,
            boss_spawn: TilePos::new(10, 5),
            boss_footprint: Footprint::new(2, 2),
            boss_health: 400,
            obstacles: vec![TilePos::new(7, 2), TilePos::new(7, 9)],
            obstacle_health: 30,
            escort_count: 2,
            minion_health: 40,
            max_dt: 0.25,
            movement: MovementConfig::default(),
            hazards: HazardConfig::default(),
            lasers: LaserConfig::default(),
            portal: PortalConfig::default(),
        }
    }
}

impl EncounterConfig {
    /// Check every boundary invariant the encounter relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width <= 0 || self.grid_height <= 0 {
            return Err(ConfigError::Grid(GridError::ZeroSize {
                width: self.grid_width,
                height: self.grid_height,
            }));
        }

        // Deserialized footprints skip the clamp in `Footprint::new`
        if self.boss_footprint.width < 1 || self.boss_footprint.height < 1 {
            return Err(ConfigError::NotPositive("boss_footprint"));
        }

        let in_bounds = |t: TilePos| {
            t.x >= 0 && t.x < self.grid_width && t.y >= 0 && t.y < self.grid_height
        };
        let blocked = |t: TilePos| !in_bounds(t) || self.walls.contains(&t);

        for wall in &self.walls {
            if !in_bounds(*wall) {
                return Err(ConfigError::BadTile { what: "wall", x: wall.x, y: wall.y });
            }
        }
        if blocked(self.player_spawn) {
            let t = self.player_spawn;
            return Err(ConfigError::BadTile { what: "player spawn", x: t.x, y: t.y });
        }
        if self.boss_footprint.tiles(self.boss_spawn).into_iter().any(|t| blocked(t)) {
            let t = self.boss_spawn;
            return Err(ConfigError::BadTile { what: "boss spawn", x: t.x, y: t.y });
        }
        for obstacle in &self.obstacles {
            if blocked(*obstacle) {
                return Err(ConfigError::BadTile { what: "obstacle", x: obstacle.x, y: obstacle.y });
            }
        }

        let positive = [
            (self.player_health > 0, "player_health"),
            (self.boss_health > 0, "boss_health"),
            (self.obstacle_health > 0, "obstacle_health"),
            (self.minion_health > 0, "minion_health"),
            (self.tile_size > 0.0, "tile_size"),
            (self.max_dt > 0.0, "max_dt"),
            (self.movement.player_speed > 0.0, "movement.player_speed"),
            (self.movement.leap_speed > 0.0, "movement.leap_speed"),
            (self.movement.boss_speed > 0.0, "movement.boss_speed"),
            (self.movement.minion_speed > 0.0, "movement.minion_speed"),
            (self.movement.snap_epsilon > 0.0, "movement.snap_epsilon"),
            (self.hazards.tick_interval > 0.0, "hazards.tick_interval"),
            (self.lasers.spawn_interval > 0.0, "lasers.spawn_interval"),
            (self.lasers.max_concurrent > 0, "lasers.max_concurrent"),
            (self.lasers.telegraph > 0.0, "lasers.telegraph"),
            (self.lasers.execute > 0.0, "lasers.execute"),
            (self.portal.sweep_count > 0, "portal.sweep_count"),
            (self.portal.band_width > 0, "portal.band_width"),
            (self.portal.telegraph > 0.0, "portal.telegraph"),
            (self.portal.execute > 0.0, "portal.execute"),
        ];
        for (ok, name) in positive {
            if !ok {
                return Err(ConfigError::NotPositive(name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(EncounterConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_spawn_on_wall_rejected() {
        let mut config = EncounterConfig::default();
        config.walls.push(config.player_spawn);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadTile { what: "player spawn", .. })
        ));
    }

    #[test]
    fn test_boss_footprint_must_fit() {
        let mut config = EncounterConfig::default();
        config.boss_spawn = TilePos::new(config.grid_width - 1, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadTile { what: "boss spawn", .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EncounterConfig =
            serde_json::from_str(r#"{ "seed": 7, "lasers": { "damage": 3 } }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.lasers.damage, 3);
        assert_eq!(config.lasers.max_concurrent, LaserConfig::default().max_concurrent);
        assert_eq!(config.grid_width, 16);
    }

    #[test]
    fn test_degenerate_boss_footprint_rejected() {
        for json in [
            r#"{ "boss_footprint": { "width": -1, "height": 2 } }"#,
            r#"{ "boss_footprint": { "width": 0, "height": 0 } }"#,
        ] {
            let config: EncounterConfig = serde_json::from_str(json).unwrap();
            assert_eq!(config.validate(), Err(ConfigError::NotPositive("boss_footprint")));
        }
    }

    #[test]
    fn test_non_positive_rejected() {
        let mut config = EncounterConfig::default();
        config.portal.sweep_count = 0;
        assert_eq!(config.validate(), Err(ConfigError::NotPositive("portal.sweep_count")));
    }
}
