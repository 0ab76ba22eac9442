use std::{error::Error, fmt};

use serde::Deserialize;
use tactica_core::{Team, Terrain, TilePosition};
use tactica_engine::Simulation;
use tactica_system_ai::policy_for;
use tactica_world::{query, TileMap};
use tracing::info;

/// Skirmish loaded when no level file is supplied.
pub(crate) const DEMO_LEVEL: &str = include_str!("../levels/skirmish.json");

/// Battlefield description decoded from a JSON level file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct LevelData {
    /// Display name of the level.
    pub(crate) name: String,
    /// Number of tile rows.
    pub(crate) rows: u32,
    /// Number of tile columns.
    pub(crate) cols: u32,
    /// Tiles whose terrain differs from plain ground.
    #[serde(default)]
    pub(crate) tiles: Vec<TileData>,
    /// Units and obstacles placed before the first tick.
    #[serde(default)]
    pub(crate) entities: Vec<EntityData>,
}

/// Terrain override for a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct TileData {
    pub(crate) row: i32,
    pub(crate) col: i32,
    pub(crate) terrain: Terrain,
}

/// Unit or obstacle placement.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct EntityData {
    /// Blueprint key; obstacle keys spawn obstacles, anything else a unit.
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) row: i32,
    pub(crate) col: i32,
    /// `"enemy"` selects the enemy side; anything else, or nothing, the player.
    #[serde(default)]
    pub(crate) team: Option<String>,
    /// Policy name, see [`policy_for`].
    #[serde(default)]
    pub(crate) ai: Option<String>,
}

impl EntityData {
    fn team(&self) -> Team {
        match self.team.as_deref() {
            Some(team) if team.eq_ignore_ascii_case("enemy") => Team::Enemy,
            _ => Team::Player,
        }
    }

    fn tile(&self) -> TilePosition {
        TilePosition::new(self.row, self.col)
    }
}

/// Outcome of populating a simulation from a level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) units: usize,
    pub(crate) obstacles: usize,
    pub(crate) rejected: usize,
}

impl LevelData {
    /// Decodes and validates a level from JSON text.
    pub(crate) fn parse(json: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(json).map_err(LevelError::InvalidPayload)?;
        if level.rows == 0 || level.cols == 0 {
            return Err(LevelError::InvalidDimensions {
                rows: level.rows,
                cols: level.cols,
            });
        }
        Ok(level)
    }

    /// Builds the tile map, rejecting overrides outside the grid.
    pub(crate) fn tile_map(&self) -> Result<TileMap, LevelError> {
        let mut map = TileMap::new(self.rows, self.cols);
        for tile in &self.tiles {
            let position = TilePosition::new(tile.row, tile.col);
            if !map.set_terrain(position, tile.terrain) {
                return Err(LevelError::TileOutOfBounds(position));
            }
        }
        Ok(map)
    }

    /// Spawns every entity into `simulation`.
    ///
    /// Individual rejections are logged by the simulation and counted here;
    /// they never abort loading.
    pub(crate) fn populate(&self, simulation: &mut Simulation) -> Placement {
        let mut placement = Placement::default();
        for entity in &self.entities {
            let is_obstacle = query::catalog(simulation.world())
                .obstacle(&entity.kind)
                .is_some();
            if is_obstacle {
                match simulation.spawn_obstacle(&entity.kind, entity.tile()) {
                    Ok(_) => placement.obstacles += 1,
                    Err(_) => placement.rejected += 1,
                }
                continue;
            }

            let policy = policy_for(&entity.ai.as_deref().unwrap_or_default().to_lowercase());
            match simulation.spawn_unit(&entity.kind, entity.team(), policy, entity.tile()) {
                Ok(_) => placement.units += 1,
                Err(_) => placement.rejected += 1,
            }
        }
        info!(
            level = %self.name,
            units = placement.units,
            obstacles = placement.obstacles,
            rejected = placement.rejected,
            "level populated"
        );
        placement
    }
}

/// Errors that can occur while loading a level.
#[derive(Debug)]
pub(crate) enum LevelError {
    /// The JSON document could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The grid has no rows or no columns.
    InvalidDimensions { rows: u32, cols: u32 },
    /// A terrain override names a tile outside the grid.
    TileOutOfBounds(TilePosition),
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPayload(error) => write!(f, "could not parse level: {error}"),
            Self::InvalidDimensions { rows, cols } => {
                write!(f, "level grid {rows}x{cols} must not be empty")
            }
            Self::TileOutOfBounds(tile) => write!(f, "terrain tile {tile} lies outside the grid"),
        }
    }
}

impl Error for LevelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}
