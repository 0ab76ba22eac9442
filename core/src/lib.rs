#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tactica simulation engine.
//!
//! This crate defines the message surface that connects the host, the
//! authoritative world, and the tick-driven systems. Systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that the presentation layer mirrors. Entity records live here as plain data
//! so that every crate agrees on their shape; only the world owns instances.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

mod entity;

pub use entity::{
    AttackPattern, Obstacle, ObstacleBlueprint, ObstacleKind, ObstacleState, Unit, UnitBlueprint,
    UnitPlan, UnitStats, Volley,
};

/// Wall-clock spacing between ticks assumed when no configuration is supplied.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(300);

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Opens a new tick: counts down cooldowns and flags units that may act.
    Tick,
    /// Requests that a unit built from the named blueprint join the battle.
    SpawnUnit {
        /// Blueprint key looked up in the catalog.
        kind: String,
        /// Side the unit fights for.
        team: Team,
        /// Tile the unit should occupy.
        tile: TilePosition,
    },
    /// Requests that an obstacle built from the named blueprint be placed.
    SpawnObstacle {
        /// Blueprint key looked up in the catalog.
        kind: String,
        /// Tile the obstacle should occupy.
        tile: TilePosition,
        /// Generator that powers the obstacle, if any.
        owner: Option<ObstacleId>,
    },
    /// Removes a unit from the battle without killing it.
    RemoveUnit {
        /// Identifier of the unit to remove.
        unit: UnitId,
    },
    /// Removes an obstacle from the battle.
    RemoveObstacle {
        /// Identifier of the obstacle to remove.
        obstacle: ObstacleId,
    },
    /// Replaces the decision state of a unit after its policy ran.
    UpdatePlan {
        /// Identifier of the unit whose plan changes.
        unit: UnitId,
        /// Plan the unit should carry from now on.
        plan: UnitPlan,
    },
    /// Commits a resolved move, relocating the unit onto the destination tile.
    CommitMove {
        /// Identifier of the unit that won the destination.
        unit: UnitId,
        /// Destination tile.
        to: TilePosition,
    },
    /// Reports that a unit lost or could not claim its requested tile.
    RejectMove {
        /// Identifier of the unit whose request failed.
        unit: UnitId,
        /// Tile the unit asked for.
        destination: TilePosition,
        /// Clears the unit's goal when it pointed at the destination.
        drop_goal: bool,
    },
    /// Records the hostile a unit currently tracks.
    SetTarget {
        /// Identifier of the tracking unit.
        unit: UnitId,
        /// Hostile being tracked, if any.
        target: Option<UnitId>,
    },
    /// Returns an attacking unit to idle.
    StandDown {
        /// Identifier of the unit leaving the attack state.
        unit: UnitId,
        /// Zeroes the cooldown so the unit can react on the next tick.
        reset_cooldown: bool,
    },
    /// Starts the wind-up that precedes a strike.
    BeginWindUp {
        /// Identifier of the attacking unit.
        unit: UnitId,
        /// Unit the attacker faces.
        target: UnitId,
    },
    /// Subtracts hit points from a unit, killing it at zero or below.
    ApplyDamage {
        /// Identifier of the unit that takes damage.
        target: UnitId,
        /// Hit points to subtract.
        amount: i32,
    },
    /// Announces a purely visual action to the presentation layer.
    PlayAction {
        /// Identifier of the acting unit.
        unit: UnitId,
        /// Action being performed.
        action: UnitAction,
    },
    /// Stores or clears the pending projectile rounds of a unit.
    LoadVolley {
        /// Identifier of the firing unit.
        unit: UnitId,
        /// Rounds still to be fired, if any.
        volley: Option<Volley>,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Index of the tick that just started.
        tick: u64,
    },
    /// Confirms that a unit joined the battle.
    UnitSpawned {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Blueprint the unit was built from.
        kind: String,
        /// Side the unit fights for.
        team: Team,
        /// Tile the unit occupies.
        tile: TilePosition,
    },
    /// Confirms that an obstacle was placed.
    ObstacleSpawned {
        /// Identifier assigned to the obstacle.
        obstacle: ObstacleId,
        /// Category of the obstacle.
        kind: ObstacleKind,
        /// Tile the obstacle occupies.
        tile: TilePosition,
    },
    /// Reports that a spawn request was refused.
    SpawnRejected {
        /// Blueprint key carried by the request.
        kind: String,
        /// Tile carried by the request.
        tile: TilePosition,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that a unit moved between two tiles.
    UnitMoved {
        /// Identifier of the unit that moved.
        unit: UnitId,
        /// Tile the unit left.
        from: TilePosition,
        /// Tile the unit now occupies.
        to: TilePosition,
        /// Time the presentation layer should spend animating the move.
        duration: Duration,
    },
    /// Reports that a unit failed to claim its requested tile this tick.
    MoveContested {
        /// Identifier of the unit whose request failed.
        unit: UnitId,
        /// Tile the unit asked for.
        destination: TilePosition,
    },
    /// Announces that a unit entered a new behavioral state.
    UnitStateChanged {
        /// Identifier of the unit.
        unit: UnitId,
        /// State the unit entered.
        state: UnitState,
    },
    /// Announces a visual action performed by a unit.
    UnitAction {
        /// Identifier of the acting unit.
        unit: UnitId,
        /// Action being performed.
        action: UnitAction,
        /// Time the presentation layer should spend on the action.
        duration: Duration,
    },
    /// Reports damage dealt to a unit that survived or died from it.
    UnitDamaged {
        /// Identifier of the damaged unit.
        unit: UnitId,
        /// Hit points subtracted.
        amount: i32,
        /// Hit points left after the damage.
        remaining: i32,
    },
    /// Reports that a unit died and its tile was freed.
    UnitDied {
        /// Identifier of the dead unit.
        unit: UnitId,
        /// Tile the unit occupied.
        tile: TilePosition,
    },
    /// Reports that a unit was removed without dying.
    UnitRemoved {
        /// Identifier of the removed unit.
        unit: UnitId,
        /// Tile the unit occupied.
        tile: TilePosition,
    },
    /// Reports that an obstacle was removed.
    ObstacleRemoved {
        /// Identifier of the removed obstacle.
        obstacle: ObstacleId,
        /// Tile the obstacle occupied.
        tile: TilePosition,
    },
    /// Reports that an obstacle changed state.
    ObstacleStateChanged {
        /// Identifier of the obstacle.
        obstacle: ObstacleId,
        /// State the obstacle entered.
        state: ObstacleState,
    },
}

/// Visual actions the presentation layer may play for a unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnitAction {
    /// Attack wind-up toward a target.
    WindUp {
        /// Unit being faced.
        target: UnitId,
        /// Direction the attacker turns to.
        facing: Facing,
    },
    /// Melee bump toward a target.
    MeleeStrike {
        /// Unit being struck.
        target: UnitId,
    },
    /// A projectile leaves the attacker toward a target.
    ProjectileFired {
        /// Unit the projectile flies at.
        target: UnitId,
        /// Projectile asset key.
        projectile: String,
        /// Whether the projectile leaves a trail.
        trail: bool,
    },
    /// An explosion centered on a tile.
    Blast {
        /// Tile at the center of the explosion.
        center: TilePosition,
        /// Half-width of the affected square.
        radius: u32,
    },
    /// A visual link between attacker and target.
    Tether {
        /// Unit at the other end of the link.
        target: UnitId,
        /// Effect asset key.
        effect: String,
    },
    /// Non-fatal flinch after taking damage.
    HitReaction,
}

/// Horizontal direction a unit faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing decreasing columns.
    Left,
    /// Facing increasing columns.
    Right,
}

impl Facing {
    /// Direction to face when looking from `from` toward `to`.
    ///
    /// Targets in the same column keep the default right-facing pose.
    #[must_use]
    pub const fn toward(from: TilePosition, to: TilePosition) -> Self {
        if to.col() < from.col() {
            Self::Left
        } else {
            Self::Right
        }
    }
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum SpawnError {
    /// No blueprint is registered under the requested key.
    #[error("unknown blueprint `{0}`")]
    UnknownBlueprint(String),
    /// The requested tile lies outside the grid.
    #[error("tile {0} lies outside the grid")]
    OutOfBounds(TilePosition),
    /// The requested tile is a wall.
    #[error("tile {0} is a wall")]
    Wall(TilePosition),
    /// The requested tile is already occupied.
    #[error("tile {0} is occupied")]
    Occupied(TilePosition),
}

/// The two mutually hostile sides of a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// Units commanded by the player.
    Player,
    /// Units opposing the player.
    Enemy,
}

impl Team {
    /// Reports whether units of `other` are hostile to this team.
    #[must_use]
    pub fn is_hostile_to(self, other: Team) -> bool {
        self != other
    }
}

/// Behavioral state of a unit; exactly one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// Standing still without an engagement.
    #[default]
    Idle,
    /// Walking along a planned path.
    Moving,
    /// Engaging a target in place.
    Attacking,
    /// Killed; never observed on a registered unit.
    Dead,
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Entity registered against a tile in the occupancy store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Occupant {
    /// A living unit.
    Unit(UnitId),
    /// An obstacle.
    Obstacle(ObstacleId),
}

/// Location of a single tile expressed as row and column indices.
///
/// Coordinates are signed so that area scans reaching past the grid edge stay
/// representable; such tiles simply never resolve to a [`Tile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePosition {
    row: i32,
    col: i32,
}

impl TilePosition {
    /// Creates a new tile position.
    #[must_use]
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn col(&self) -> i32 {
        self.col
    }

    /// Computes the Manhattan distance between two tiles.
    #[must_use]
    pub const fn manhattan_distance(self, other: TilePosition) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Tile displaced by the provided row and column deltas.
    #[must_use]
    pub const fn offset(self, rows: i32, cols: i32) -> Self {
        Self::new(self.row + rows, self.col + cols)
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Terrain of a single tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Open walkable ground.
    #[default]
    Ground,
    /// Permanently unwalkable wall.
    Wall,
    /// Walkable tile that units try to reach.
    Objective,
}

/// A single grid tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Position of the tile within the grid.
    pub position: TilePosition,
    /// Terrain covering the tile.
    pub terrain: Terrain,
    /// Marks ground tiles that count as part of an objective zone.
    pub objective_zone: bool,
}

impl Tile {
    /// Creates a tile without an objective-zone flag.
    #[must_use]
    pub const fn new(position: TilePosition, terrain: Terrain) -> Self {
        Self {
            position,
            terrain,
            objective_zone: false,
        }
    }

    /// Reports whether units seeking an objective may select this tile.
    #[must_use]
    pub fn is_objective(&self) -> bool {
        self.objective_zone || self.terrain == Terrain::Objective
    }

    /// Reports whether the tile is a wall.
    #[must_use]
    pub fn is_wall(&self) -> bool {
        self.terrain == Terrain::Wall
    }
}

/// Read-only snapshot describing all units on the battlefield.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<Unit>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<Unit>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single unit.
    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&Unit> {
        self.snapshots
            .binary_search_by_key(&unit, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<Unit> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::{Facing, Team, TilePosition, UnitId};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = TilePosition::new(1, 1);
        let destination = TilePosition::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn teams_are_mutually_hostile() {
        assert!(Team::Player.is_hostile_to(Team::Enemy));
        assert!(Team::Enemy.is_hostile_to(Team::Player));
        assert!(!Team::Enemy.is_hostile_to(Team::Enemy));
    }

    #[test]
    fn facing_follows_target_column() {
        let origin = TilePosition::new(2, 2);
        assert_eq!(Facing::toward(origin, TilePosition::new(0, 1)), Facing::Left);
        assert_eq!(Facing::toward(origin, TilePosition::new(4, 3)), Facing::Right);
        assert_eq!(Facing::toward(origin, TilePosition::new(5, 2)), Facing::Right);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn identifiers_and_positions_round_trip_through_bincode() {
        assert_round_trip(&UnitId::new(42));
        assert_round_trip(&TilePosition::new(-3, 7));
        assert_round_trip(&Team::Enemy);
    }
}
