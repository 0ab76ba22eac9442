//! Entity records and the blueprints they are built from.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{ObstacleId, Team, TilePosition, UnitId, UnitState};

/// Attack behavior of a unit, consumed by the combat resolver.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttackPattern {
    /// Single target, adjacent, damage lands immediately.
    Melee,
    /// Single target, ranged, fired as a sequence of rounds.
    Projectile {
        /// Number of rounds fired per strike.
        rounds: u32,
        /// Projectile asset key.
        name: String,
        /// Whether projectiles leave a trail.
        #[serde(default)]
        trail: bool,
    },
    /// Area damage centered on the target tile.
    Blast {
        /// Half-width of the affected square.
        radius: u32,
        /// Projectile carried to the target before the blast, if any.
        #[serde(default)]
        projectile: Option<String>,
        /// Whether the projectile leaves a trail.
        #[serde(default)]
        trail: bool,
        /// Whether allies inside the square are damaged too.
        #[serde(default)]
        friendly_fire: bool,
    },
    /// Passive damage to every hostile around the unit on every tick.
    Aura {
        /// Half-width of the affected square.
        radius: u32,
        /// Effect asset key.
        effect: String,
        /// Whether each victim is visually linked to the unit.
        #[serde(default)]
        tethered: bool,
    },
    /// Single target with a visual link, damage lands immediately.
    Tether {
        /// Effect asset key.
        effect: String,
    },
}

/// Static stat values for a unit type, keyed by name in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitBlueprint {
    /// Display name of the unit type.
    pub name: String,
    /// Starting and maximum hit points.
    pub max_hp: i32,
    /// Damage dealt per hit.
    pub attack: i32,
    /// Ticks between wind-up start and the next wind-up.
    pub attack_speed: u32,
    /// Manhattan distance within which the unit can strike.
    pub range: u32,
    /// Manhattan distance within which the unit acquires hostiles.
    pub threat_range: u32,
    /// Ticks the unit waits after each committed step.
    pub movement_speed: u32,
    /// How the unit attacks.
    pub attack_pattern: AttackPattern,
}

/// Static values for an obstacle type, keyed by name in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleBlueprint {
    /// Display name of the obstacle type.
    pub name: String,
    /// Category of the obstacle.
    pub kind: ObstacleKind,
    /// Hit points, for destructible obstacles.
    #[serde(default)]
    pub hp: Option<i32>,
    /// Presentation hint for whether the obstacle reads as a barrier.
    ///
    /// Informational only: every obstacle holds its tile in the occupancy
    /// grid, so routes treat it as impassable and no move can commit onto
    /// it, whatever this flag says.
    pub blocks_movement: bool,
    /// Damage dealt by the obstacle, if it is a trap.
    #[serde(default)]
    pub attack: Option<i32>,
}

/// Combat and movement statistics copied from a blueprint at spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points.
    pub max_hp: i32,
    /// Damage dealt per hit.
    pub attack: i32,
    /// Manhattan distance within which the unit can strike.
    pub range: u32,
    /// Manhattan distance within which the unit acquires hostiles.
    pub threat_range: u32,
    /// Cooldown ticks applied when a wind-up starts.
    pub attack_speed: u32,
    /// Cooldown ticks applied after each committed step.
    pub movement_speed: u32,
}

impl From<&UnitBlueprint> for UnitStats {
    fn from(blueprint: &UnitBlueprint) -> Self {
        Self {
            max_hp: blueprint.max_hp,
            attack: blueprint.attack,
            range: blueprint.range,
            threat_range: blueprint.threat_range,
            attack_speed: blueprint.attack_speed,
            movement_speed: blueprint.movement_speed,
        }
    }
}

/// Decision state a unit carries between ticks.
///
/// Policies receive a copy of the plan, edit it, and hand it back to the
/// world through `Command::UpdatePlan`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlan {
    /// Behavioral state of the unit.
    pub state: UnitState,
    /// Tile the unit is currently heading for.
    pub current_goal: Option<TilePosition>,
    /// Remaining steps toward the goal, excluding the current tile.
    pub current_path: Option<VecDeque<TilePosition>>,
    /// Forces the next decision to replan even when a path is cached.
    pub needs_repath: bool,
    /// Hostile the unit is tracking.
    pub current_target: Option<UnitId>,
    /// Commits the unit to reaching its objective before fighting.
    pub mission_locked: bool,
}

impl UnitPlan {
    /// First tile of the cached path, if any.
    #[must_use]
    pub fn next_step(&self) -> Option<TilePosition> {
        self.current_path
            .as_ref()
            .and_then(|path| path.front().copied())
    }

    /// Reports whether the cached path passes through the tile.
    #[must_use]
    pub fn path_contains(&self, tile: TilePosition) -> bool {
        self.current_path
            .as_ref()
            .is_some_and(|path| path.contains(&tile))
    }

    /// Reports whether a usable path is cached.
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.current_path
            .as_ref()
            .is_some_and(|path| !path.is_empty())
    }
}

/// Projectile rounds still owed by a unit after its strike.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Volley {
    /// Unit the rounds are aimed at.
    pub target: UnitId,
    /// Rounds left to fire, one per tick.
    pub rounds_remaining: u32,
    /// Projectile asset key.
    pub projectile: String,
    /// Whether projectiles leave a trail.
    pub trail: bool,
}

/// Authoritative record of a single unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier assigned by the world.
    pub id: UnitId,
    /// Blueprint key the unit was built from.
    pub kind: String,
    /// Side the unit fights for.
    pub team: Team,
    /// Stat block copied from the blueprint.
    pub stats: UnitStats,
    /// Current hit points; the unit is removed once this reaches zero.
    pub hp: i32,
    /// Tile the unit occupies.
    pub position: TilePosition,
    /// Decision state carried between ticks.
    pub plan: UnitPlan,
    /// Ticks until the unit may act again.
    pub movement_cooldown: u32,
    /// Set when the current tick found the cooldown already at zero.
    pub ready_for_action: bool,
    /// How the unit attacks.
    pub attack_pattern: AttackPattern,
    /// Pending projectile rounds.
    pub volley: Option<Volley>,
}

impl Unit {
    /// Builds a fresh unit from a blueprint.
    #[must_use]
    pub fn from_blueprint(
        id: UnitId,
        kind: &str,
        blueprint: &UnitBlueprint,
        team: Team,
        position: TilePosition,
    ) -> Self {
        Self {
            id,
            kind: kind.to_owned(),
            team,
            stats: UnitStats::from(blueprint),
            hp: blueprint.max_hp,
            position,
            plan: UnitPlan::default(),
            movement_cooldown: 0,
            ready_for_action: false,
            attack_pattern: blueprint.attack_pattern.clone(),
            volley: None,
        }
    }

    /// Behavioral state of the unit.
    #[must_use]
    pub fn state(&self) -> UnitState {
        self.plan.state
    }

    /// Reports whether the unit still has hit points.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Manhattan distance between this unit and a tile.
    #[must_use]
    pub fn distance_to(&self, tile: TilePosition) -> u32 {
        self.position.manhattan_distance(tile)
    }
}

/// Category of an obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    /// Wall segment powered by a generator.
    LaserWall,
    /// Electrified wall segment powered by a generator.
    ElectricWall,
    /// Trap that damages whoever triggers it.
    Mine,
    /// Destructible barrier.
    Fence,
    /// Power source for walls.
    Generator,
}

/// Operational state of an obstacle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleState {
    /// Working normally.
    #[default]
    Active,
    /// Unpowered or switched off.
    Inactive,
    /// Destroyed but still present.
    Broken,
}

/// Authoritative record of a single obstacle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Unique identifier assigned by the world.
    pub id: ObstacleId,
    /// Display name taken from the blueprint.
    pub name: String,
    /// Category of the obstacle.
    pub kind: ObstacleKind,
    /// Tile the obstacle occupies.
    pub position: TilePosition,
    /// Operational state.
    pub state: ObstacleState,
    /// Hit points, for destructible obstacles.
    pub hp: Option<i32>,
    /// Generator powering this obstacle.
    pub owner: Option<ObstacleId>,
    /// Presentation hint copied from the blueprint; see
    /// [`ObstacleBlueprint::blocks_movement`].
    pub blocks_movement: bool,
    /// Damage dealt by the obstacle, if it is a trap.
    pub attack: Option<i32>,
}

impl Obstacle {
    /// Builds a fresh obstacle from a blueprint.
    #[must_use]
    pub fn from_blueprint(
        id: ObstacleId,
        blueprint: &ObstacleBlueprint,
        position: TilePosition,
        owner: Option<ObstacleId>,
    ) -> Self {
        Self {
            id,
            name: blueprint.name.clone(),
            kind: blueprint.kind,
            position,
            state: ObstacleState::Active,
            hp: blueprint.hp,
            owner,
            blocks_movement: blueprint.blocks_movement,
            attack: blueprint.attack,
        }
    }
}
