#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battlefield state for the Tactica simulation.
//!
//! The world owns the tile map, the occupancy store, and the unit and obstacle
//! registries. Systems never touch these directly: they read through [`query`]
//! and submit [`Command`] values to [`apply`], which mutates the state and
//! reports what happened as [`Event`] values.

use std::time::Duration;

use tactica_core::{
    Command, Event, Facing, Obstacle, ObstacleId, ObstacleKind, ObstacleState, Occupant,
    SpawnError, Team, TilePosition, Unit, UnitAction, UnitId, UnitState,
    DEFAULT_TICK_INTERVAL,
};
use tracing::{debug, info};

mod catalog;
mod occupancy;
mod registry;
mod tiles;

pub use catalog::{Catalog, CatalogError};
pub use occupancy::OccupancyGrid;
pub use tiles::TileMap;

use registry::{ObstacleRegistry, UnitRegistry};

/// Represents the authoritative battlefield state.
#[derive(Debug)]
pub struct World {
    tiles: TileMap,
    occupancy: OccupancyGrid,
    units: UnitRegistry,
    obstacles: ObstacleRegistry,
    catalog: Catalog,
    tick_interval: Duration,
    tick_index: u64,
}

impl World {
    /// Creates an empty battlefield over the provided tiles.
    #[must_use]
    pub fn new(tiles: TileMap, catalog: Catalog) -> Self {
        let occupancy = OccupancyGrid::new(tiles.rows(), tiles.cols());
        Self {
            tiles,
            occupancy,
            units: UnitRegistry::new(),
            obstacles: ObstacleRegistry::new(),
            catalog,
            tick_interval: DEFAULT_TICK_INTERVAL,
            tick_index: 0,
        }
    }

    /// Overrides the tick spacing used to derive presentation durations.
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    fn ticks(&self, count: u32) -> Duration {
        self.tick_interval.saturating_mul(count)
    }

    fn validate_spawn(&self, tile: TilePosition) -> Result<(), SpawnError> {
        let Some(cell) = self.tiles.tile(tile) else {
            return Err(SpawnError::OutOfBounds(tile));
        };
        if cell.is_wall() {
            return Err(SpawnError::Wall(tile));
        }
        if self.occupancy.is_occupied(tile) {
            return Err(SpawnError::Occupied(tile));
        }
        Ok(())
    }

    fn spawn_unit(
        &mut self,
        kind: String,
        team: Team,
        tile: TilePosition,
    ) -> Result<Event, SpawnError> {
        let blueprint = self
            .catalog
            .unit(&kind)
            .ok_or_else(|| SpawnError::UnknownBlueprint(kind.clone()))?;
        self.validate_spawn(tile)?;

        let id = self.units.allocate();
        let unit = Unit::from_blueprint(id, &kind, blueprint, team, tile);
        self.units.insert(unit);
        self.occupancy.register(Occupant::Unit(id), tile);
        Ok(Event::UnitSpawned {
            unit: id,
            kind,
            team,
            tile,
        })
    }

    fn spawn_obstacle(
        &mut self,
        kind: &str,
        tile: TilePosition,
        owner: Option<ObstacleId>,
    ) -> Result<Event, SpawnError> {
        let blueprint = self
            .catalog
            .obstacle(kind)
            .ok_or_else(|| SpawnError::UnknownBlueprint(kind.to_owned()))?;
        self.validate_spawn(tile)?;

        let id = self.obstacles.allocate();
        let obstacle = Obstacle::from_blueprint(id, blueprint, tile, owner);
        let event = Event::ObstacleSpawned {
            obstacle: id,
            kind: obstacle.kind,
            tile,
        };
        self.obstacles.insert(obstacle);
        self.occupancy.register(Occupant::Obstacle(id), tile);
        Ok(event)
    }

    /// Frees a tile and sends every unit heading for it back to planning.
    fn release_tile(&mut self, tile: TilePosition, out_events: &mut Vec<Event>) {
        self.occupancy.clear(tile);
        for unit in self.units.iter_mut() {
            if unit.plan.current_goal != Some(tile) {
                continue;
            }
            unit.plan.current_goal = None;
            unit.plan.current_path = None;
            unit.plan.needs_repath = true;
            if unit.plan.state != UnitState::Idle {
                unit.plan.state = UnitState::Idle;
                out_events.push(Event::UnitStateChanged {
                    unit: unit.id,
                    state: UnitState::Idle,
                });
            }
        }
    }

    fn set_state(unit: &mut Unit, state: UnitState, out_events: &mut Vec<Event>) {
        if unit.plan.state != state {
            unit.plan.state = state;
            out_events.push(Event::UnitStateChanged {
                unit: unit.id,
                state,
            });
        }
    }

    fn commit_move(&mut self, id: UnitId, to: TilePosition, out_events: &mut Vec<Event>) {
        let walkable = query::is_walkable(self, to);
        let duration = match self.units.get(id) {
            Some(unit) => self.ticks(unit.stats.movement_speed),
            None => return,
        };
        let Some(unit) = self.units.get_mut(id) else {
            return;
        };
        if !walkable || unit.position.manhattan_distance(to) != 1 {
            unit.plan.needs_repath = true;
            debug!(unit = id.get(), %to, "move commit refused");
            out_events.push(Event::MoveContested {
                unit: id,
                destination: to,
            });
            return;
        }

        let from = unit.position;
        unit.position = to;
        unit.movement_cooldown = unit.stats.movement_speed;
        if let Some(path) = unit.plan.current_path.as_mut() {
            if path.front() == Some(&to) {
                let _ = path.pop_front();
            }
        }
        self.occupancy.clear(from);
        self.occupancy.register(Occupant::Unit(id), to);
        out_events.push(Event::UnitMoved {
            unit: id,
            from,
            to,
            duration,
        });
    }

    fn apply_damage(&mut self, target: UnitId, amount: i32, out_events: &mut Vec<Event>) {
        let hit_duration = self.tick_interval;
        let Some(unit) = self.units.get_mut(target) else {
            return;
        };
        unit.hp = unit.hp.saturating_sub(amount);
        let remaining = unit.hp;
        out_events.push(Event::UnitDamaged {
            unit: target,
            amount,
            remaining,
        });

        if remaining > 0 {
            out_events.push(Event::UnitAction {
                unit: target,
                action: UnitAction::HitReaction,
                duration: hit_duration,
            });
            return;
        }

        if let Some(dead) = self.units.remove(target) {
            let tile = dead.position;
            info!(unit = target.get(), kind = %dead.kind, %tile, "unit died");
            out_events.push(Event::UnitStateChanged {
                unit: target,
                state: UnitState::Dead,
            });
            out_events.push(Event::UnitDied { unit: target, tile });
            self.release_tile(tile, out_events);
        }
    }

    fn remove_obstacle(&mut self, id: ObstacleId, out_events: &mut Vec<Event>) {
        let Some(obstacle) = self.obstacles.remove(id) else {
            return;
        };
        let tile = obstacle.position;
        out_events.push(Event::ObstacleRemoved { obstacle: id, tile });
        self.release_tile(tile, out_events);

        if obstacle.kind != ObstacleKind::Generator {
            return;
        }
        for owned in self.obstacles.iter_mut() {
            if owned.owner == Some(id) && owned.state == ObstacleState::Active {
                owned.state = ObstacleState::Inactive;
                out_events.push(Event::ObstacleStateChanged {
                    obstacle: owned.id,
                    state: ObstacleState::Inactive,
                });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
            for unit in world.units.iter_mut() {
                unit.ready_for_action = unit.movement_cooldown == 0;
                unit.movement_cooldown = unit.movement_cooldown.saturating_sub(1);
            }
        }
        Command::SpawnUnit { kind, team, tile } => {
            match world.spawn_unit(kind.clone(), team, tile) {
                Ok(event) => out_events.push(event),
                Err(reason) => {
                    debug!(%kind, %tile, %reason, "unit spawn rejected");
                    out_events.push(Event::SpawnRejected { kind, tile, reason });
                }
            }
        }
        Command::SpawnObstacle { kind, tile, owner } => {
            match world.spawn_obstacle(&kind, tile, owner) {
                Ok(event) => out_events.push(event),
                Err(reason) => {
                    debug!(%kind, %tile, %reason, "obstacle spawn rejected");
                    out_events.push(Event::SpawnRejected { kind, tile, reason });
                }
            }
        }
        Command::RemoveUnit { unit } => {
            if let Some(removed) = world.units.remove(unit) {
                let tile = removed.position;
                info!(unit = unit.get(), %tile, "unit removed");
                out_events.push(Event::UnitRemoved { unit, tile });
                world.release_tile(tile, out_events);
            }
        }
        Command::RemoveObstacle { obstacle } => world.remove_obstacle(obstacle, out_events),
        Command::UpdatePlan { unit, plan } => {
            if let Some(record) = world.units.get_mut(unit) {
                let state = plan.state;
                let previous = std::mem::replace(&mut record.plan, plan);
                if previous.state != state {
                    out_events.push(Event::UnitStateChanged { unit, state });
                }
            }
        }
        Command::CommitMove { unit, to } => world.commit_move(unit, to, out_events),
        Command::RejectMove {
            unit,
            destination,
            drop_goal,
        } => {
            if let Some(record) = world.units.get_mut(unit) {
                record.plan.needs_repath = true;
                if drop_goal && record.plan.current_goal == Some(destination) {
                    record.plan.current_goal = None;
                }
                out_events.push(Event::MoveContested { unit, destination });
            }
        }
        Command::SetTarget { unit, target } => {
            if let Some(record) = world.units.get_mut(unit) {
                record.plan.current_target = target;
            }
        }
        Command::StandDown {
            unit,
            reset_cooldown,
        } => {
            if let Some(record) = world.units.get_mut(unit) {
                if reset_cooldown {
                    record.movement_cooldown = 0;
                    record.plan.current_target = None;
                }
                World::set_state(record, UnitState::Idle, out_events);
            }
        }
        Command::BeginWindUp { unit, target } => {
            let target_tile = world.units.get(target).map(|record| record.position);
            let Some(attack_speed) = world.units.get(unit).map(|record| record.stats.attack_speed)
            else {
                return;
            };
            let duration = world.ticks(attack_speed);
            if let Some(record) = world.units.get_mut(unit) {
                record.movement_cooldown = attack_speed;
                let facing = target_tile
                    .map_or(Facing::Right, |tile| Facing::toward(record.position, tile));
                out_events.push(Event::UnitAction {
                    unit,
                    action: UnitAction::WindUp { target, facing },
                    duration,
                });
            }
        }
        Command::ApplyDamage { target, amount } => world.apply_damage(target, amount, out_events),
        Command::PlayAction { unit, action } => {
            if world.units.get(unit).is_some() {
                out_events.push(Event::UnitAction {
                    unit,
                    action,
                    duration: world.tick_interval,
                });
            }
        }
        Command::LoadVolley { unit, volley } => {
            if let Some(record) = world.units.get_mut(unit) {
                record.volley = volley;
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{Catalog, OccupancyGrid, TileMap, World};
    use tactica_core::{
        Obstacle, ObstacleId, Occupant, Tile, TilePosition, Unit, UnitId, UnitPlan, UnitView,
    };

    /// Provides read-only access to the tile layout.
    #[must_use]
    pub fn tile_map(world: &World) -> &TileMap {
        &world.tiles
    }

    /// Bounds-checked tile lookup.
    #[must_use]
    pub fn tile_at(world: &World, position: TilePosition) -> Option<&Tile> {
        world.tiles.tile(position)
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Wall-clock spacing between ticks used for presentation durations.
    #[must_use]
    pub fn tick_interval(world: &World) -> Duration {
        world.tick_interval
    }

    /// Blueprint catalog consulted by spawn commands.
    #[must_use]
    pub fn catalog(world: &World) -> &Catalog {
        &world.catalog
    }

    /// Exposes the occupancy store.
    #[must_use]
    pub fn occupancy(world: &World) -> &OccupancyGrid {
        &world.occupancy
    }

    /// Looks up a single unit.
    #[must_use]
    pub fn unit(world: &World, id: UnitId) -> Option<&Unit> {
        world.units.get(id)
    }

    /// Iterates every registered unit in identifier order.
    pub fn units(world: &World) -> impl Iterator<Item = &Unit> {
        world.units.iter()
    }

    /// Identifiers of every registered unit in ascending order.
    #[must_use]
    pub fn unit_ids(world: &World) -> Vec<UnitId> {
        world.units.iter().map(|unit| unit.id).collect()
    }

    /// Captures a read-only snapshot of every unit.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(world.units.iter().cloned().collect())
    }

    /// Number of registered units.
    #[must_use]
    pub fn unit_count(world: &World) -> usize {
        world.units.len()
    }

    /// Number of registered obstacles.
    #[must_use]
    pub fn obstacle_count(world: &World) -> usize {
        world.obstacles.len()
    }

    /// Looks up a single obstacle.
    #[must_use]
    pub fn obstacle(world: &World, id: ObstacleId) -> Option<&Obstacle> {
        world.obstacles.get(id)
    }

    /// Iterates every registered obstacle in identifier order.
    pub fn obstacles(world: &World) -> impl Iterator<Item = &Obstacle> {
        world.obstacles.iter()
    }

    /// Entity registered on a tile, if any.
    #[must_use]
    pub fn occupant(world: &World, position: TilePosition) -> Option<Occupant> {
        world.occupancy.occupant(position)
    }

    /// Unit standing on a tile, if any.
    #[must_use]
    pub fn unit_at(world: &World, position: TilePosition) -> Option<&Unit> {
        match world.occupancy.occupant(position)? {
            Occupant::Unit(id) => world.units.get(id),
            Occupant::Obstacle(_) => None,
        }
    }

    /// Obstacle placed on a tile, if any.
    #[must_use]
    pub fn obstacle_at(world: &World, position: TilePosition) -> Option<&Obstacle> {
        match world.occupancy.occupant(position)? {
            Occupant::Obstacle(id) => world.obstacles.get(id),
            Occupant::Unit(_) => None,
        }
    }

    /// Reports whether a unit could step onto the tile right now.
    ///
    /// Out-of-bounds tiles, walls, and occupied tiles are not walkable.
    #[must_use]
    pub fn is_walkable(world: &World, position: TilePosition) -> bool {
        world
            .tiles
            .tile(position)
            .is_some_and(|tile| !tile.is_wall())
            && !world.occupancy.is_occupied(position)
    }

    /// Closest objective tile the unit may claim.
    ///
    /// Tiles are scanned in row-major order and only a strictly smaller
    /// distance replaces the current best, so equidistant ties resolve to the
    /// earliest tile in scan order. Tiles occupied by anything other than the
    /// unit itself are skipped.
    #[must_use]
    pub fn nearest_objective(world: &World, unit: &Unit) -> Option<TilePosition> {
        let mut best: Option<(u32, TilePosition)> = None;
        for tile in world.tiles.iter() {
            if !tile.is_objective() || tile.is_wall() {
                continue;
            }
            match world.occupancy.occupant(tile.position) {
                None => {}
                Some(Occupant::Unit(id)) if id == unit.id => {}
                Some(_) => continue,
            }
            let distance = unit.distance_to(tile.position);
            if best.map_or(true, |(closest, _)| distance < closest) {
                best = Some((distance, tile.position));
            }
        }
        best.map(|(_, position)| position)
    }

    /// Hostile the unit should engage.
    ///
    /// `current` is kept while it is alive, hostile, and inside the unit's
    /// threat range; otherwise the nearest hostile inside the threat range is
    /// chosen, with ties going to the lowest identifier.
    #[must_use]
    pub fn select_target(world: &World, unit: &Unit, current: Option<UnitId>) -> Option<UnitId> {
        let in_threat = |candidate: &Unit| {
            candidate.is_alive()
                && unit.team.is_hostile_to(candidate.team)
                && unit.distance_to(candidate.position) <= unit.stats.threat_range
        };

        if let Some(existing) = current.and_then(|id| world.units.get(id)) {
            if in_threat(existing) {
                return Some(existing.id);
            }
        }

        world
            .units
            .iter()
            .filter(|candidate| in_threat(candidate))
            .min_by_key(|candidate| (unit.distance_to(candidate.position), candidate.id))
            .map(|candidate| candidate.id)
    }

    /// Units standing inside the square of the given radius, in row-major order.
    #[must_use]
    pub fn units_in_square(world: &World, center: TilePosition, radius: u32) -> Vec<UnitId> {
        world
            .tiles
            .square_around(center, radius)
            .filter_map(|tile| unit_at(world, tile))
            .map(|unit| unit.id)
            .collect()
    }

    /// Units of a team other than `unit`'s inside the square around it.
    #[must_use]
    pub fn hostiles_in_square(world: &World, unit: &Unit, radius: u32) -> Vec<UnitId> {
        world
            .tiles
            .square_around(unit.position, radius)
            .filter_map(|tile| unit_at(world, tile))
            .filter(|candidate| unit.team.is_hostile_to(candidate.team))
            .map(|candidate| candidate.id)
            .collect()
    }

    /// Plan currently carried by a unit.
    #[must_use]
    pub fn plan(world: &World, id: UnitId) -> Option<&UnitPlan> {
        world.units.get(id).map(|unit| &unit.plan)
    }
}
