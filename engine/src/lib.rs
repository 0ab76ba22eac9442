#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Discrete-tick driver that wires the world to its systems.
//!
//! [`Simulation`] owns the authoritative [`World`] together with the movement
//! scheduler and combat resolver. Hosts call [`Simulation::advance_tick`] at
//! whatever cadence they like; every event produced along the way is handed
//! to the optional [`PresentationSink`] and returned to the caller.

use std::{collections::BTreeMap, fmt, time::Duration};

use tactica_core::{
    Command, Event, ObstacleId, SpawnError, Team, Tile, TilePosition, Unit, UnitId, UnitView,
    DEFAULT_TICK_INTERVAL,
};
use tactica_system_ai::{cost::passable, UnitPolicy};
use tactica_system_combat::Combat;
use tactica_system_movement::{Movement, DEFAULT_RNG_SEED};
use tactica_system_pathfinding::{Path, Pathfinder, UNIFORM_COST};
use tactica_world::{self as world, query, Catalog, TileMap, World};
use tracing::{info, trace, warn};

/// Tunables fixed for the lifetime of a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Wall-clock spacing between ticks, used to derive presentation durations.
    pub tick_interval: Duration,
    /// Seed for the generator that breaks movement conflicts.
    pub rng_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            rng_seed: DEFAULT_RNG_SEED,
        }
    }
}

/// Receives every event the simulation produces. The core never waits on it.
pub trait PresentationSink {
    /// Called once per event in emission order.
    fn notify(&mut self, event: &Event);
}

/// Tile-based combat simulation facade.
pub struct Simulation {
    world: World,
    movement: Movement,
    combat: Combat,
    sink: Option<Box<dyn PresentationSink>>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &query::tick_index(&self.world))
            .field("units", &query::unit_count(&self.world))
            .field("obstacles", &query::obstacle_count(&self.world))
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates an empty battlefield over `tiles`.
    #[must_use]
    pub fn new(tiles: TileMap, catalog: Catalog, config: SimulationConfig) -> Self {
        Self {
            world: World::new(tiles, catalog).with_tick_interval(config.tick_interval),
            movement: Movement::new(config.rng_seed),
            combat: Combat::new(),
            sink: None,
        }
    }

    /// Routes every future event to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn PresentationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Runs one full tick and returns the events it produced.
    ///
    /// Phases run in a fixed order: tiles held by units are reserved, the
    /// clock advances and cooldowns drop, ready units consult their policies,
    /// move requests are arbitrated and committed, combat resolves, and the
    /// reservations are refreshed for observers.
    pub fn advance_tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        let mut commands = Vec::new();

        self.movement.snapshot_reservations(&self.world);
        world::apply(&mut self.world, Command::Tick, &mut events);

        self.movement.collect_requests(&self.world, &mut commands);
        apply_all(&mut self.world, &mut commands, &mut events);
        self.movement.resolve_requests(&self.world, &mut commands);
        apply_all(&mut self.world, &mut commands, &mut events);

        self.combat.resolve(&mut self.world, &mut events);

        self.movement.snapshot_reservations(&self.world);
        self.movement.prune(&self.world);

        trace!(
            tick = query::tick_index(&self.world),
            events = events.len(),
            "tick complete"
        );
        self.publish(&events);
        events
    }

    /// Places a unit of blueprint `kind` driven by `policy`.
    pub fn spawn_unit(
        &mut self,
        kind: &str,
        team: Team,
        policy: Box<dyn UnitPolicy>,
        tile: TilePosition,
    ) -> Result<UnitId, SpawnError> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::SpawnUnit {
                kind: kind.to_owned(),
                team,
                tile,
            },
            &mut events,
        );
        self.publish(&events);

        let unit = spawn_outcome(&events, |event| match event {
            Event::UnitSpawned { unit, .. } => Some(*unit),
            _ => None,
        })
        .map_err(|reason| {
            warn!(%kind, %tile, %reason, "unit spawn rejected");
            reason
        })?;
        info!(unit = unit.get(), %kind, ?team, %tile, policy = policy.name(), "unit spawned");
        self.movement.assign_policy(unit, policy);
        Ok(unit)
    }

    /// Places an unowned obstacle of blueprint `kind`.
    pub fn spawn_obstacle(&mut self, kind: &str, tile: TilePosition) -> Result<ObstacleId, SpawnError> {
        self.spawn_owned_obstacle(kind, tile, None)
    }

    /// Places an obstacle that depends on the `owner` generator.
    pub fn spawn_owned_obstacle(
        &mut self,
        kind: &str,
        tile: TilePosition,
        owner: Option<ObstacleId>,
    ) -> Result<ObstacleId, SpawnError> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::SpawnObstacle {
                kind: kind.to_owned(),
                tile,
                owner,
            },
            &mut events,
        );
        self.publish(&events);

        spawn_outcome(&events, |event| match event {
            Event::ObstacleSpawned { obstacle, .. } => Some(*obstacle),
            _ => None,
        })
        .map_err(|reason| {
            warn!(%kind, %tile, %reason, "obstacle spawn rejected");
            reason
        })
    }

    /// Despawns a unit and drops its policy. Returns `false` for unknown units.
    pub fn remove_unit(&mut self, unit: UnitId) -> bool {
        self.movement.forget(unit);
        let events = self.submit(Command::RemoveUnit { unit });
        events
            .iter()
            .any(|event| matches!(event, Event::UnitRemoved { .. }))
    }

    /// Despawns an obstacle. Returns `false` for unknown obstacles.
    pub fn remove_obstacle(&mut self, obstacle: ObstacleId) -> bool {
        let events = self.submit(Command::RemoveObstacle { obstacle });
        events
            .iter()
            .any(|event| matches!(event, Event::ObstacleRemoved { .. }))
    }

    /// Deals `amount` damage to `target` outside the combat phase.
    pub fn apply_damage(&mut self, target: UnitId, amount: i32) -> Vec<Event> {
        self.submit(Command::ApplyDamage { target, amount })
    }

    /// Plans a route over walls and obstacles, ignoring units.
    ///
    /// Tiles listed in `cost_overrides` cost the given amount; every other
    /// tile costs [`UNIFORM_COST`].
    #[must_use]
    pub fn find_path(
        &self,
        from: TilePosition,
        to: TilePosition,
        cost_overrides: &BTreeMap<TilePosition, u32>,
    ) -> Option<Path> {
        let map = query::tile_map(&self.world);
        Pathfinder::new(map.rows(), map.cols()).find_path(
            from,
            to,
            |tile| passable(&self.world, tile),
            |tile| cost_overrides.get(&tile).copied().unwrap_or(UNIFORM_COST),
        )
    }

    /// Unit standing on `tile`, if any.
    #[must_use]
    pub fn unit_at(&self, tile: TilePosition) -> Option<&Unit> {
        query::unit_at(&self.world, tile)
    }

    /// Reports whether a unit could step onto `tile` right now.
    #[must_use]
    pub fn is_walkable(&self, tile: TilePosition) -> bool {
        query::is_walkable(&self.world, tile)
    }

    /// Snapshot of every unit in identifier order.
    #[must_use]
    pub fn units_snapshot(&self) -> UnitView {
        query::unit_view(&self.world)
    }

    /// Bounds-checked tile lookup.
    #[must_use]
    pub fn tile_at(&self, tile: TilePosition) -> Option<&Tile> {
        query::tile_at(&self.world, tile)
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        query::tick_index(&self.world)
    }

    /// Read-only access to the authoritative state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Name of the policy driving `unit`.
    #[must_use]
    pub fn policy_name(&self, unit: UnitId) -> Option<&'static str> {
        self.movement.policy_name(unit)
    }

    fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.publish(&events);
        events
    }

    fn publish(&mut self, events: &[Event]) {
        if let Some(sink) = self.sink.as_mut() {
            for event in events {
                sink.notify(event);
            }
        }
    }
}

fn apply_all(world: &mut World, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
    for command in commands.drain(..) {
        world::apply(world, command, events);
    }
}

fn spawn_outcome<T>(
    events: &[Event],
    spawned: impl Fn(&Event) -> Option<T>,
) -> Result<T, SpawnError> {
    for event in events {
        if let Some(id) = spawned(event) {
            return Ok(id);
        }
        if let Event::SpawnRejected { reason, .. } = event {
            return Err(reason.clone());
        }
    }
    Err(SpawnError::UnknownBlueprint(String::new()))
}
