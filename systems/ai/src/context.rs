//! Read-only view handed to policies while they decide.

use std::collections::{BTreeSet, VecDeque};

use tactica_core::{TilePosition, Unit, UnitId};
use tactica_system_pathfinding::Pathfinder;
use tactica_world::{query, World};
use tracing::debug;

use crate::cost::{passable, RouteCost};

/// Everything a policy may consult about the battlefield.
#[derive(Clone, Copy, Debug)]
pub struct PolicyContext<'a> {
    world: &'a World,
    unit: &'a Unit,
    reserved: &'a BTreeSet<TilePosition>,
}

impl<'a> PolicyContext<'a> {
    /// Creates a context for `unit`.
    #[must_use]
    pub const fn new(world: &'a World, unit: &'a Unit, reserved: &'a BTreeSet<TilePosition>) -> Self {
        Self {
            world,
            unit,
            reserved,
        }
    }

    /// Authoritative world state.
    #[must_use]
    pub const fn world(&self) -> &'a World {
        self.world
    }

    /// Unit the decision is made for, as it stood when the tick began.
    #[must_use]
    pub const fn unit(&self) -> &'a Unit {
        self.unit
    }

    /// Tiles reserved for the current tick, including destinations already
    /// requested by other units.
    #[must_use]
    pub const fn reserved(&self) -> &'a BTreeSet<TilePosition> {
        self.reserved
    }

    /// Plans a route to `goal` priced for this unit.
    ///
    /// The returned steps exclude the unit's own tile.
    #[must_use]
    pub fn find_route(&self, goal: TilePosition, mission_locked: bool) -> Option<VecDeque<TilePosition>> {
        let map = query::tile_map(self.world);
        let pathfinder = Pathfinder::new(map.rows(), map.cols());
        let pricing = RouteCost::new(self.world, self.unit, mission_locked, self.reserved);
        let route = pathfinder.find_path(
            self.unit.position,
            goal,
            |tile| passable(self.world, tile),
            |tile| pricing.cost(tile),
        );
        if route.is_none() {
            debug!(unit = self.unit.id.get(), %goal, "no route to goal");
        }
        route.map(|path| path.steps().collect())
    }

    /// Closest objective tile the unit may claim.
    #[must_use]
    pub fn nearest_objective(&self) -> Option<TilePosition> {
        query::nearest_objective(self.world, self.unit)
    }

    /// Hostile the unit should engage, keeping `current` while it stays valid.
    #[must_use]
    pub fn select_target(&self, current: Option<UnitId>) -> Option<&'a Unit> {
        query::select_target(self.world, self.unit, current)
            .and_then(|id| query::unit(self.world, id))
    }

    /// Unit standing on `tile`, if any.
    #[must_use]
    pub fn unit_at(&self, tile: TilePosition) -> Option<&'a Unit> {
        query::unit_at(self.world, tile)
    }
}
