//! Unit-specific step pricing used when planning routes.

use std::collections::BTreeSet;

use tactica_core::{Occupant, TilePosition, Unit};
use tactica_world::{query, World};

/// Cost of entering a free, unreserved tile.
pub const OPEN_TILE_COST: u32 = 1;
/// Cost of entering a free tile that another unit already requested this tick.
pub const RESERVED_TILE_COST: u32 = 3;
/// Cost of entering a tile held by a friendly unit.
pub const FRIENDLY_TILE_COST: u32 = 5;
/// Cost of entering a tile held by a hostile unit while mission-locked.
pub const LOCKED_HOSTILE_TILE_COST: u32 = 15;
/// Cost of entering a tile held by a hostile unit.
pub const HOSTILE_TILE_COST: u32 = 120;
/// Discount granted per nearby friend whose route shares the tile.
pub const CONVOY_DISCOUNT: u32 = 2;
/// Manhattan radius within which friends count toward the convoy discount.
pub const CONVOY_RADIUS: u32 = 3;

/// Prices tiles from the point of view of a single moving unit.
///
/// Units are soft obstacles: their tiles stay enterable during planning but
/// cost more, so routes bend around crowds unless no cheaper way exists.
///
/// `reserved` holds the tiles snapshotted before collection plus the
/// destinations claimed by units polled earlier in the same tick. Snapshot
/// tiles are still held by units and priced as occupied; only the claimed
/// destinations of free tiles fall through to [`RESERVED_TILE_COST`].
#[derive(Debug)]
pub struct RouteCost<'a> {
    world: &'a World,
    mover: &'a Unit,
    mission_locked: bool,
    reserved: &'a BTreeSet<TilePosition>,
    convoy: Vec<&'a Unit>,
}

impl<'a> RouteCost<'a> {
    /// Captures the pricing context for `mover`.
    #[must_use]
    pub fn new(
        world: &'a World,
        mover: &'a Unit,
        mission_locked: bool,
        reserved: &'a BTreeSet<TilePosition>,
    ) -> Self {
        let convoy = query::units(world)
            .filter(|friend| friend.id != mover.id && friend.team == mover.team)
            .filter(|friend| friend.position.manhattan_distance(mover.position) <= CONVOY_RADIUS)
            .filter(|friend| friend.plan.has_path())
            .collect();
        Self {
            world,
            mover,
            mission_locked,
            reserved,
            convoy,
        }
    }

    /// Cost of stepping onto `tile`; never below one.
    #[must_use]
    pub fn cost(&self, tile: TilePosition) -> u32 {
        if tile == self.mover.position {
            return OPEN_TILE_COST;
        }

        let base = match query::unit_at(self.world, tile) {
            Some(other) if self.mover.team.is_hostile_to(other.team) => {
                if self.mission_locked {
                    LOCKED_HOSTILE_TILE_COST
                } else {
                    HOSTILE_TILE_COST
                }
            }
            Some(_) => FRIENDLY_TILE_COST,
            None if self.reserved.contains(&tile) => RESERVED_TILE_COST,
            None => OPEN_TILE_COST,
        };

        let sharing = self
            .convoy
            .iter()
            .filter(|friend| friend.plan.path_contains(tile))
            .count();
        let discount = u32::try_from(sharing)
            .unwrap_or(u32::MAX)
            .saturating_mul(CONVOY_DISCOUNT);
        base.saturating_sub(discount).max(OPEN_TILE_COST)
    }
}

/// Reports whether a route may pass through `tile` at all.
///
/// Walls and obstacles are hard blockers; units are priced by [`RouteCost`].
/// An obstacle blocks whether or not its blueprint sets `blocks_movement`.
#[must_use]
pub fn passable(world: &World, tile: TilePosition) -> bool {
    let open_ground = query::tile_at(world, tile).is_some_and(|cell| !cell.is_wall());
    open_ground && !matches!(query::occupant(world, tile), Some(Occupant::Obstacle(_)))
}
