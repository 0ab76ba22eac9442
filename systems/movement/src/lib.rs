#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick-driven movement scheduler.
//!
//! Movement runs in two phases per tick. During collection every unit that is
//! ready to act consults its policy, which yields an updated plan and an
//! optional destination. During resolution the requests are grouped by
//! destination and each group produces at most one committed move; every
//! other requester is told to replan. Reserved tiles are snapshotted before
//! collection and again after the tick so that no two units can swap through
//! each other or land on the same tile.

use std::collections::{BTreeMap, BTreeSet};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tactica_core::{Command, TilePosition, UnitId};
use tactica_system_ai::{PolicyContext, UnitPolicy};
use tactica_world::{query, World};
use tracing::{debug, trace};

/// Seed used when the host does not provide one.
pub const DEFAULT_RNG_SEED: u64 = 0x7ac7_1ca5_eed0_0001;

/// Pure system that polls unit policies and arbitrates their move requests.
#[derive(Debug)]
pub struct Movement {
    policies: BTreeMap<UnitId, Box<dyn UnitPolicy>>,
    reserved: BTreeSet<TilePosition>,
    requests: BTreeMap<UnitId, TilePosition>,
    rng: ChaCha8Rng,
}

impl Movement {
    /// Creates a scheduler whose conflict tie-breaks follow `rng_seed`.
    #[must_use]
    pub fn new(rng_seed: u64) -> Self {
        Self {
            policies: BTreeMap::new(),
            reserved: BTreeSet::new(),
            requests: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
        }
    }

    /// Binds `policy` to `unit`, replacing any previous policy.
    pub fn assign_policy(&mut self, unit: UnitId, policy: Box<dyn UnitPolicy>) {
        let _ = self.policies.insert(unit, policy);
    }

    /// Drops the policy and any pending request of `unit`.
    pub fn forget(&mut self, unit: UnitId) {
        let _ = self.policies.remove(&unit);
        let _ = self.requests.remove(&unit);
    }

    /// Drops policies bound to units the world no longer knows.
    pub fn prune(&mut self, world: &World) {
        self.policies
            .retain(|unit, _| query::unit(world, *unit).is_some());
    }

    /// Name of the policy bound to `unit`.
    #[must_use]
    pub fn policy_name(&self, unit: UnitId) -> Option<&'static str> {
        self.policies.get(&unit).map(|policy| policy.name())
    }

    /// Tiles reserved by the latest snapshot.
    #[must_use]
    pub fn reserved_tiles(&self) -> &BTreeSet<TilePosition> {
        &self.reserved
    }

    /// Move requests gathered by the latest collection, keyed by unit.
    #[must_use]
    pub fn pending_requests(&self) -> &BTreeMap<UnitId, TilePosition> {
        &self.requests
    }

    /// Reserves the tile of every unit currently on the battlefield.
    pub fn snapshot_reservations(&mut self, world: &World) {
        self.reserved = query::units(world).map(|unit| unit.position).collect();
    }

    /// Polls the policy of every unit flagged ready by the latest tick.
    ///
    /// Emits one `UpdatePlan` per polled unit, in identifier order, and
    /// remembers the destinations for [`Movement::resolve_requests`]. Units
    /// still cooling down are skipped. Each policy sees the snapshot plus
    /// every destination requested before it this tick as reserved.
    pub fn collect_requests(&mut self, world: &World, out: &mut Vec<Command>) {
        self.requests.clear();
        let mut claimed = self.reserved.clone();
        for unit in query::units(world) {
            if !unit.ready_for_action {
                continue;
            }
            let Some(policy) = self.policies.get_mut(&unit.id) else {
                continue;
            };

            let ctx = PolicyContext::new(world, unit, &claimed);
            let mut plan = unit.plan.clone();
            let destination = policy.decide(&ctx, &mut plan);
            out.push(Command::UpdatePlan {
                unit: unit.id,
                plan,
            });
            if let Some(destination) = destination {
                trace!(unit = unit.id.get(), %destination, "move requested");
                let _ = self.requests.insert(unit.id, destination);
                let _ = claimed.insert(destination);
            }
        }
    }

    /// Arbitrates the collected requests.
    ///
    /// Destinations are processed in row-major order. A destination that is
    /// reserved or not walkable rejects every requester and clears goals that
    /// pointed at it. Otherwise one requester, drawn with the seeded generator
    /// from the identifier-sorted list, commits and the rest are told to replan.
    pub fn resolve_requests(&mut self, world: &World, out: &mut Vec<Command>) {
        let mut by_destination: BTreeMap<TilePosition, Vec<UnitId>> = BTreeMap::new();
        for (unit, destination) in std::mem::take(&mut self.requests) {
            by_destination.entry(destination).or_default().push(unit);
        }

        for (destination, requesters) in by_destination {
            let blocked =
                self.reserved.contains(&destination) || !query::is_walkable(world, destination);
            if blocked {
                for unit in requesters {
                    debug!(unit = unit.get(), %destination, "destination blocked");
                    out.push(Command::RejectMove {
                        unit,
                        destination,
                        drop_goal: true,
                    });
                }
                continue;
            }

            let winner = if requesters.len() > 1 {
                self.rng.gen_range(0..requesters.len())
            } else {
                0
            };
            for (index, unit) in requesters.into_iter().enumerate() {
                if index == winner {
                    out.push(Command::CommitMove {
                        unit,
                        to: destination,
                    });
                } else {
                    debug!(unit = unit.get(), %destination, "lost destination contest");
                    out.push(Command::RejectMove {
                        unit,
                        destination,
                        drop_goal: false,
                    });
                }
            }
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(DEFAULT_RNG_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tactica_core::{Event, Team};
    use tactica_system_ai::BasicCombat;
    use tactica_world::{self as world, Catalog, TileMap};

    #[test]
    fn snapshot_reserves_every_unit_tile() {
        let mut world = World::new(TileMap::new(2, 2), Catalog::builtin());
        let mut events = Vec::new();
        for col in 0..2 {
            world::apply(
                &mut world,
                Command::SpawnUnit {
                    kind: "Warrior".to_owned(),
                    team: Team::Player,
                    tile: TilePosition::new(0, col),
                },
                &mut events,
            );
        }
        assert!(events
            .iter()
            .all(|event| matches!(event, Event::UnitSpawned { .. })));

        let mut movement = Movement::default();
        movement.snapshot_reservations(&world);
        assert_eq!(
            movement.reserved_tiles(),
            &BTreeSet::from([TilePosition::new(0, 0), TilePosition::new(0, 1)])
        );
    }

    #[test]
    fn forgetting_a_unit_drops_its_policy() {
        let mut movement = Movement::new(7);
        let unit = UnitId::new(3);
        movement.assign_policy(unit, Box::new(BasicCombat));
        assert_eq!(movement.policy_name(unit), Some("attack"));

        movement.forget(unit);
        assert_eq!(movement.policy_name(unit), None);
    }
}
