//! Registries that own unit and obstacle records and allocate identifiers.

use std::collections::BTreeMap;

use tactica_core::{Obstacle, ObstacleId, Unit, UnitId};

/// Registry that stores units keyed by identifier.
#[derive(Debug)]
pub(crate) struct UnitRegistry {
    entries: BTreeMap<UnitId, Unit>,
    next_unit_id: UnitId,
}

impl UnitRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_unit_id: UnitId::new(0),
        }
    }

    /// Hands out the next unused identifier.
    pub(crate) fn allocate(&mut self) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id = UnitId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn insert(&mut self, unit: Unit) {
        let _ = self.entries.insert(unit.id, unit);
    }

    pub(crate) fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: UnitId) -> Option<&Unit> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.entries.get_mut(&id)
    }

    /// Iterates units in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Registry that stores obstacles keyed by identifier.
#[derive(Debug)]
pub(crate) struct ObstacleRegistry {
    entries: BTreeMap<ObstacleId, Obstacle>,
    next_obstacle_id: ObstacleId,
}

impl ObstacleRegistry {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_obstacle_id: ObstacleId::new(0),
        }
    }

    /// Hands out the next unused identifier.
    pub(crate) fn allocate(&mut self) -> ObstacleId {
        let id = self.next_obstacle_id;
        self.next_obstacle_id = ObstacleId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn insert(&mut self, obstacle: Obstacle) {
        let _ = self.entries.insert(obstacle.id, obstacle);
    }

    pub(crate) fn remove(&mut self, id: ObstacleId) -> Option<Obstacle> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.entries.get(&id)
    }

    /// Iterates obstacles in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Obstacle> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
