//! Authoritative record of which entity stands on which tile.

use tactica_core::{Occupant, TilePosition};

use crate::tiles::cell_count;

/// Dense tile-to-occupant map; at most one occupant per tile.
///
/// Every unit and obstacle registered with the world appears here exactly
/// once. Positions outside the grid are silently ignored by every operation.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    rows: u32,
    cols: u32,
    cells: Vec<Option<Occupant>>,
    occupied: usize,
}

impl OccupancyGrid {
    /// Creates an empty grid with the provided dimensions.
    #[must_use]
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; cell_count(rows, cols)],
            occupied: 0,
        }
    }

    /// Records `occupant` on `position`, overwriting any previous occupant.
    pub fn register(&mut self, occupant: Occupant, position: TilePosition) {
        let Some(index) = self.index(position) else {
            return;
        };
        if let Some(slot) = self.cells.get_mut(index) {
            if slot.is_none() {
                self.occupied += 1;
            }
            *slot = Some(occupant);
        }
    }

    /// Frees `position`. Clearing a free tile does nothing.
    pub fn clear(&mut self, position: TilePosition) {
        let Some(index) = self.index(position) else {
            return;
        };
        if let Some(slot) = self.cells.get_mut(index) {
            if slot.take().is_some() {
                self.occupied -= 1;
            }
        }
    }

    /// Returns the entity registered on `position`, if any.
    #[must_use]
    pub fn occupant(&self, position: TilePosition) -> Option<Occupant> {
        self.index(position)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether any entity is registered on `position`.
    #[must_use]
    pub fn is_occupied(&self, position: TilePosition) -> bool {
        self.occupant(position).is_some()
    }

    /// Number of occupied tiles.
    #[must_use]
    pub const fn occupied_count(&self) -> usize {
        self.occupied
    }

    /// Iterates occupied tiles and their occupants in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (TilePosition, Occupant)> + '_ {
        let width = usize::try_from(self.cols).unwrap_or(1).max(1);
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| {
                let occupant = (*slot)?;
                let row = i32::try_from(index / width).ok()?;
                let col = i32::try_from(index % width).ok()?;
                Some((TilePosition::new(row, col), occupant))
            })
    }

    /// Provides the dimensions of the grid as `(rows, cols)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    fn index(&self, position: TilePosition) -> Option<usize> {
        let row = u32::try_from(position.row()).ok()?;
        let col = u32::try_from(position.col()).ok()?;
        if row < self.rows && col < self.cols {
            let row = usize::try_from(row).ok()?;
            let col = usize::try_from(col).ok()?;
            let width = usize::try_from(self.cols).ok()?;
            Some(row * width + col)
        } else {
            None
        }
    }
}
