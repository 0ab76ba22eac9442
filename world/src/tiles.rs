//! Rectangular tile layout of the battlefield.

use std::ops::RangeInclusive;

use tactica_core::{Terrain, Tile, TilePosition};

/// Dense row-major tile grid with bounds-checked lookups.
#[derive(Clone, Debug, PartialEq)]
pub struct TileMap {
    rows: u32,
    cols: u32,
    tiles: Vec<Tile>,
}

impl TileMap {
    /// Creates a grid of the given dimensions covered entirely by ground.
    #[must_use]
    pub fn new(rows: u32, cols: u32) -> Self {
        let mut tiles = Vec::with_capacity(cell_count(rows, cols));
        for row in 0..rows {
            for col in 0..cols {
                let position = TilePosition::new(to_signed(row), to_signed(col));
                tiles.push(Tile::new(position, Terrain::Ground));
            }
        }
        Self { rows, cols, tiles }
    }

    /// Builds a grid from ASCII rows.
    ///
    /// `#` marks a wall, `O` an objective tile, `*` a ground tile inside an
    /// objective zone; every other character is ground. Short rows are padded
    /// with ground up to the widest row.
    #[must_use]
    pub fn from_ascii(layout: &[&str]) -> Self {
        let rows = u32::try_from(layout.len()).unwrap_or(u32::MAX);
        let cols = layout
            .iter()
            .map(|line| u32::try_from(line.chars().count()).unwrap_or(u32::MAX))
            .max()
            .unwrap_or(0);
        let mut map = Self::new(rows, cols);

        for (row, line) in layout.iter().enumerate() {
            for (col, glyph) in line.chars().enumerate() {
                let (Ok(row), Ok(col)) = (i32::try_from(row), i32::try_from(col)) else {
                    continue;
                };
                let position = TilePosition::new(row, col);
                match glyph {
                    '#' => {
                        let _ = map.set_terrain(position, Terrain::Wall);
                    }
                    'O' => {
                        let _ = map.set_terrain(position, Terrain::Objective);
                    }
                    '*' => {
                        let _ = map.mark_objective_zone(position);
                    }
                    _ => {}
                }
            }
        }

        map
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub fn contains(&self, position: TilePosition) -> bool {
        self.index(position).is_some()
    }

    /// Returns the tile at the position, or `None` when out of bounds.
    #[must_use]
    pub fn tile(&self, position: TilePosition) -> Option<&Tile> {
        self.index(position).and_then(|index| self.tiles.get(index))
    }

    /// Replaces the terrain of a tile. Returns `false` when out of bounds.
    pub fn set_terrain(&mut self, position: TilePosition, terrain: Terrain) -> bool {
        match self.tile_mut(position) {
            Some(tile) => {
                tile.terrain = terrain;
                true
            }
            None => false,
        }
    }

    /// Flags a tile as part of an objective zone. Returns `false` when out of bounds.
    pub fn mark_objective_zone(&mut self, position: TilePosition) -> bool {
        match self.tile_mut(position) {
            Some(tile) => {
                tile.objective_zone = true;
                true
            }
            None => false,
        }
    }

    /// Iterates all tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Positions of the square `[row-radius, row+radius] x [col-radius, col+radius]`
    /// that lie inside the grid, in row-major order.
    ///
    /// The walk never leaves the grid, so its length is bounded by the map
    /// size whatever the radius.
    pub fn square_around(
        &self,
        center: TilePosition,
        radius: u32,
    ) -> impl Iterator<Item = TilePosition> {
        let rows = clipped_span(center.row(), radius, self.rows);
        let cols = clipped_span(center.col(), radius, self.cols);
        rows.flat_map(move |row| cols.clone().map(move |col| TilePosition::new(row, col)))
    }

    fn tile_mut(&mut self, position: TilePosition) -> Option<&mut Tile> {
        self.index(position)
            .and_then(move |index| self.tiles.get_mut(index))
    }

    fn index(&self, position: TilePosition) -> Option<usize> {
        let row = u32::try_from(position.row()).ok()?;
        let col = u32::try_from(position.col()).ok()?;
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let width = usize::try_from(self.cols).ok()?;
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        row.checked_mul(width)?.checked_add(col)
    }
}

pub(crate) fn cell_count(rows: u32, cols: u32) -> usize {
    let count = u64::from(rows) * u64::from(cols);
    usize::try_from(count).unwrap_or(0)
}

fn clipped_span(center: i32, radius: u32, len: u32) -> RangeInclusive<i32> {
    let low = (i64::from(center) - i64::from(radius)).max(0);
    let high = (i64::from(center) + i64::from(radius))
        .min(i64::from(len) - 1)
        .min(i64::from(i32::MAX));
    match (i32::try_from(low), i32::try_from(high)) {
        (Ok(low), Ok(high)) if low <= high => low..=high,
        _ => RangeInclusive::new(1, 0),
    }
}

fn to_signed(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_bounds_checked() {
        let map = TileMap::new(3, 4);
        assert!(map.tile(TilePosition::new(2, 3)).is_some());
        assert!(map.tile(TilePosition::new(3, 0)).is_none());
        assert!(map.tile(TilePosition::new(0, 4)).is_none());
        assert!(map.tile(TilePosition::new(-1, 0)).is_none());
    }

    #[test]
    fn ascii_layout_sets_terrain_and_zones() {
        let map = TileMap::from_ascii(&[".#O", "*.."]);
        assert_eq!(map.rows(), 2);
        assert_eq!(map.cols(), 3);
        assert!(map
            .tile(TilePosition::new(0, 1))
            .is_some_and(|tile| tile.is_wall()));
        assert!(map
            .tile(TilePosition::new(0, 2))
            .is_some_and(|tile| tile.is_objective()));
        let zone = map.tile(TilePosition::new(1, 0)).expect("zone tile");
        assert!(zone.is_objective());
        assert_eq!(zone.terrain, Terrain::Ground);
    }

    #[test]
    fn iteration_is_row_major() {
        let map = TileMap::new(2, 2);
        let positions: Vec<_> = map.iter().map(|tile| tile.position).collect();
        assert_eq!(
            positions,
            vec![
                TilePosition::new(0, 0),
                TilePosition::new(0, 1),
                TilePosition::new(1, 0),
                TilePosition::new(1, 1),
            ]
        );
    }

    #[test]
    fn square_around_is_clipped_to_the_grid() {
        let map = TileMap::new(3, 4);

        let corner: Vec<_> = map.square_around(TilePosition::new(0, 0), 1).collect();
        assert_eq!(
            corner,
            vec![
                TilePosition::new(0, 0),
                TilePosition::new(0, 1),
                TilePosition::new(1, 0),
                TilePosition::new(1, 1),
            ]
        );

        let everything: Vec<_> = map.square_around(TilePosition::new(1, 2), u32::MAX).collect();
        let all: Vec<_> = map.iter().map(|tile| tile.position).collect();
        assert_eq!(everything, all);

        assert_eq!(map.square_around(TilePosition::new(9, 9), 2).count(), 0);
        assert_eq!(map.square_around(TilePosition::new(-3, 1), 2).count(), 0);
        assert_eq!(TileMap::new(0, 0).square_around(TilePosition::new(0, 0), 5).count(), 0);
    }
}
