#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid A* search with caller-supplied walkability and step costs.
//!
//! The search runs over a rectangular grid with 4-directional adjacency. The
//! caller decides which tiles may be entered and how much entering each tile
//! costs; the goal tile is always enterable so that units can approach an
//! occupied destination. Ties between equally promising nodes are broken by
//! the lower heuristic and then by row and column, making every search
//! reproducible.

use std::{cmp::Ordering, collections::BinaryHeap};

use tactica_core::TilePosition;
use tracing::trace;

/// Cost charged for entering a tile when the caller has no preference.
pub const UNIFORM_COST: u32 = 1;

/// Step cost function that charges [`UNIFORM_COST`] for every tile.
#[must_use]
pub fn uniform_cost(_tile: TilePosition) -> u32 {
    UNIFORM_COST
}

/// Route produced by a successful search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    tiles: Vec<TilePosition>,
    cost: u32,
}

impl Path {
    /// Every tile of the route, starting with the start tile and ending with the goal.
    #[must_use]
    pub fn tiles(&self) -> &[TilePosition] {
        &self.tiles
    }

    /// Sum of the costs of every tile entered after the start.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Number of tiles in the route, start included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the route holds no tiles; never true for a found path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles left to walk once the start tile is dropped.
    pub fn steps(&self) -> impl Iterator<Item = TilePosition> + '_ {
        self.tiles.iter().skip(1).copied()
    }

    /// Consumes the path, yielding its tiles.
    #[must_use]
    pub fn into_tiles(self) -> Vec<TilePosition> {
        self.tiles
    }
}

/// A* search bound to the dimensions of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pathfinder {
    rows: u32,
    cols: u32,
}

impl Pathfinder {
    /// Creates a pathfinder for a grid with the provided dimensions.
    #[must_use]
    pub const fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Searches for the cheapest route from `start` to `goal`.
    ///
    /// `walkable` decides which tiles other than the goal may be entered and
    /// `cost` prices each entered tile; values below one are raised to one.
    /// Returns `None` when either endpoint lies outside the grid or the open
    /// set runs dry.
    pub fn find_path<W, C>(
        &self,
        start: TilePosition,
        goal: TilePosition,
        walkable: W,
        cost: C,
    ) -> Option<Path>
    where
        W: Fn(TilePosition) -> bool,
        C: Fn(TilePosition) -> u32,
    {
        let start_index = self.index(start)?;
        let goal_index = self.index(goal)?;
        if start_index == goal_index {
            return Some(Path {
                tiles: vec![start],
                cost: 0,
            });
        }

        let cells = self.cell_count();
        let mut best_cost = vec![u32::MAX; cells];
        let mut came_from: Vec<Option<usize>> = vec![None; cells];
        let mut open = BinaryHeap::new();

        best_cost[start_index] = 0;
        open.push(OpenNode::new(start, 0, start.manhattan_distance(goal)));

        while let Some(node) = open.pop() {
            let Some(current) = self.index(node.position) else {
                continue;
            };
            if node.cost > best_cost[current] {
                continue;
            }
            if current == goal_index {
                return Some(Path {
                    tiles: self.reconstruct(&came_from, goal_index),
                    cost: node.cost,
                });
            }

            for neighbor in neighbors(node.position) {
                let Some(next) = self.index(neighbor) else {
                    continue;
                };
                if next != goal_index && !walkable(neighbor) {
                    continue;
                }
                let step = cost(neighbor).max(UNIFORM_COST);
                let tentative = node.cost.saturating_add(step);
                if tentative < best_cost[next] {
                    best_cost[next] = tentative;
                    came_from[next] = Some(current);
                    open.push(OpenNode::new(
                        neighbor,
                        tentative,
                        neighbor.manhattan_distance(goal),
                    ));
                }
            }
        }

        trace!(%start, %goal, "open set exhausted without reaching goal");
        None
    }

    fn cell_count(&self) -> usize {
        let count = u64::from(self.rows) * u64::from(self.cols);
        usize::try_from(count).unwrap_or(0)
    }

    fn index(&self, position: TilePosition) -> Option<usize> {
        let row = u32::try_from(position.row()).ok()?;
        let col = u32::try_from(position.col()).ok()?;
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let width = usize::try_from(self.cols).ok()?;
        usize::try_from(row)
            .ok()?
            .checked_mul(width)?
            .checked_add(usize::try_from(col).ok()?)
    }

    fn position(&self, index: usize) -> Option<TilePosition> {
        let width = usize::try_from(self.cols).ok()?.max(1);
        let row = i32::try_from(index / width).ok()?;
        let col = i32::try_from(index % width).ok()?;
        Some(TilePosition::new(row, col))
    }

    fn reconstruct(&self, came_from: &[Option<usize>], goal: usize) -> Vec<TilePosition> {
        let mut tiles = Vec::new();
        let mut cursor = Some(goal);
        while let Some(index) = cursor {
            if let Some(position) = self.position(index) {
                tiles.push(position);
            }
            cursor = came_from.get(index).copied().flatten();
        }
        tiles.reverse();
        tiles
    }
}

fn neighbors(position: TilePosition) -> [TilePosition; 4] {
    [
        position.offset(-1, 0),
        position.offset(1, 0),
        position.offset(0, -1),
        position.offset(0, 1),
    ]
}

/// Entry of the open set ordered so that the heap pops the best candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    position: TilePosition,
    cost: u32,
    heuristic: u32,
}

impl OpenNode {
    fn new(position: TilePosition, cost: u32, heuristic: u32) -> Self {
        Self {
            position,
            cost,
            heuristic,
        }
    }

    fn estimate(&self) -> u32 {
        self.cost.saturating_add(self.heuristic)
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the max-heap yields the smallest estimate first.
        other
            .estimate()
            .cmp(&self.estimate())
            .then_with(|| other.heuristic.cmp(&self.heuristic))
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
