//! Spatial hash grid for near-O(n) proximity queries
//!
//! Divides the galaxy into uniform cells and stores alive player ids per
//! cell. The grid is derived state: it is rebuilt from scratch every tick
//! and never mutated elsewhere. Queries return the 3x3 cell neighborhood
//! around a point - a superset of the true neighbors - so callers must
//! still apply an exact distance test.

#![allow(dead_code)] // Utility methods for spatial queries

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::game::constants::spatial::CELL_SIZE;
use crate::game::state::PlayerId;
use crate::util::vec2::Vec2;

/// Grid cell key - (x, y) cell coordinates
pub type CellKey = (i32, i32);

/// Inline capacity per cell; combat rarely stacks more ships in one cell
const CELL_INLINE_CAPACITY: usize = 8;

/// Spatial hash grid over player positions
pub struct PlayerGrid {
    cell_size: f32,
    /// Inverse cell size for fast position-to-cell conversion
    inv_cell_size: f32,
    cells: FxHashMap<CellKey, SmallVec<[PlayerId; CELL_INLINE_CAPACITY]>>,
    neighbor_offsets: [(i32, i32); 9],
}

impl PlayerGrid {
    /// Cell size must exceed the largest collision/detection radius used by
    /// any caller, so the 9-cell neighborhood always contains every true
    /// candidate.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            cells: FxHashMap::default(),
            neighbor_offsets: [
                (-1, -1), (0, -1), (1, -1),
                (-1,  0), (0,  0), (1,  0),
                (-1,  1), (0,  1), (1,  1),
            ],
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
    }

    #[inline]
    fn position_to_cell(&self, pos: Vec2) -> CellKey {
        (
            (pos.x * self.inv_cell_size).floor() as i32,
            (pos.y * self.inv_cell_size).floor() as i32,
        )
    }

    #[inline]
    pub fn insert(&mut self, id: PlayerId, pos: Vec2) {
        let key = self.position_to_cell(pos);
        self.cells.entry(key).or_default().push(id);
    }

    /// Clear and reinsert every entry. O(n) in the number of players.
    pub fn rebuild(&mut self, players: impl Iterator<Item = (PlayerId, Vec2)>) {
        self.clear();
        for (id, pos) in players {
            self.insert(id, pos);
        }
    }

    /// All player ids in the 9 cells centered on the query point.
    /// Superset contract: contains every player within one cell size of the
    /// point, may contain players farther away. No false negatives.
    pub fn nearby(&self, pos: Vec2) -> SmallVec<[PlayerId; 16]> {
        let (cx, cy) = self.position_to_cell(pos);
        let mut out = SmallVec::new();
        for &(dx, dy) in &self.neighbor_offsets {
            if let Some(cell) = self.cells.get(&(cx + dx, cy + dy)) {
                out.extend_from_slice(cell);
            }
        }
        out
    }

    /// Number of entries currently stored
    pub fn len(&self) -> usize {
        self.cells.values().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-empty cell count, for diagnostics
    pub fn cell_count(&self) -> usize {
        self.cells.values().filter(|c| !c.is_empty()).count()
    }
}

impl Default for PlayerGrid {
    fn default() -> Self {
        Self::new(CELL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_insert_and_query() {
        let mut grid = PlayerGrid::new(1000.0);
        grid.insert(3, Vec2::new(500.0, 500.0));

        let found = grid.nearby(Vec2::new(500.0, 500.0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], 3);
    }

    #[test]
    fn test_query_finds_adjacent_cell() {
        let mut grid = PlayerGrid::new(1000.0);
        // Cell (0, 0) and cell (1, 0)
        grid.insert(1, Vec2::new(900.0, 500.0));
        grid.insert(2, Vec2::new(1100.0, 500.0));

        let found = grid.nearby(Vec2::new(900.0, 500.0));
        assert!(found.contains(&1));
        assert!(found.contains(&2));
    }

    #[test]
    fn test_query_misses_distant_cell() {
        let mut grid = PlayerGrid::new(1000.0);
        grid.insert(1, Vec2::new(500.0, 500.0));
        grid.insert(2, Vec2::new(5_000.0, 5_000.0));

        let found = grid.nearby(Vec2::new(500.0, 500.0));
        assert!(found.contains(&1));
        assert!(!found.contains(&2));
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut grid = PlayerGrid::new(1000.0);
        grid.insert(1, Vec2::new(500.0, 500.0));

        grid.rebuild([(7, Vec2::new(500.0, 500.0))].into_iter());
        let found = grid.nearby(Vec2::new(500.0, 500.0));
        assert_eq!(found.as_slice(), &[7]);
    }

    #[test]
    fn test_clear() {
        let mut grid = PlayerGrid::new(1000.0);
        grid.insert(1, Vec2::new(500.0, 500.0));
        grid.clear();
        assert!(grid.nearby(Vec2::new(500.0, 500.0)).is_empty());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = PlayerGrid::new(1000.0);
        grid.insert(1, Vec2::new(-500.0, -500.0));
        let found = grid.nearby(Vec2::new(-400.0, -400.0));
        assert!(found.contains(&1));
    }

    #[test]
    fn test_superset_no_false_negatives() {
        // Every player within one cell size of the query point must appear
        // in the result, for arbitrary positions
        let mut rng = rand::thread_rng();
        let cell = 1000.0;
        for _ in 0..50 {
            let mut grid = PlayerGrid::new(cell);
            let mut positions = Vec::new();
            for id in 0..32u8 {
                let pos = Vec2::new(rng.gen_range(0.0..20_000.0), rng.gen_range(0.0..20_000.0));
                grid.insert(id, pos);
                positions.push((id, pos));
            }
            let query = Vec2::new(rng.gen_range(0.0..20_000.0), rng.gen_range(0.0..20_000.0));
            let found = grid.nearby(query);
            for (id, pos) in positions {
                if pos.distance_to(query) <= cell {
                    assert!(
                        found.contains(&id),
                        "player {} at {:?} within {} of {:?} missing from nearby()",
                        id,
                        pos,
                        cell,
                        query
                    );
                }
            }
        }
    }

    #[test]
    fn test_len_counts_all_entries() {
        let mut grid = PlayerGrid::new(1000.0);
        grid.insert(1, Vec2::new(0.0, 0.0));
        grid.insert(2, Vec2::new(0.0, 0.0));
        grid.insert(3, Vec2::new(9_000.0, 9_000.0));
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.cell_count(), 2);
    }
}
