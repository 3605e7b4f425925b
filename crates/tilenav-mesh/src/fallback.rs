//! Grid search used when the mesh cannot answer a query.

use std::collections::HashMap;
use std::sync::Arc;

use tilenav_core::{Grid, Vec2};
use tilenav_paths::{GridSearch, PathRange};

/// Jump point search over the map's walkability mask, with results cached
/// per (start cell, goal cell).
///
/// The cache only depends on the grid, so it survives mesh rebuilds and is
/// dropped with the fallback on map reset.
pub struct GridFallback {
    grid: Arc<Grid>,
    mask: Vec<u8>,
    engine: PathRange,
    cache: HashMap<(usize, usize), Vec<Vec2>>,
}

impl GridFallback {
    pub fn new(grid: Arc<Grid>) -> Self {
        Self {
            mask: grid.walkable_mask(),
            engine: PathRange::new(grid.bounds()),
            grid,
            cache: HashMap::new(),
        }
    }

    /// Number of cached cell pairs.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Cell-center chain between the cells nearest `from` and `to`, with the
    /// exact endpoints spliced on. `None` when the grid search fails or the
    /// grid has no cells.
    pub fn find(&mut self, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        if self.grid.bounds().is_empty() {
            return None;
        }
        let start = self.grid.index(self.grid.nearest_cell(from))?;
        let goal = self.grid.index(self.grid.nearest_cell(to))?;

        if let Some(chain) = self.cache.get(&(start, goal)) {
            log::debug!("grid path cache hit {start} -> {goal}");
            return Some(splice(from, chain, to));
        }

        let cells = self.engine.search(
            &self.mask,
            self.grid.width() as usize,
            self.grid.height() as usize,
            start,
            goal,
        )?;
        let chain: Vec<Vec2> = cells
            .into_iter()
            .map(|i| Grid::cell_center(self.grid.point(i)))
            .collect();
        let path = splice(from, &chain, to);
        self.cache.insert((start, goal), chain);
        Some(path)
    }
}

/// `from`, then `chain`, then `to`.
pub(crate) fn splice(from: Vec2, chain: &[Vec2], to: Vec2) -> Vec<Vec2> {
    let mut path = Vec::with_capacity(chain.len() + 2);
    path.push(from);
    path.extend_from_slice(chain);
    path.push(to);
    path
}
