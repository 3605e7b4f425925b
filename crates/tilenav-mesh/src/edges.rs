//! Corner points of solid geometry, used as triangulation vertices.
//!
//! Every cell is matched against eight 3×3 neighborhood masks. Four of them
//! find inward corners (an open cell wrapped by an L of walls), the other four
//! find outward corners (a wall cell at the convex corner of a solid region).
//! Each match emits one point offset a unit away from the wall, so the point
//! itself stays on open ground.

use std::collections::HashSet;

use tilenav_core::{Grid, Point, TILE_SIZE, Vec2};

/// A 3×3 mask, row-major: `X` = wall, space = open, `?` = any.
type Mask = &'static [u8; 9];

/// Masks and the point each one emits, relative to the cell's top-left
/// corner in world units.
const CORNERS: [(Mask, f32, f32); 8] = [
    // inward
    (b"XX?X ????", 1.0, 1.0),
    (b"?XX? X???", 31.0, 1.0),
    (b"???X ?XX?", 1.0, 31.0),
    (b"???? X?XX", 31.0, 31.0),
    // outward
    (b"  ? XX?X?", -1.0, -1.0),
    (b"?  XX ?X?", 33.0, -1.0),
    (b"?X?XX ?  ", 33.0, 33.0),
    (b"?X? XX  ?", -1.0, 33.0),
];

/// Neighborhood of `p` as mask glyphs. Cells outside the map are open.
fn neighborhood(grid: &Grid, p: Point) -> [u8; 9] {
    let mut out = [b' '; 9];
    let mut i = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if grid.is_solid(p.shift(dx, dy)) {
                out[i] = b'X';
            }
            i += 1;
        }
    }
    out
}

#[inline]
fn matches(cells: &[u8; 9], mask: Mask) -> bool {
    cells
        .iter()
        .zip(mask.iter())
        .all(|(c, m)| *m == b'?' || c == m)
}

/// Remove exact duplicates, keeping the first occurrence of each point.
pub(crate) fn dedup_points(points: &mut Vec<Vec2>) {
    let mut seen = HashSet::with_capacity(points.len());
    points.retain(|p| seen.insert(p.bits()));
}

/// Extract the edge set of `grid`.
///
/// The four map corners always come first, followed by corner points in
/// row-major cell order. The result holds no duplicates.
pub fn extract_edges(grid: &Grid) -> Vec<Vec2> {
    let size = grid.world_size();
    let mut edges = vec![
        Vec2::ZERO,
        Vec2::new(size.x, 0.0),
        Vec2::new(0.0, size.y),
        size,
    ];

    for p in grid.bounds() {
        let cells = neighborhood(grid, p);
        let origin = Vec2::new(p.x as f32 * TILE_SIZE, p.y as f32 * TILE_SIZE);
        edges.extend(
            CORNERS
                .iter()
                .filter(|(mask, _, _)| matches(&cells, mask))
                .map(|&(_, dx, dy)| origin + Vec2::new(dx, dy)),
        );
    }

    dedup_points(&mut edges);
    edges
}
