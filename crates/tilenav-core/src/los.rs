//! Line-of-sight queries against map geometry.

use crate::geom::{Point, Vec2};
use crate::grid::{Grid, TILE_SIZE};

/// Point-to-point occlusion oracle.
///
/// Implementations must be `Sync`: the triangulator queries them from many
/// threads at once.
pub trait Visibility: Sync {
    /// Whether the straight segment `a → b` crosses a wall.
    fn blocked(&self, a: Vec2, b: Vec2) -> bool;

    /// Whether the straight segment `a → b` is free of walls.
    #[inline]
    fn visible(&self, a: Vec2, b: Vec2) -> bool {
        !self.blocked(a, b)
    }
}

impl Grid {
    /// Cell tested for a world sample: coordinates are rounded to whole units
    /// first, then truncated to a cell and clamped into the map, so samples
    /// just outside the map test the border cells.
    #[inline]
    fn sample_cell(&self, v: Vec2) -> Point {
        let ts = TILE_SIZE as i32;
        let p = Point::new(v.x.round() as i32 / ts, v.y.round() as i32 / ts);
        self.bounds().clamp(p)
    }

    /// Largest world coordinates that still land inside the map. Clamping a
    /// sample into `[0, sample_max]` never changes the cell it tests.
    #[inline]
    fn sample_max(&self) -> Vec2 {
        self.world_size() - Vec2::new(1.0, 1.0)
    }

    /// Samples `a → b` once per world unit. Both ends must lie inside the
    /// sample box.
    fn samples_blocked(&self, a: Vec2, b: Vec2) -> bool {
        let steps = a.distance(b) as usize + 1;
        let inv = 1.0 / steps as f32;
        (0..=steps).any(|i| {
            let cell = self.sample_cell(a.lerp(b, i as f32 * inv));
            self.is_solid(cell)
        })
    }
}

/// Segments are sampled once per world unit, endpoints included. Parts of a
/// segment outside the map test the border cells they project onto, so the
/// work is bounded by the map size however far the endpoints lie.
impl Visibility for Grid {
    fn blocked(&self, a: Vec2, b: Vec2) -> bool {
        if self.bounds().is_empty() {
            return false;
        }
        if ![a.x, a.y, b.x, b.y].iter().all(|c| c.is_finite()) {
            return true;
        }
        let max = self.sample_max();
        let clamp = |v: Vec2| Vec2::new(v.x.clamp(0.0, max.x), v.y.clamp(0.0, max.y));

        // Clamping is affine between the crossings of the box sides.
        let mut cuts = [0.0f32, 1.0, 1.0, 1.0, 1.0, 1.0];
        let mut n = 2;
        for (p, q, hi) in [(a.x, b.x, max.x), (a.y, b.y, max.y)] {
            let d = q - p;
            if d == 0.0 {
                continue;
            }
            for side in [0.0, hi] {
                let t = (side - p) / d;
                if t > 0.0 && t < 1.0 {
                    cuts[n] = t;
                    n += 1;
                }
            }
        }
        let cuts = &mut cuts[..n];
        cuts.sort_by(f32::total_cmp);
        cuts.windows(2).any(|w| {
            let p = clamp(a.lerp(b, w[0]));
            let q = clamp(a.lerp(b, w[1]));
            self.samples_blocked(p, q)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Range;
    use crate::grid::Tile;

    fn block_grid() -> Grid {
        let mut g = Grid::new(10, 10);
        g.fill(Range::new(4, 4, 6, 6), Tile::Solid);
        g
    }

    #[test]
    fn open_segment_is_visible() {
        let g = block_grid();
        assert!(g.visible(Vec2::new(16.0, 16.0), Vec2::new(300.0, 16.0)));
        assert!(g.visible(Vec2::new(16.0, 16.0), Vec2::new(16.0, 16.0)));
    }

    #[test]
    fn segment_through_block_is_blocked() {
        let g = block_grid();
        assert!(g.blocked(Vec2::new(0.0, 0.0), Vec2::new(320.0, 320.0)));
        assert!(g.blocked(Vec2::new(160.0, 16.0), Vec2::new(160.0, 300.0)));
    }

    #[test]
    fn segment_hugging_block_is_visible() {
        let g = block_grid();
        // One unit outside the block faces.
        assert!(g.visible(Vec2::new(127.0, 127.0), Vec2::new(193.0, 127.0)));
        assert!(g.visible(Vec2::new(127.0, 127.0), Vec2::new(127.0, 193.0)));
        assert!(g.blocked(Vec2::new(127.0, 127.0), Vec2::new(193.0, 193.0)));
    }

    #[test]
    fn no_hook_blocks_too() {
        let mut g = Grid::new(5, 1);
        g.set(Point::new(2, 0), Tile::NoHook);
        assert!(g.blocked(Vec2::new(16.0, 16.0), Vec2::new(144.0, 16.0)));
    }

    #[test]
    fn outside_samples_clamp_to_border() {
        let mut g = Grid::new(3, 3);
        g.set(Point::new(0, 0), Tile::Solid);
        assert!(g.blocked(Vec2::new(-1.0, -1.0), Vec2::new(-1.0, -1.0)));
        assert!(g.visible(Vec2::new(96.0, 96.0), Vec2::new(80.0, 80.0)));
    }

    #[test]
    fn far_endpoints_test_the_border() {
        let mut g = Grid::new(4, 4);
        g.set(Point::new(3, 1), Tile::Solid);
        assert!(g.visible(Vec2::new(16.0, 16.0), Vec2::new(3.0e9, 16.0)));
        assert!(g.blocked(Vec2::new(16.0, 48.0), Vec2::new(3.0e9, 48.0)));
        assert!(g.blocked(Vec2::new(-3.0e9, 48.0), Vec2::new(3.0e9, 48.0)));
        // Entirely off the map: runs along the right border column.
        assert!(g.blocked(Vec2::new(5000.0, -1.0e9), Vec2::new(5000.0, 1.0e9)));
        assert!(g.visible(Vec2::new(-5000.0, -1.0e9), Vec2::new(-5000.0, 1.0e9)));
    }

    #[test]
    fn non_finite_endpoints_are_blocked() {
        let g = Grid::new(4, 4);
        assert!(g.blocked(Vec2::new(16.0, 16.0), Vec2::new(f32::NAN, 16.0)));
        assert!(g.blocked(Vec2::new(f32::INFINITY, 16.0), Vec2::new(16.0, 16.0)));
    }
}
