use tilenav_core::Point;

/// Chebyshev (L∞) distance between two points.
///
/// This is the exact step count on an open 8-way grid, which makes it an
/// admissible heuristic for uniform-cost jump point search.
#[inline]
pub fn chebyshev(a: Point, b: Point) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}
