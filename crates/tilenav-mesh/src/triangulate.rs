//! Visibility-constrained triangulation of an edge set.
//!
//! Every unordered triple of mutually visible edge points becomes a candidate
//! triangle. A candidate is kept when its circumcenter lies on the map and no
//! other edge point that sees all three vertices falls strictly inside its
//! circumcircle. The work is O(n⁴) in the number of edge points and is spread
//! over the rayon pool one outer vertex at a time.

use std::cmp::Ordering;

use parking_lot::Mutex;
use rayon::prelude::*;
use tilenav_core::{Vec2, Visibility};

use crate::task::Context;
use crate::triangle::Triangle;

/// Pairwise visibility between edge points, stored as the upper triangle of
/// the symmetric relation. Each pair is tested once, from the lower index to
/// the higher one.
struct VisMatrix {
    rows: Vec<Vec<bool>>,
}

impl VisMatrix {
    fn build<V: Visibility + ?Sized>(edges: &[Vec2], vis: &V, ctx: &Context) -> Self {
        let rows = (0..edges.len())
            .into_par_iter()
            .map(|i| {
                if ctx.is_done() {
                    return Vec::new();
                }
                edges[i + 1..]
                    .iter()
                    .map(|&e| vis.visible(edges[i], e))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> bool {
        match i.cmp(&j) {
            Ordering::Less => self.rows[i][j - i - 1],
            Ordering::Greater => self.rows[j][i - j - 1],
            Ordering::Equal => true,
        }
    }
}

/// Lexicographic vertex order, used to make the output independent of thread
/// scheduling.
fn vertex_order(a: &Triangle, b: &Triangle) -> Ordering {
    a.vertices()
        .iter()
        .zip(b.vertices().iter())
        .map(|(u, v)| u.x.total_cmp(&v.x).then(u.y.total_cmp(&v.y)))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Triangulate `edges` inside a map of `world` size.
///
/// Returns `None` when `ctx` is cancelled before the work completes. The
/// accepted triangles are sorted by vertex coordinates, and each keeps its
/// vertices in edge-set order.
pub fn triangulate<V: Visibility + ?Sized>(
    edges: &[Vec2],
    world: Vec2,
    vis: &V,
    ctx: &Context,
) -> Option<Vec<Triangle>> {
    let n = edges.len();
    let matrix = VisMatrix::build(edges, vis, ctx);
    if ctx.is_done() {
        return None;
    }

    let accepted: Mutex<Vec<Triangle>> = Mutex::new(Vec::new());

    (0..n).into_par_iter().for_each(|i| {
        for j in i + 1..n {
            if ctx.is_done() {
                return;
            }
            if !matrix.get(i, j) {
                continue;
            }
            for k in j + 1..n {
                if !matrix.get(i, k) || !matrix.get(j, k) {
                    continue;
                }
                let Some(tri) = Triangle::new(edges[i], edges[j], edges[k]) else {
                    continue;
                };
                if !tri.circumcenter_within(world) {
                    continue;
                }
                let occupied = (0..n).any(|q| {
                    q != i
                        && q != j
                        && q != k
                        && matrix.get(q, i)
                        && matrix.get(q, j)
                        && matrix.get(q, k)
                        && tri.in_circumcircle(edges[q])
                });
                if occupied {
                    continue;
                }

                let mut acc = accepted.lock();
                if !acc.contains(&tri) {
                    acc.push(tri);
                }
            }
        }
    });

    if ctx.is_done() {
        return None;
    }

    let mut triangles = accepted.into_inner();
    triangles.sort_by(vertex_order);
    log::debug!(
        "triangulated {} edge points into {} triangles",
        n,
        triangles.len()
    );
    Some(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::extract_edges;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tilenav_core::{Grid, Point, Range, Tile};

    /// Visibility with no obstacles.
    struct Open;

    impl Visibility for Open {
        fn blocked(&self, _: Vec2, _: Vec2) -> bool {
            false
        }
    }

    fn run(grid: &Grid) -> (Vec<Vec2>, Vec<Triangle>) {
        let edges = extract_edges(grid);
        let tris = triangulate(&edges, grid.world_size(), grid, &Context::new()).unwrap();
        (edges, tris)
    }

    /// Brute-force re-check of every acceptance rule.
    fn assert_valid<V: Visibility>(edges: &[Vec2], world: Vec2, vis: &V, tris: &[Triangle]) {
        for (i, t) in tris.iter().enumerate() {
            let [a, b, c] = t.vertices();
            assert!(vis.visible(a, b) || vis.visible(b, a), "{t}: a-b hidden");
            assert!(vis.visible(a, c) || vis.visible(c, a), "{t}: a-c hidden");
            assert!(vis.visible(b, c) || vis.visible(c, b), "{t}: b-c hidden");
            assert!(t.circumcenter_within(world), "{t}: circumcenter off map");
            for &q in edges {
                if q == a || q == b || q == c {
                    continue;
                }
                let sees_all = [a, b, c]
                    .iter()
                    .all(|&v| vis.visible(q, v) && vis.visible(v, q));
                assert!(
                    !(sees_all && t.in_circumcircle(q)),
                    "{t}: {q} inside circumcircle"
                );
            }
            for other in &tris[i + 1..] {
                assert!(t != other, "duplicate triangle {t}");
            }
        }
    }

    #[test]
    fn open_map_yields_both_diagonals() {
        let (_, tris) = run(&Grid::new(10, 10));
        // The four corners are cocircular, so no corner is strictly inside
        // another triple's circle.
        assert_eq!(tris.len(), 4);
        for t in &tris {
            assert_eq!(t.circumcenter(), [160.0, 160.0]);
        }
    }

    #[test]
    fn block_map_circumcenters_fall_off_map() {
        let mut g = Grid::new(10, 10);
        g.fill(Range::new(4, 4, 6, 6), Tile::Solid);
        let (edges, tris) = run(&g);
        assert_eq!(edges.len(), 8);
        // Every visible triple around a centred block is cocircular with a
        // circumcenter 33 units outside the map.
        assert!(tris.is_empty());
    }

    #[test]
    fn ring_interior_is_triangulated() {
        let mut g = Grid::new(12, 12);
        g.fill(Range::new(4, 4, 7, 7), Tile::Solid);
        g.set(Point::new(5, 5), Tile::Open);
        let (edges, tris) = run(&g);
        assert_eq!(edges.len(), 12);
        let inner: Vec<_> = tris
            .iter()
            .filter(|t| t.circumcenter() == [176.0, 176.0])
            .collect();
        assert_eq!(inner.len(), 4);
        assert_valid(&edges, g.world_size(), &g, &tris);
    }

    #[test]
    fn output_is_sorted_and_deterministic() {
        let mut g = Grid::new(16, 12);
        g.fill(Range::new(3, 2, 6, 5), Tile::Solid);
        g.fill(Range::new(9, 6, 13, 8), Tile::Solid);
        let (_, first) = run(&g);
        let (_, second) = run(&g);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.vertices(), b.vertices());
        }
        assert!(first.windows(2).all(|w| vertex_order(&w[0], &w[1]).is_le()));
    }

    #[test]
    fn random_point_sets_hold_invariants() {
        let mut rng = StdRng::seed_from_u64(0x7a11);
        let world = Vec2::new(640.0, 640.0);
        for _ in 0..20 {
            let count = rng.random_range(4..24);
            let mut pts: Vec<Vec2> = (0..count)
                .map(|_| {
                    Vec2::new(
                        rng.random_range(0..=640) as f32,
                        rng.random_range(0..=640) as f32,
                    )
                })
                .collect();
            crate::edges::dedup_points(&mut pts);
            let tris = triangulate(&pts, world, &Open, &Context::new()).unwrap();
            assert_valid(&pts, world, &Open, &tris);
        }
    }

    #[test]
    fn random_maps_hold_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..8 {
            let mut g = Grid::new(10, 8);
            for p in g.bounds() {
                if rng.random_bool(0.18) {
                    g.set(p, Tile::Solid);
                }
            }
            let (edges, tris) = run(&g);
            assert_valid(&edges, g.world_size(), &g, &tris);
        }
    }

    #[test]
    fn cancelled_context_returns_none() {
        let ctx = Context::new();
        ctx.cancel();
        let edges = extract_edges(&Grid::new(4, 4));
        assert!(triangulate(&edges, Vec2::new(128.0, 128.0), &Open, &ctx).is_none());
    }
}
