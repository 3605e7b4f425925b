//! Neighbor linking: find triangles sharing an edge and drop the ones that
//! share none.

use rayon::prelude::*;

use crate::triangle::Triangle;

/// Triangles and their adjacency lists, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct Linked {
    pub triangles: Vec<Triangle>,
    pub neighbors: Vec<Vec<u32>>,
}

/// Link `triangles` and prune those without neighbors.
///
/// A pruned triangle is never referenced by another one, so a single pass
/// leaves no empty adjacency list behind. Surviving triangles keep their
/// relative order.
pub fn link(triangles: Vec<Triangle>) -> Linked {
    let adjacency: Vec<Vec<usize>> = triangles
        .par_iter()
        .enumerate()
        .map(|(i, t)| {
            triangles
                .iter()
                .enumerate()
                .filter(|&(j, other)| j != i && t.is_neighbor(other))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut remap = vec![u32::MAX; triangles.len()];
    let mut next = 0u32;
    for (i, adj) in adjacency.iter().enumerate() {
        if !adj.is_empty() {
            remap[i] = next;
            next += 1;
        }
    }

    let pruned = triangles.len() - next as usize;
    if pruned > 0 {
        log::debug!("pruned {pruned} isolated triangles");
    }

    let mut linked = Linked {
        triangles: Vec::with_capacity(next as usize),
        neighbors: Vec::with_capacity(next as usize),
    };
    for (tri, adj) in triangles.into_iter().zip(adjacency) {
        if adj.is_empty() {
            continue;
        }
        linked.triangles.push(tri);
        linked
            .neighbors
            .push(adj.into_iter().map(|j| remap[j]).collect());
    }
    linked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::extract_edges;
    use crate::task::Context;
    use crate::triangulate::triangulate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tilenav_core::{Grid, Tile, Vec2};

    fn tri(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> Triangle {
        Triangle::new(
            Vec2::new(a.0, a.1),
            Vec2::new(b.0, b.1),
            Vec2::new(c.0, c.1),
        )
        .unwrap()
    }

    #[test]
    fn isolated_triangle_is_pruned() {
        let linked = link(vec![
            tri((500.0, 500.0), (600.0, 500.0), (500.0, 600.0)),
            tri((0.0, 0.0), (100.0, 0.0), (0.0, 100.0)),
            tri((100.0, 0.0), (0.0, 100.0), (100.0, 100.0)),
        ]);
        assert_eq!(linked.triangles.len(), 2);
        assert_eq!(linked.neighbors, vec![vec![1], vec![0]]);
        assert_eq!(linked.triangles[0].vertices()[0], Vec2::new(0.0, 0.0));
    }

    #[test]
    fn sharing_one_vertex_is_not_a_link() {
        let linked = link(vec![
            tri((0.0, 0.0), (100.0, 0.0), (0.0, 100.0)),
            tri((0.0, 0.0), (-100.0, 0.0), (0.0, -100.0)),
        ]);
        assert!(linked.triangles.is_empty());
        assert!(linked.neighbors.is_empty());
    }

    #[test]
    fn random_meshes_have_no_isolated_triangles() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..6 {
            let mut g = Grid::new(10, 10);
            for p in g.bounds() {
                if rng.random_bool(0.15) {
                    g.set(p, Tile::Solid);
                }
            }
            let edges = extract_edges(&g);
            let tris = triangulate(&edges, g.world_size(), &g, &Context::new()).unwrap();
            let linked = link(tris);
            assert_eq!(linked.triangles.len(), linked.neighbors.len());
            for (i, adj) in linked.neighbors.iter().enumerate() {
                assert!(!adj.is_empty());
                for &j in adj {
                    let j = j as usize;
                    assert!(linked.triangles[i].is_neighbor(&linked.triangles[j]));
                    assert!(linked.neighbors[j].contains(&(i as u32)));
                }
            }
        }
    }
}
