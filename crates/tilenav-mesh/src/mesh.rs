//! A generation of the navigation mesh, stored as an index arena.

use std::fmt;

use tilenav_core::Vec2;

use crate::link::{Linked, link};
use crate::triangle::Triangle;

/// Handle to a triangle of one mesh generation.
///
/// Ids carry their generation. A [`NavMesh`] refuses ids minted by another
/// generation, so a handle kept across a rebuild resolves to nothing instead
/// of a different triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriangleId {
    generation: u64,
    index: u32,
}

impl TriangleId {
    #[inline]
    pub fn generation(self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for TriangleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

/// Summary counts of an installed mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshStats {
    pub generation: u64,
    pub edges: usize,
    pub triangles: usize,
    /// Undirected neighbor relations.
    pub links: usize,
}

impl fmt::Display for MeshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: {} edge points, {} triangles, {} links",
            self.generation, self.edges, self.triangles, self.links
        )
    }
}

/// One complete mesh generation: edge points, linked triangles and their
/// adjacency.
#[derive(Debug, Clone, Default)]
pub struct NavMesh {
    generation: u64,
    edges: Vec<Vec2>,
    triangles: Vec<Triangle>,
    neighbors: Vec<Vec<u32>>,
}

impl NavMesh {
    /// Link `triangles` and build generation `generation` from the result.
    pub fn build(generation: u64, edges: Vec<Vec2>, triangles: Vec<Triangle>) -> Self {
        let Linked {
            triangles,
            neighbors,
        } = link(triangles);
        Self {
            generation,
            edges,
            triangles,
            neighbors,
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn edges(&self) -> &[Vec2] {
        &self.edges
    }

    /// Linked triangles in arena order.
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    #[inline]
    fn id(&self, index: usize) -> TriangleId {
        TriangleId {
            generation: self.generation,
            index: index as u32,
        }
    }

    #[inline]
    fn slot(&self, id: TriangleId) -> Option<usize> {
        (id.generation == self.generation && id.index() < self.triangles.len())
            .then_some(id.index())
    }

    /// Ids of every triangle, in arena order.
    pub fn ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        (0..self.triangles.len()).map(move |i| self.id(i))
    }

    /// Triangle behind `id`, or `None` for a foreign or stale id.
    #[inline]
    pub fn triangle(&self, id: TriangleId) -> Option<&Triangle> {
        self.slot(id).map(|i| &self.triangles[i])
    }

    /// Neighbors of `id`. Empty for a foreign or stale id.
    pub fn neighbors(&self, id: TriangleId) -> impl Iterator<Item = TriangleId> + '_ {
        let adj = self.slot(id).map_or(&[][..], |i| &self.neighbors[i][..]);
        adj.iter().map(move |&j| self.id(j as usize))
    }

    /// First triangle, in arena order, strictly containing `p`.
    pub fn locate(&self, p: Vec2) -> Option<TriangleId> {
        self.triangles
            .iter()
            .position(|t| t.contains(p))
            .map(|i| self.id(i))
    }

    /// Triangle whose centroid is nearest to `p`. Ties go to the earlier
    /// triangle in arena order.
    pub fn nearest(&self, p: Vec2) -> Option<TriangleId> {
        self.triangles
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                p.distance(a.center())
                    .total_cmp(&p.distance(b.center()))
            })
            .map(|(i, _)| self.id(i))
    }

    pub fn stats(&self) -> MeshStats {
        MeshStats {
            generation: self.generation,
            edges: self.edges.len(),
            triangles: self.triangles.len(),
            links: self.neighbors.iter().map(Vec::len).sum::<usize>() / 2,
        }
    }
}
