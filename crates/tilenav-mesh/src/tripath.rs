//! A* over the triangle adjacency graph.
//!
//! Nodes are triangles, edges join neighbors, and the cost of an edge is the
//! distance between the two centroids. Edges whose centroid segment crosses
//! a wall are never expanded. Found routes are cached as centroid chains per
//! (start, goal) triangle pair.

use std::collections::{BinaryHeap, HashMap};

use tilenav_core::{Vec2, Visibility};

use crate::fallback::splice;
use crate::mesh::{NavMesh, TriangleId};

#[derive(Clone)]
struct TriNode {
    g: f64,
    parent: Option<TriangleId>,
    generation: u32,
    open: bool,
}

impl Default for TriNode {
    fn default() -> Self {
        Self {
            g: f64::INFINITY,
            parent: None,
            generation: 0,
            open: false,
        }
    }
}

/// Frontier entry, ordered so that `BinaryHeap` pops the smallest `f`.
#[derive(Clone, Copy)]
struct Frontier {
    id: TriangleId,
    f: f64,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.f.total_cmp(&other.f).is_eq()
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other.f.total_cmp(&self.f)
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Outcome of a triangle-graph query.
#[derive(Debug, Clone, PartialEq)]
pub enum TriRoute {
    /// Full path: `from`, the centroid chain, then `to`.
    Found(Vec<Vec2>),
    /// `from` or `to` could not be placed on the mesh.
    Unresolved,
    /// Both ends resolved but the graph holds no route between them.
    NoPath,
}

/// Reusable A* state and the per-generation route cache.
#[derive(Default)]
pub struct TrianglePaths {
    nodes: Vec<TriNode>,
    generation: u32,
    cache: HashMap<(TriangleId, TriangleId), Vec<Vec2>>,
}

impl TrianglePaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached route.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Number of cached triangle pairs.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Route from `from` to `to` over `mesh`.
    ///
    /// `from` resolves to the first triangle containing it, or failing that
    /// to the triangle with the nearest centroid. `to` must lie inside a
    /// triangle.
    pub fn find<V: Visibility + ?Sized>(
        &mut self,
        mesh: &NavMesh,
        vis: &V,
        from: Vec2,
        to: Vec2,
    ) -> TriRoute {
        let Some(start) = mesh.locate(from).or_else(|| mesh.nearest(from)) else {
            log::debug!("{from} is not on the mesh");
            return TriRoute::Unresolved;
        };
        let Some(goal) = mesh.locate(to) else {
            log::debug!("{to} is not inside any triangle");
            return TriRoute::Unresolved;
        };

        if let Some(chain) = self.cache.get(&(start, goal)) {
            log::debug!("triangle path cache hit {start} -> {goal}");
            return TriRoute::Found(splice(from, chain, to));
        }

        match self.search(mesh, vis, start, goal) {
            Some(chain) => {
                let path = splice(from, &chain, to);
                self.cache.insert((start, goal), chain);
                TriRoute::Found(path)
            }
            None => TriRoute::NoPath,
        }
    }

    /// Centroid chain from `start` to `goal`, both included.
    fn search<V: Visibility + ?Sized>(
        &mut self,
        mesh: &NavMesh,
        vis: &V,
        start: TriangleId,
        goal: TriangleId,
    ) -> Option<Vec<Vec2>> {
        let center = |id: TriangleId| mesh.triangle(id).map(|t| t.center());
        let goal_center = center(goal)?;
        let start_center = center(start)?;

        if mesh.len() > self.nodes.len() {
            self.nodes.clear();
            self.nodes.resize(mesh.len(), TriNode::default());
            self.generation = 0;
        }
        // Bump generation to lazily invalidate all nodes.
        self.generation = self.generation.wrapping_add(1);
        let cur_gen = self.generation;

        {
            let node = &mut self.nodes[start.index()];
            node.g = 0.0;
            node.parent = None;
            node.generation = cur_gen;
            node.open = true;
        }

        let mut open = BinaryHeap::new();
        open.push(Frontier {
            id: start,
            f: f64::from(start_center.distance(goal_center)),
        });

        let found = 'search: loop {
            let Some(current) = open.pop() else {
                break 'search false;
            };
            let ci = current.id.index();

            // Skip stale entries.
            if self.nodes[ci].generation != cur_gen || !self.nodes[ci].open {
                continue;
            }
            if current.id == goal {
                break 'search true;
            }

            self.nodes[ci].open = false;
            let current_g = self.nodes[ci].g;
            let Some(current_center) = center(current.id) else {
                continue;
            };

            for nb in mesh.neighbors(current.id) {
                let Some(nb_center) = center(nb) else {
                    continue;
                };
                if vis.blocked(current_center, nb_center) {
                    continue;
                }
                let tentative_g = current_g + f64::from(current_center.distance(nb_center));

                let n = &mut self.nodes[nb.index()];
                if n.generation == cur_gen {
                    if tentative_g >= n.g {
                        continue;
                    }
                } else {
                    n.generation = cur_gen;
                }

                n.g = tentative_g;
                n.parent = Some(current.id);
                n.open = true;
                open.push(Frontier {
                    id: nb,
                    f: tentative_g + f64::from(nb_center.distance(goal_center)),
                });
            }
        };

        if !found {
            log::debug!("no triangle route {start} -> {goal}");
            return None;
        }

        let mut chain = Vec::new();
        let mut cur = Some(goal);
        while let Some(id) = cur {
            chain.push(center(id)?);
            cur = self.nodes[id.index()].parent;
        }
        chain.reverse();
        Some(chain)
    }
}
