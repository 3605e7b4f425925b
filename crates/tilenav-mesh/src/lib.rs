//! **tilenav-mesh** — visibility-constrained navigation mesh for tile maps.
//!
//! The pipeline runs once per map load:
//!
//! 1. [`extract_edges`] finds the corner points of solid geometry.
//! 2. [`triangulate`] connects mutually visible points into triangles that
//!    keep an empty circumcircle, in the background on a
//!    [`TriangulationTask`].
//! 3. [`NavStore::install`] links neighbors and swaps the new [`NavMesh`]
//!    generation in, provided no newer map load superseded it.
//!
//! [`NavService`] ties these together and answers path queries: the direct
//! shortcut, A* over the triangle graph, and a jump point search over the
//! grid when the mesh cannot help. Meshes can be stored on disk and reused
//! on the next load of the same map.

pub mod config;
pub mod edges;
pub mod error;
pub mod fallback;
pub mod link;
pub mod mesh;
pub mod path;
pub mod persist;
pub mod service;
pub mod store;
pub mod task;
pub mod triangle;
pub mod triangulate;
pub mod tripath;

pub use config::NavConfig;
pub use edges::extract_edges;
pub use error::{MeshError, Result};
pub use fallback::GridFallback;
pub use link::{Linked, link};
pub use mesh::{MeshStats, NavMesh, TriangleId};
pub use path::Path;
pub use service::NavService;
pub use store::{NavStore, StoreState};
pub use task::{Context, TriangulationDone, TriangulationTask};
pub use triangle::Triangle;
pub use triangulate::triangulate;
pub use tripath::{TriRoute, TrianglePaths};
