//! The navmesh store: the installed mesh generation, both path caches and
//! the generation token, behind one lock.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tilenav_core::{Grid, Vec2, Visibility};

use crate::error::{MeshError, Result};
use crate::fallback::GridFallback;
use crate::mesh::{MeshStats, NavMesh};
use crate::triangle::Triangle;
use crate::tripath::{TriRoute, TrianglePaths};

/// State guarded by the store lock.
///
/// Queries hold the lock for their whole duration, so nothing read from
/// `mesh` outlives the generation it came from.
#[derive(Default)]
pub struct StoreState {
    token: u64,
    mesh: Option<NavMesh>,
    pub(crate) tri_paths: TrianglePaths,
    pub(crate) fallback: Option<GridFallback>,
}

impl StoreState {
    /// The installed mesh, if any.
    #[inline]
    pub fn mesh(&self) -> Option<&NavMesh> {
        self.mesh.as_ref()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.mesh.is_some()
    }

    /// Token the next install must carry.
    #[inline]
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Route over the mesh, falling back to the grid search when the mesh
    /// cannot place an endpoint or connect them. `None` when the mesh is not
    /// installed or both searches fail.
    pub(crate) fn route<V: Visibility + ?Sized>(
        &mut self,
        vis: &V,
        from: Vec2,
        to: Vec2,
    ) -> Option<Vec<Vec2>> {
        let mesh = self.mesh.as_ref()?;
        match self.tri_paths.find(mesh, vis, from, to) {
            TriRoute::Found(path) => return Some(path),
            TriRoute::Unresolved | TriRoute::NoPath => {
                log::warn!("no mesh route {from} -> {to}, using grid search");
            }
        }
        self.fallback.as_mut()?.find(from, to)
    }

    /// Cached routes: (triangle pairs, grid cell pairs).
    pub fn cached_routes(&self) -> (usize, usize) {
        (
            self.tri_paths.cached(),
            self.fallback.as_ref().map_or(0, GridFallback::cached),
        )
    }
}

/// Shared navmesh store.
#[derive(Default)]
pub struct NavStore {
    state: Mutex<StoreState>,
}

impl NavStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the store for a query.
    pub fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock()
    }

    /// Start a new session on `grid`, or an empty one for `None`.
    ///
    /// Drops the mesh and both caches and returns the fresh generation token.
    /// Installs carrying an older token are refused from now on.
    pub fn reset(&self, grid: Option<Arc<Grid>>) -> u64 {
        let mut st = self.state.lock();
        st.token += 1;
        st.mesh = None;
        st.tri_paths = TrianglePaths::new();
        st.fallback = grid.map(GridFallback::new);
        log::debug!("store reset, generation token is now {}", st.token);
        st.token
    }

    /// Link `triangles` and install them as generation `token`.
    ///
    /// Fails with [`MeshError::Superseded`] when `token` is no longer
    /// current. On success the previous mesh is dropped and the triangle
    /// route cache cleared; the grid route cache is kept.
    pub fn install(&self, token: u64, edges: Vec<Vec2>, triangles: Vec<Triangle>) -> Result<MeshStats> {
        let mut st = self.state.lock();
        if st.token != token {
            return Err(MeshError::Superseded {
                token,
                current: st.token,
            });
        }
        let mesh = NavMesh::build(token, edges, triangles);
        let stats = mesh.stats();
        st.mesh = Some(mesh);
        st.tri_paths.clear();
        log::info!("installed mesh {stats}");
        Ok(stats)
    }

    /// Whether any generation is installed.
    pub fn is_ready(&self) -> bool {
        self.state.lock().is_ready()
    }

    /// Current generation token.
    pub fn current_generation(&self) -> u64 {
        self.state.lock().token
    }

    /// Counts of the installed mesh.
    pub fn stats(&self) -> Option<MeshStats> {
        self.state.lock().mesh.as_ref().map(NavMesh::stats)
    }

    /// Run `f` on the installed mesh under the lock.
    pub fn with_mesh<R>(&self, f: impl FnOnce(&NavMesh) -> R) -> Option<R> {
        self.state.lock().mesh.as_ref().map(f)
    }
}
