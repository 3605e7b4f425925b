//! The path service: map session lifecycle and path queries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tilenav_core::{Grid, MapError, Vec2, Visibility};

use crate::config::NavConfig;
use crate::edges::extract_edges;
use crate::error::{MeshError, Result};
use crate::mesh::MeshStats;
use crate::path::Path;
use crate::persist::{self, MeshRecord};
use crate::store::NavStore;
use crate::task::{Context, TriangulationDone, TriangulationTask, run_triangulation};

/// How often [`NavService::wait_ready`] rechecks the worker.
const WAIT_POLL: Duration = Duration::from_millis(20);

/// The map currently loaded.
struct MapSession {
    name: String,
    grid: Arc<Grid>,
    edges: Vec<Vec2>,
}

/// Navigation façade for one bot.
///
/// Loading a map extracts its edge points, then either installs the
/// persisted mesh or starts a background triangulation. Queries never block
/// on the triangulation: until a mesh is installed they only answer with the
/// direct shortcut or the degenerate `[from]`.
///
/// Finished triangulations are installed by [`pump`](Self::pump), which every
/// query calls first.
pub struct NavService {
    config: NavConfig,
    store: Arc<NavStore>,
    session: Option<MapSession>,
    task: Option<TriangulationTask>,
    tx: Sender<TriangulationDone>,
    rx: Receiver<TriangulationDone>,
}

impl NavService {
    pub fn new(config: NavConfig) -> Self {
        Self::with_store(config, Arc::new(NavStore::new()))
    }

    /// Create a service around an existing store.
    pub fn with_store(config: NavConfig, store: Arc<NavStore>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            config,
            store,
            session: None,
            task: None,
            tx,
            rx,
        }
    }

    #[inline]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    #[inline]
    pub fn store(&self) -> &Arc<NavStore> {
        &self.store
    }

    /// Grid of the loaded map.
    pub fn grid(&self) -> Option<&Arc<Grid>> {
        self.session.as_ref().map(|s| &s.grid)
    }

    /// Name of the loaded map.
    pub fn map_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.name.as_str())
    }

    /// Edge points extracted from the loaded map.
    pub fn edges(&self) -> &[Vec2] {
        self.session.as_ref().map_or(&[], |s| &s.edges[..])
    }

    fn stop_task(&mut self) {
        if let Some(task) = self.task.take() {
            log::debug!("abandoning triangulation of generation {}", task.token());
            task.cancel();
        }
    }

    /// Load `grid` as map `name`, replacing any previous map.
    ///
    /// Errors when the grid has no cells or the triangulation thread cannot
    /// be started. A rejected grid leaves the previous map loaded.
    pub fn load_map(&mut self, name: &str, grid: Grid) -> Result<()> {
        if grid.bounds().is_empty() {
            return Err(MapError::Empty.into());
        }
        self.stop_task();
        let grid = Arc::new(grid);
        let token = self.store.reset(Some(grid.clone()));
        let edges = extract_edges(&grid);
        log::info!(
            "loaded map {name}: {}x{} cells, {} edge points",
            grid.width(),
            grid.height(),
            edges.len()
        );
        self.session = Some(MapSession {
            name: name.to_owned(),
            grid: grid.clone(),
            edges: edges.clone(),
        });

        if let Some(record) = self.read_persisted(name) {
            match self.store.install(token, record.edges, record.triangles) {
                Ok(stats) => {
                    log::info!("using stored mesh for {name}");
                    log::debug!("{stats}");
                    return Ok(());
                }
                Err(e) => log::warn!("stored mesh for {name} not installed: {e}"),
            }
        }

        let task =
            TriangulationTask::spawn(token, grid, edges, self.config.triangulation_threads, self.tx.clone())?;
        self.task = Some(task);
        Ok(())
    }

    /// Unload the map: drop the mesh, both caches and any running
    /// triangulation.
    pub fn reset(&mut self) {
        self.stop_task();
        self.store.reset(None);
        self.session = None;
    }

    fn read_persisted(&self, name: &str) -> Option<MeshRecord> {
        let path = self.config.mesh_file(name)?;
        match persist::load(&path) {
            Ok(Some(record)) => Some(record),
            Ok(None) => None,
            Err(e) => {
                log::warn!("ignoring stored mesh {}: {e}", path.display());
                None
            }
        }
    }

    fn write_persisted(&self, token: u64) {
        if !self.config.persist_results {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(path) = self.config.mesh_file(&session.name) else {
            return;
        };
        let saved = self.store.with_mesh(|mesh| {
            (mesh.generation() == token)
                .then(|| persist::save(&path, mesh.edges(), mesh.triangles()))
        });
        match saved.flatten() {
            Some(Ok(())) => log::info!("stored mesh for {} at {}", session.name, path.display()),
            Some(Err(e)) => log::warn!("failed to store mesh at {}: {e}", path.display()),
            None => {}
        }
    }

    /// Install a finished triangulation. Returns whether it was accepted.
    fn accept(&self, done: TriangulationDone) -> bool {
        let token = done.token;
        let count = done.triangles.len();
        match self.store.install(token, done.edges, done.triangles) {
            Ok(stats) => {
                log::info!(
                    "triangulation finished in {:.2?}: {count} triangles, {} kept",
                    done.elapsed,
                    stats.triangles
                );
                self.write_persisted(token);
                true
            }
            Err(MeshError::Superseded { token, current }) => {
                log::debug!("discarding triangulation {token}, store is at {current}");
                false
            }
            Err(e) => {
                log::warn!("triangulation {token} not installed: {e}");
                false
            }
        }
    }

    /// Install any finished triangulation without blocking. Returns whether
    /// a new mesh was installed.
    pub fn pump(&self) -> bool {
        let mut installed = false;
        while let Ok(done) = self.rx.try_recv() {
            installed |= self.accept(done);
        }
        installed
    }

    /// Block until a mesh is installed or `timeout` elapses.
    ///
    /// Returns early with `false` once the worker has exited without leaving
    /// an installable result, e.g. after it was cancelled or its result was
    /// refused as superseded.
    pub fn wait_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.is_ready() {
                return true;
            }
            let Some(task) = self.task.as_ref() else {
                return false;
            };
            // The worker sends before it exits, so an exited worker and an
            // empty channel mean nothing more is coming.
            if task.is_finished() && self.rx.is_empty() {
                log::debug!("worker for generation {} exited without a mesh", task.token());
                return false;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            match self.rx.recv_timeout(left.min(WAIT_POLL)) {
                Ok(done) => {
                    self.accept(done);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    /// Triangulate the loaded map on the calling thread and install the
    /// result, replacing any background work.
    pub fn build_blocking(&mut self) -> Result<MeshStats> {
        self.stop_task();
        let Some(session) = self.session.as_ref() else {
            return Err(MeshError::Worker("no map loaded".into()));
        };
        let token = self.store.reset(Some(session.grid.clone()));
        let start = Instant::now();
        let triangles = run_triangulation(
            &session.grid,
            &session.edges,
            self.config.triangulation_threads,
            &Context::new(),
        )
        .ok_or_else(|| MeshError::Worker("triangulation cancelled".into()))?;
        log::info!(
            "triangulated {} in {:.2?}",
            session.name,
            start.elapsed()
        );
        let stats = self.store.install(token, session.edges.clone(), triangles)?;
        self.write_persisted(token);
        Ok(stats)
    }

    /// Whether a mesh is installed.
    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// Counts of the installed mesh.
    pub fn stats(&self) -> Option<MeshStats> {
        self.store.stats()
    }

    /// Path from `from` to `to`, using the configured shortcut setting.
    pub fn find_path(&self, from: Vec2, to: Vec2) -> Path {
        self.find_path_with(from, to, self.config.allow_direct_shortcut)
    }

    /// Path from `from` to `to`.
    ///
    /// In order: the direct segment when `allow_direct` is set and nothing
    /// blocks it, `[from]` when no mesh is installed, the triangle route, the
    /// grid route, and finally `[from]`.
    pub fn find_path_with(&self, from: Vec2, to: Vec2, allow_direct: bool) -> Path {
        self.pump();
        let Some(session) = self.session.as_ref() else {
            return Path::stay(from);
        };
        let grid = &*session.grid;

        if allow_direct && grid.visible(from, to) {
            return Path::from(vec![from, to]);
        }
        if from == to {
            return Path::stay(from);
        }

        let mut st = self.store.lock();
        if !st.is_ready() {
            log::debug!("mesh not ready, holding at {from}");
            return Path::stay(from);
        }
        match st.route(grid, from, to) {
            Some(points) => Path::from(points),
            None => {
                log::debug!("no route {from} -> {to}");
                Path::stay(from)
            }
        }
    }

    /// Length of [`find_path`](Self::find_path), or `-1.0` for no route.
    pub fn path_length(&self, from: Vec2, to: Vec2) -> f32 {
        self.find_path(from, to).length()
    }

    /// Number of points of [`find_path`](Self::find_path).
    pub fn waypoint_count(&self, from: Vec2, to: Vec2) -> usize {
        self.find_path(from, to).waypoint_count()
    }

    /// Whether every segment of `path` is clear on the loaded map.
    ///
    /// Cached routes are not checked against later map changes, so callers
    /// should validate before following a path and re-query on failure.
    pub fn validate_path(&self, path: &Path) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| path.is_valid(&*s.grid))
    }
}

impl Drop for NavService {
    fn drop(&mut self) {
        self.stop_task();
    }
}
