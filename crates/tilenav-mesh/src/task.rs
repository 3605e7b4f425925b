//! Background triangulation: a cancellation [`Context`] and the worker
//! thread that reports a [`TriangulationDone`] message when it finishes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tilenav_core::{Grid, Vec2};

use crate::error::{MeshError, Result};
use crate::triangle::Triangle;
use crate::triangulate::triangulate;

/// Cancellation flag shared by a [`TriangulationTask`] and its worker.
///
/// [`triangulate`] polls it while filling the visibility matrix and once per
/// outer-loop vertex, and gives up with `None` as soon as it is set. A
/// superseded map load sets it; the store's token check still refuses any
/// result that slips through.
#[derive(Clone, Debug, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the triangulation should stop.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Stop the triangulation at its next poll.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Result of one finished triangulation, tagged with the generation token it
/// was started for.
#[derive(Debug)]
pub struct TriangulationDone {
    pub token: u64,
    pub edges: Vec<Vec2>,
    pub triangles: Vec<Triangle>,
    pub elapsed: Duration,
}

/// Run the triangulation on a dedicated pool of `threads` workers, or on the
/// global rayon pool when `threads` is zero or the pool cannot be built.
pub fn run_triangulation(
    grid: &Grid,
    edges: &[Vec2],
    threads: usize,
    ctx: &Context,
) -> Option<Vec<Triangle>> {
    let world = grid.world_size();
    if threads == 0 {
        return triangulate(edges, world, grid, ctx);
    }
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("triangulate-{i}"))
        .build()
    {
        Ok(pool) => pool.install(|| triangulate(edges, world, grid, ctx)),
        Err(e) => {
            log::warn!("failed to build {threads}-thread pool ({e}), using the global pool");
            triangulate(edges, world, grid, ctx)
        }
    }
}

/// Handle to a background triangulation.
///
/// Dropping the handle cancels the work without waiting for the thread: a
/// cancelled worker exits at its next check and sends nothing.
#[derive(Debug)]
pub struct TriangulationTask {
    token: u64,
    ctx: Context,
    handle: Option<JoinHandle<()>>,
}

impl TriangulationTask {
    /// Spawn the worker thread for generation `token`.
    pub fn spawn(
        token: u64,
        grid: Arc<Grid>,
        edges: Vec<Vec2>,
        threads: usize,
        tx: Sender<TriangulationDone>,
    ) -> Result<Self> {
        let ctx = Context::new();
        let worker_ctx = ctx.clone();
        let handle = thread::Builder::new()
            .name(format!("navmesh-{token}"))
            .spawn(move || {
                log::info!(
                    "triangulating generation {token}: {} edge points",
                    edges.len()
                );
                let start = Instant::now();
                let Some(triangles) = run_triangulation(&grid, &edges, threads, &worker_ctx)
                else {
                    log::debug!("triangulation of generation {token} cancelled");
                    return;
                };
                let done = TriangulationDone {
                    token,
                    edges,
                    triangles,
                    elapsed: start.elapsed(),
                };
                if tx.send(done).is_err() {
                    log::debug!("generation {token} finished after its service was dropped");
                }
            })
            .map_err(|e| MeshError::Worker(e.to_string()))?;

        Ok(Self {
            token,
            ctx,
            handle: Some(handle),
        })
    }

    /// Generation token the task was started for.
    #[inline]
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Ask the worker to stop.
    #[inline]
    pub fn cancel(&self) {
        self.ctx.cancel();
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the worker thread to exit.
    pub fn join(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| MeshError::Worker(format!("generation {} panicked", self.token))),
            None => Ok(()),
        }
    }
}

impl Drop for TriangulationTask {
    fn drop(&mut self) {
        self.ctx.cancel();
    }
}
