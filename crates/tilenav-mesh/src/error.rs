use std::io;

use tilenav_core::MapError;

/// Errors raised by map loading, mesh persistence and the triangulation
/// worker.
///
/// Query-side failures (no path, mesh not ready, degenerate triangles) are
/// not errors: they degrade to shorter paths instead.
#[derive(thiserror::Error, Debug)]
pub enum MeshError {
    #[error("map rejected: {0}")]
    Map(#[from] MapError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("mesh record truncated while reading {0}")]
    Truncated(&'static str),

    #[error("mesh record declares {count} {what}, more than the input holds")]
    CountTooLarge { what: &'static str, count: u64 },

    #[error("generation {token} superseded by {current}")]
    Superseded { token: u64, current: u64 },

    #[error("triangulation worker failed: {0}")]
    Worker(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
