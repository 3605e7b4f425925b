//! Runtime configuration for the navigation service.

use std::path::PathBuf;

/// Settings for a [`NavService`](crate::NavService).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavConfig {
    /// Directory holding persisted meshes, one `<map>.dat` file per map.
    /// `None` disables persistence entirely.
    pub cache_dir: Option<PathBuf>,
    /// Return `[from, to]` straight away when the segment is unobstructed.
    pub allow_direct_shortcut: bool,
    /// Worker threads for triangulation. `0` uses the global rayon pool.
    pub triangulation_threads: usize,
    /// Write freshly triangulated meshes to `cache_dir`.
    pub persist_results: bool,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            allow_direct_shortcut: true,
            triangulation_threads: 0,
            persist_results: true,
        }
    }
}

impl NavConfig {
    /// Path of the persisted mesh for `map`, if persistence is enabled.
    pub fn mesh_file(&self, map: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{map}.dat")))
    }
}
