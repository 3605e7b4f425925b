//! Command-line arguments and the RON configuration file.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use tilenav_core::Vec2;
use tilenav_mesh::NavConfig;

/// Build a navigation mesh for an ASCII tile map and answer path queries.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ASCII map (`.` open, `#` wall, `X` no-hook wall). The built-in arena
    /// is used when omitted.
    pub map: Option<PathBuf>,

    /// RON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for stored meshes
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Triangulation worker threads (0 = one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Never take the direct line even when it is clear
    #[arg(long)]
    pub no_shortcut: bool,

    /// Query start in world units, as `x,y`
    #[arg(long, value_parser = parse_vec2, requires = "to")]
    pub from: Option<Vec2>,

    /// Query goal in world units, as `x,y`
    #[arg(long, value_parser = parse_vec2, requires = "from")]
    pub to: Option<Vec2>,

    /// Triangulate on the background worker and wait for it
    #[arg(long)]
    pub background: bool,

    /// Seconds to wait for a background triangulation
    #[arg(long, default_value = "120")]
    pub timeout: u64,

    /// Draw each path over the map
    #[arg(long)]
    pub show: bool,
}

/// A single path query.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Query {
    pub from: Vec2,
    pub to: Vec2,
}

/// Contents of the `--config` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub nav: NavConfig,
    pub queries: Vec<Query>,
}

impl Args {
    /// Apply command-line overrides on top of the file configuration.
    pub fn apply(&self, cfg: &mut BotConfig) {
        if let Some(dir) = &self.cache_dir {
            cfg.nav.cache_dir = Some(dir.clone());
        }
        if let Some(n) = self.threads {
            cfg.nav.triangulation_threads = n;
        }
        if self.no_shortcut {
            cfg.nav.allow_direct_shortcut = false;
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            cfg.queries.push(Query { from, to });
        }
    }
}

/// Parse `x,y` into a world point.
pub fn parse_vec2(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {s:?}"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("bad coordinate {v:?}: {e}"))
    };
    Ok(Vec2::new(coord(x)?, coord(y)?))
}

/// Read the configuration file, or the defaults when there is none.
pub fn load_config(path: Option<&Path>) -> Result<BotConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(BotConfig::default());
    };
    let text = fs::read_to_string(path)?;
    let cfg = ron::from_str(&text)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    log::info!("loaded configuration from {}", path.display());
    Ok(cfg)
}
