//! navbot — builds the navigation mesh of a tile map and prints paths.

mod cli;
mod overlay;

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tilenav_core::{Grid, Vec2};
use tilenav_mesh::NavService;

use cli::{Args, Query};

const ARENA: &str = include_str!("../data/arena.txt");

/// Map name used as the stored-mesh key: the file stem.
fn map_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "map".to_owned(), |s| s.to_string_lossy().into_owned())
}

/// From the first open cell to the last one, in row-major order.
fn corner_query(grid: &Grid) -> Option<Query> {
    let mut open = grid.iter().filter(|(_, t)| !t.is_solid()).map(|(p, _)| p);
    let first = open.next()?;
    let last = open.last().unwrap_or(first);
    Some(Query {
        from: Grid::cell_center(first),
        to: Grid::cell_center(last),
    })
}

fn describe(nav: &NavService, from: Vec2, to: Vec2, show: bool) {
    let path = nav.find_path(from, to);
    if path.is_degenerate() {
        println!("{from} -> {to}: no path");
    } else {
        println!(
            "{from} -> {to}: {} waypoints, length {:.1}{}",
            path.waypoint_count(),
            path.length(),
            if nav.validate_path(&path) { "" } else { " (blocked!)" }
        );
        println!("  {path}");
    }
    if show {
        if let Some(grid) = nav.grid() {
            print!("{}", overlay::render(grid, nav.edges(), &path));
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = cli::load_config(args.config.as_deref())?;
    args.apply(&mut config);

    let (name, text) = match &args.map {
        Some(path) => (map_name(path), fs::read_to_string(path)?),
        None => ("arena".to_owned(), ARENA.to_owned()),
    };
    let grid = Grid::parse(&text)?;
    let default_query = corner_query(&grid);

    let mut nav = NavService::new(config.nav);
    nav.load_map(&name, grid)?;
    if !nav.is_ready() {
        if args.background {
            if !nav.wait_ready(Duration::from_secs(args.timeout)) {
                return Err(format!("no mesh for {name} after {}s", args.timeout).into());
            }
        } else {
            nav.build_blocking()?;
        }
    }
    if let Some(stats) = nav.stats() {
        println!("{name}: {stats}");
    }

    let mut queries = config.queries;
    if queries.is_empty() {
        queries.extend(default_query);
    }
    for q in queries {
        describe(&nav, q.from, q.to, args.show);
    }
    Ok(())
}
