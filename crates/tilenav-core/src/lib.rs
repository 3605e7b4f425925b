//! **tilenav-core** — core types for tile-map navigation.
//!
//! This crate provides the foundational types shared by the *tilenav*
//! crates: cell and world geometry, the immutable tile [`Grid`] of a map,
//! and the [`Visibility`] line-of-sight oracle.

pub mod geom;
pub mod grid;
pub mod los;

pub use geom::{Point, Range, RangeIter, Vec2};
pub use grid::{Grid, MapError, TILE_SIZE, Tile};
pub use los::Visibility;
