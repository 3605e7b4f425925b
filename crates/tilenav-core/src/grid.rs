//! The tile [`Grid`] of a map.
//!
//! A grid is built once per map load and is immutable afterwards, so it can
//! be shared between the query thread and the background triangulation
//! through an `Arc`.

use crate::geom::{Point, Range, Vec2};

/// World units spanned by one grid cell.
pub const TILE_SIZE: f32 = 32.0;

/// Collision class of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tile {
    /// Free space.
    #[default]
    Open,
    /// Solid, hookable wall.
    Solid,
    /// Solid wall that cannot be hooked.
    NoHook,
}

impl Tile {
    /// Whether the tile blocks movement and line of sight.
    #[inline]
    pub fn is_solid(self) -> bool {
        !matches!(self, Tile::Open)
    }

    /// Tile for an ASCII map glyph.
    pub fn from_glyph(ch: char) -> Option<Tile> {
        match ch {
            '.' | ' ' => Some(Tile::Open),
            '#' => Some(Tile::Solid),
            'X' => Some(Tile::NoHook),
            _ => None,
        }
    }

    /// ASCII glyph for the tile.
    pub fn glyph(self) -> char {
        match self {
            Tile::Open => '.',
            Tile::Solid => '#',
            Tile::NoHook => 'X',
        }
    }
}

/// Errors produced while building a [`Grid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// The map has no cells.
    #[error("map is empty")]
    Empty,
    /// Rows have differing widths.
    #[error("map row {row} has width {width}, expected {expected}")]
    InconsistentSize {
        row: usize,
        width: usize,
        expected: usize,
    },
    /// A glyph outside `.`, space, `#` and `X` was found.
    #[error("map contains invalid glyph \u{201c}{ch}\u{201d} at {pos}")]
    InvalidGlyph { ch: char, pos: Point },
    /// The tile buffer does not match the requested dimensions.
    #[error("tile buffer has {len} cells, expected {width}x{height}")]
    SizeMismatch { len: usize, width: i32, height: i32 },
}

/// A 2D grid of [`Tile`] values in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grid {
    tiles: Vec<Tile>,
    width: i32,
    height: i32,
}

impl Grid {
    /// Create a grid of the given size with every cell open.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            tiles: vec![Tile::Open; (width * height) as usize],
            width,
            height,
        }
    }

    /// Wrap a row-major tile buffer.
    pub fn from_tiles(width: i32, height: i32, tiles: Vec<Tile>) -> Result<Self, MapError> {
        if width <= 0 || height <= 0 {
            return Err(MapError::Empty);
        }
        if tiles.len() != (width as usize) * (height as usize) {
            return Err(MapError::SizeMismatch {
                len: tiles.len(),
                width,
                height,
            });
        }
        Ok(Self {
            tiles,
            width,
            height,
        })
    }

    /// Parse an ASCII map.
    ///
    /// Leading and trailing blank lines are trimmed. Every remaining line must
    /// have the same width. `.` and space are open, `#` is solid and `X` is a
    /// no-hook wall.
    pub fn parse(s: &str) -> Result<Self, MapError> {
        let s = s.trim_matches('\n');
        let rows: Vec<&str> = s.lines().map(|l| l.trim_end_matches('\r')).collect();
        let expected = rows.first().map_or(0, |r| r.chars().count());
        if rows.is_empty() || expected == 0 {
            return Err(MapError::Empty);
        }

        let mut tiles = Vec::with_capacity(expected * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let width = row.chars().count();
            if width != expected {
                return Err(MapError::InconsistentSize {
                    row: y,
                    width,
                    expected,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let tile = Tile::from_glyph(ch).ok_or(MapError::InvalidGlyph {
                    ch,
                    pos: Point::new(x as i32, y as i32),
                })?;
                tiles.push(tile);
            }
        }
        Self::from_tiles(expected as i32, rows.len() as i32, tiles)
    }

    /// Width in cells.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Bounding range of the grid in cells.
    #[inline]
    pub fn bounds(&self) -> Range {
        Range::new(0, 0, self.width, self.height)
    }

    /// Bottom-right map corner in world units.
    #[inline]
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.width as f32 * TILE_SIZE, self.height as f32 * TILE_SIZE)
    }

    /// Whether `p` lies inside the grid.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }

    /// Flat row-major index of `p`, or `None` when out of bounds.
    #[inline]
    pub fn index(&self, p: Point) -> Option<usize> {
        if !self.contains(p) {
            return None;
        }
        Some((p.y * self.width + p.x) as usize)
    }

    /// Cell for a flat row-major index.
    #[inline]
    pub fn point(&self, idx: usize) -> Point {
        let w = self.width.max(1) as usize;
        Point::new((idx % w) as i32, (idx / w) as i32)
    }

    /// Tile at `p`, or `None` when out of bounds.
    #[inline]
    pub fn at(&self, p: Point) -> Option<Tile> {
        self.index(p).map(|i| self.tiles[i])
    }

    /// Whether `p` is a wall. Out-of-bounds cells count as open.
    #[inline]
    pub fn is_solid(&self, p: Point) -> bool {
        self.at(p).is_some_and(Tile::is_solid)
    }

    /// Set the tile at `p`. Does nothing if out of bounds.
    pub fn set(&mut self, p: Point, tile: Tile) {
        if let Some(i) = self.index(p) {
            self.tiles[i] = tile;
        }
    }

    /// Fill every cell of `rng` (clipped to the grid) with `tile`.
    pub fn fill(&mut self, rng: Range, tile: Tile) {
        for p in rng {
            self.set(p, tile);
        }
    }

    /// Cell whose area contains the world point `v`, clamped to the grid.
    #[inline]
    pub fn cell_at(&self, v: Vec2) -> Point {
        let p = Point::new(
            (v.x / TILE_SIZE).floor() as i32,
            (v.y / TILE_SIZE).floor() as i32,
        );
        self.bounds().clamp(p)
    }

    /// Cell nearest to the world point `v` by rounding, clamped to the grid.
    ///
    /// This is the mapping used by the grid search. It rounds `v / TILE_SIZE`
    /// rather than flooring it, so it differs from [`cell_at`](Self::cell_at)
    /// by up to half a cell.
    #[inline]
    pub fn nearest_cell(&self, v: Vec2) -> Point {
        let p = Point::new(
            (v.x / TILE_SIZE).round() as i32,
            (v.y / TILE_SIZE).round() as i32,
        );
        self.bounds().clamp(p)
    }

    /// World position of the center of cell `p`.
    #[inline]
    pub fn cell_center(p: Point) -> Vec2 {
        Vec2::new(
            p.x as f32 * TILE_SIZE + TILE_SIZE / 2.0,
            p.y as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        )
    }

    /// Binary walkability mask: `1` for open cells, `0` for walls.
    pub fn walkable_mask(&self) -> Vec<u8> {
        self.tiles
            .iter()
            .map(|t| if t.is_solid() { 0 } else { 1 })
            .collect()
    }

    /// Number of wall cells.
    pub fn count_solid(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_solid()).count()
    }

    /// Row-major iterator over `(Point, Tile)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Point, Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(|(i, &t)| (self.point(i), t))
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let t = self.tiles[(y * self.width + x) as usize];
                write!(f, "{}", t.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "\
####
#..#
#.X#
####";

    #[test]
    fn parse_and_size() {
        let g = Grid::parse(ROOM).unwrap();
        assert_eq!(g.width(), 4);
        assert_eq!(g.height(), 4);
        assert_eq!(g.at(Point::new(0, 0)), Some(Tile::Solid));
        assert_eq!(g.at(Point::new(1, 1)), Some(Tile::Open));
        assert_eq!(g.at(Point::new(2, 2)), Some(Tile::NoHook));
        assert_eq!(g.at(Point::new(4, 0)), None);
        assert_eq!(g.count_solid(), 13);
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        let err = Grid::parse("###\n##\n###").unwrap_err();
        assert_eq!(
            err,
            MapError::InconsistentSize {
                row: 1,
                width: 2,
                expected: 3
            }
        );
    }

    #[test]
    fn parse_rejects_unknown_glyph() {
        let err = Grid::parse("#.\n.?").unwrap_err();
        assert_eq!(
            err,
            MapError::InvalidGlyph {
                ch: '?',
                pos: Point::new(1, 1)
            }
        );
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(Grid::parse("\n\n").unwrap_err(), MapError::Empty);
    }

    #[test]
    fn display_round_trips() {
        let g = Grid::parse(ROOM).unwrap();
        let back = Grid::parse(&g.to_string()).unwrap();
        assert_eq!(g, back);
    }

    #[test]
    fn index_and_point_are_inverse() {
        let g = Grid::new(7, 3);
        for p in g.bounds() {
            let i = g.index(p).unwrap();
            assert_eq!(g.point(i), p);
        }
        assert_eq!(g.index(Point::new(-1, 0)), None);
    }

    #[test]
    fn world_to_cell_mappings() {
        let g = Grid::new(10, 10);
        let v = Vec2::new(47.0, 47.0);
        assert_eq!(g.cell_at(v), Point::new(1, 1));
        assert_eq!(g.nearest_cell(v), Point::new(1, 1));
        let v = Vec2::new(49.0, 15.0);
        assert_eq!(g.cell_at(v), Point::new(1, 0));
        assert_eq!(g.nearest_cell(v), Point::new(2, 0));
        assert_eq!(g.nearest_cell(Vec2::new(-100.0, 1000.0)), Point::new(0, 9));
        assert_eq!(Grid::cell_center(Point::new(2, 3)), Vec2::new(80.0, 112.0));
    }

    #[test]
    fn walkable_mask_marks_walls() {
        let g = Grid::parse(ROOM).unwrap();
        let mask = g.walkable_mask();
        assert_eq!(mask.len(), 16);
        assert_eq!(mask[g.index(Point::new(1, 1)).unwrap()], 1);
        assert_eq!(mask[g.index(Point::new(2, 2)).unwrap()], 0);
        assert_eq!(mask.iter().filter(|&&m| m == 1).count(), 3);
    }

    #[test]
    fn fill_clips_to_bounds() {
        let mut g = Grid::new(4, 4);
        g.fill(Range::new(2, 2, 8, 8), Tile::Solid);
        assert_eq!(g.count_solid(), 4);
        assert!(g.is_solid(Point::new(3, 3)));
        assert!(!g.is_solid(Point::new(9, 9)));
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn grid_round_trip() {
        let g = Grid::parse("#.\nX.").unwrap();
        let json = serde_json::to_string(&g).unwrap();
        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
        assert_eq!(serde_json::to_string(&Tile::NoHook).unwrap(), "\"NoHook\"");
    }
}
