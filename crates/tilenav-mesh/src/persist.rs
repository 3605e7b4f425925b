//! Binary mesh record.
//!
//! Layout, little-endian:
//!
//! ```text
//! edge_count: u64
//! edge_count × (x: f32, y: f32)
//! triangle_count: u64
//! triangle_count × (a.x, a.y, b.x, b.y, c.x, c.y: f32)
//! ```
//!
//! Neighbors are not stored; they are relinked after loading.

use std::fs;
use std::io::{self, BufWriter, Cursor, ErrorKind, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tilenav_core::Vec2;

use crate::error::{MeshError, Result};
use crate::triangle::Triangle;

const EDGE_BYTES: u64 = 8;
const TRIANGLE_BYTES: u64 = 24;

/// Edge points and triangles as read from a record.
#[derive(Debug, Clone, Default)]
pub struct MeshRecord {
    pub edges: Vec<Vec2>,
    pub triangles: Vec<Triangle>,
}

fn truncated(what: &'static str) -> impl Fn(io::Error) -> MeshError {
    move |e| match e.kind() {
        ErrorKind::UnexpectedEof => MeshError::Truncated(what),
        _ => MeshError::Io(e),
    }
}

fn read_vec2(r: &mut Cursor<&[u8]>, what: &'static str) -> Result<Vec2> {
    let x = r.read_f32::<LittleEndian>().map_err(truncated(what))?;
    let y = r.read_f32::<LittleEndian>().map_err(truncated(what))?;
    Ok(Vec2::new(x, y))
}

fn write_vec2<W: Write>(w: &mut W, v: Vec2) -> io::Result<()> {
    w.write_f32::<LittleEndian>(v.x)?;
    w.write_f32::<LittleEndian>(v.y)
}

/// Read a count and check that `unit`-byte records of that many items fit
/// in what is left of the input.
fn read_count(r: &mut Cursor<&[u8]>, what: &'static str, unit: u64) -> Result<usize> {
    let count = r.read_u64::<LittleEndian>().map_err(truncated(what))?;
    let remaining = r.get_ref().len() as u64 - r.position();
    if count.checked_mul(unit).is_none_or(|n| n > remaining) {
        return Err(MeshError::CountTooLarge { what, count });
    }
    Ok(count as usize)
}

/// Serialize edge points and triangles.
pub fn write_mesh<W: Write>(w: &mut W, edges: &[Vec2], triangles: &[Triangle]) -> Result<()> {
    w.write_u64::<LittleEndian>(edges.len() as u64)?;
    for &e in edges {
        write_vec2(w, e)?;
    }
    w.write_u64::<LittleEndian>(triangles.len() as u64)?;
    for t in triangles {
        for v in t.vertices() {
            write_vec2(w, v)?;
        }
    }
    Ok(())
}

/// Parse a record. Degenerate triangles are skipped.
pub fn read_mesh(bytes: &[u8]) -> Result<MeshRecord> {
    let mut r = Cursor::new(bytes);

    let edge_count = read_count(&mut r, "edges", EDGE_BYTES)?;
    let edges = (0..edge_count)
        .map(|_| read_vec2(&mut r, "edges"))
        .collect::<Result<Vec<_>>>()?;

    let tri_count = read_count(&mut r, "triangles", TRIANGLE_BYTES)?;
    let mut triangles = Vec::with_capacity(tri_count);
    for _ in 0..tri_count {
        let a = read_vec2(&mut r, "triangles")?;
        let b = read_vec2(&mut r, "triangles")?;
        let c = read_vec2(&mut r, "triangles")?;
        match Triangle::new(a, b, c) {
            Some(t) => triangles.push(t),
            None => log::debug!("skipping degenerate stored triangle {a} {b} {c}"),
        }
    }

    Ok(MeshRecord { edges, triangles })
}

/// Write a record to `path`, creating parent directories as needed.
pub fn save(path: &Path, edges: &[Vec2], triangles: &[Triangle]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut w = BufWriter::new(fs::File::create(path)?);
    write_mesh(&mut w, edges, triangles)?;
    w.flush()?;
    Ok(())
}

/// Read the record at `path`. A missing file is `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<MeshRecord>> {
    let mut bytes = Vec::new();
    match fs::File::open(path) {
        Ok(mut f) => f.read_to_end(&mut bytes)?,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    read_mesh(&bytes).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::extract_edges;
    use crate::link::link;
    use crate::task::Context;
    use crate::triangulate::triangulate;
    use tilenav_core::{Grid, Point, Range, Tile};

    fn sample() -> (Vec<Vec2>, Vec<Triangle>) {
        let mut g = Grid::new(12, 12);
        g.fill(Range::new(4, 4, 7, 7), Tile::Solid);
        g.set(Point::new(5, 5), Tile::Open);
        g.fill(Range::new(9, 1, 11, 3), Tile::Solid);
        let edges = extract_edges(&g);
        let tris = triangulate(&edges, g.world_size(), &g, &Context::new()).unwrap();
        (edges, link(tris).triangles)
    }

    #[test]
    fn layout_is_little_endian() {
        let t = Triangle::new(
            Vec2::new(1.0, 2.0),
            Vec2::new(3.0, 4.0),
            Vec2::new(5.0, 7.0),
        )
        .unwrap();
        let mut buf = Vec::new();
        write_mesh(&mut buf, &[Vec2::new(1.5, -2.0)], &[t]).unwrap();
        assert_eq!(buf.len(), 8 + 8 + 8 + 24);
        assert_eq!(&buf[..8], &1u64.to_le_bytes());
        assert_eq!(&buf[8..12], &1.5f32.to_le_bytes());
        assert_eq!(&buf[12..16], &(-2.0f32).to_le_bytes());
        assert_eq!(&buf[16..24], &1u64.to_le_bytes());
        assert_eq!(&buf[44..48], &7.0f32.to_le_bytes());
    }

    #[test]
    fn round_trip_preserves_triangles_and_links() {
        let (edges, tris) = sample();
        assert!(!tris.is_empty());
        let mut buf = Vec::new();
        write_mesh(&mut buf, &edges, &tris).unwrap();
        let back = read_mesh(&buf).unwrap();

        assert_eq!(back.edges, edges);
        assert_eq!(back.triangles.len(), tris.len());
        for (a, b) in tris.iter().zip(back.triangles.iter()) {
            assert_eq!(a.vertices(), b.vertices());
            assert_eq!(a, b);
        }
        let before = link(tris);
        let after = link(back.triangles);
        assert_eq!(before.neighbors, after.neighbors);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let (edges, tris) = sample();
        let mut buf = Vec::new();
        write_mesh(&mut buf, &edges, &tris).unwrap();

        assert!(matches!(
            read_mesh(&buf[..4]),
            Err(MeshError::Truncated("edges"))
        ));
        buf.truncate(buf.len() - 3);
        assert!(matches!(
            read_mesh(&buf),
            Err(MeshError::CountTooLarge {
                what: "triangles",
                ..
            })
        ));
    }

    #[test]
    fn absurd_count_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            read_mesh(&buf),
            Err(MeshError::CountTooLarge { what: "edges", .. })
        ));
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf.extend_from_slice(&1u64.to_le_bytes());
        for v in [0.0f32, 0.0, 1.0, 1.0, 2.0, 2.0] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        let rec = read_mesh(&buf).unwrap();
        assert!(rec.edges.is_empty());
        assert!(rec.triangles.is_empty());
    }

    #[test]
    fn save_and_load_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps").join("ring.dat");
        assert!(load(&path).unwrap().is_none());

        let (edges, tris) = sample();
        save(&path, &edges, &tris).unwrap();
        let rec = load(&path).unwrap().unwrap();
        assert_eq!(rec.edges, edges);
        assert_eq!(rec.triangles.len(), tris.len());
    }
}
