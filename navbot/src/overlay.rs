//! Text rendering of a map with a path drawn over it.

use tilenav_core::{Grid, Point, Vec2};

/// Render `grid` with edge points as `+`, the cells the path crosses as `*`,
/// and its first and last points as `S` and `G`.
pub fn render(grid: &Grid, edges: &[Vec2], path: &[Vec2]) -> String {
    let mut rows: Vec<Vec<char>> = (0..grid.height())
        .map(|y| {
            (0..grid.width())
                .map(|x| grid.at(Point::new(x, y)).map_or(' ', |t| t.glyph()))
                .collect()
        })
        .collect();
    let mut put = |v: Vec2, ch: char| {
        let p = grid.cell_at(v);
        rows[p.y as usize][p.x as usize] = ch;
    };

    for &e in edges {
        put(e, '+');
    }
    for w in path.windows(2) {
        let steps = (w[0].distance(w[1]) / 8.0) as usize + 1;
        for i in 0..=steps {
            put(w[0].lerp(w[1], i as f32 / steps as f32), '*');
        }
    }
    if let (Some(&s), Some(&g)) = (path.first(), path.last()) {
        put(s, 'S');
        put(g, 'G');
    }

    let mut out = String::with_capacity(rows.len() * (rows.first().map_or(0, Vec::len) + 1));
    for row in rows {
        out.extend(row);
        out.push('\n');
    }
    out
}
