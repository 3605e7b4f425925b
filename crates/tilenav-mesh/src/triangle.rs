//! The mesh [`Triangle`] and its circumcircle.

use std::fmt;

use tilenav_core::Vec2;

/// Determinant of a 3×3 matrix given row by row.
#[inline]
fn det3(m: [[f64; 3]; 3]) -> f64 {
    m[0][0] * m[1][1] * m[2][2] + m[0][1] * m[1][2] * m[2][0] + m[0][2] * m[1][0] * m[2][1]
        - m[0][0] * m[1][2] * m[2][1]
        - m[0][1] * m[1][0] * m[2][2]
        - m[0][2] * m[1][1] * m[2][0]
}

/// A mesh triangle with its centroid and circumcircle.
///
/// The derived fields are computed once on construction. Collinear vertices
/// have no circumcircle, so [`Triangle::new`] refuses them.
///
/// Equality follows mesh identity rather than field equality: two triangles
/// are equal when their circumcircles match exactly and all three vertices are
/// shared, in any order.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    a: Vec2,
    b: Vec2,
    c: Vec2,
    center: Vec2,
    circumcenter: [f64; 2],
    circumradius: f64,
}

impl Triangle {
    /// Build a triangle, or `None` when the vertices are collinear.
    pub fn new(a: Vec2, b: Vec2, c: Vec2) -> Option<Self> {
        let [ax, ay] = [f64::from(a.x), f64::from(a.y)];
        let [bx, by] = [f64::from(b.x), f64::from(b.y)];
        let [cx, cy] = [f64::from(c.x), f64::from(c.y)];

        let d = 2.0 * det3([[ax, ay, 1.0], [bx, by, 1.0], [cx, cy, 1.0]]);
        if d == 0.0 || !d.is_finite() {
            return None;
        }

        let (sa, sb, sc) = (ax * ax + ay * ay, bx * bx + by * by, cx * cx + cy * cy);
        let xc = det3([[sa, ay, 1.0], [sb, by, 1.0], [sc, cy, 1.0]]) / d;
        let yc = -det3([[sa, ax, 1.0], [sb, bx, 1.0], [sc, cx, 1.0]]) / d;
        let circumradius = (xc - ax).hypot(yc - ay);

        Some(Self {
            a,
            b,
            c,
            center: Vec2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0),
            circumcenter: [xc, yc],
            circumradius,
        })
    }

    /// The three vertices in construction order.
    #[inline]
    pub fn vertices(&self) -> [Vec2; 3] {
        [self.a, self.b, self.c]
    }

    /// Centroid.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn circumcenter(&self) -> [f64; 2] {
        self.circumcenter
    }

    #[inline]
    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }

    /// Whether the circumcenter lies within `[0, size.x] × [0, size.y]`.
    pub fn circumcenter_within(&self, size: Vec2) -> bool {
        let [x, y] = self.circumcenter;
        (0.0..=f64::from(size.x)).contains(&x) && (0.0..=f64::from(size.y)).contains(&y)
    }

    /// Whether `p` lies strictly inside the circumcircle.
    #[inline]
    pub fn in_circumcircle(&self, p: Vec2) -> bool {
        let [x, y] = self.circumcenter;
        (f64::from(p.x) - x).hypot(f64::from(p.y) - y) < self.circumradius
    }

    /// Number of vertex matches over all nine vertex pairs.
    pub fn shared_vertices(&self, other: &Triangle) -> usize {
        let mine = self.vertices();
        other
            .vertices()
            .iter()
            .map(|v| mine.iter().filter(|m| *m == v).count())
            .sum()
    }

    /// Whether the triangles share exactly one edge.
    #[inline]
    pub fn is_neighbor(&self, other: &Triangle) -> bool {
        self.shared_vertices(other) == 2
    }

    /// Whether `p` is strictly inside the triangle. Points on an edge or
    /// vertex are outside.
    pub fn contains(&self, p: Vec2) -> bool {
        let (a, b, c) = (self.a, self.b, self.c);
        let (px, py) = (f64::from(p.x), f64::from(p.y));
        let (ax, ay) = (f64::from(a.x), f64::from(a.y));
        let (bx, by) = (f64::from(b.x), f64::from(b.y));
        let (cx, cy) = (f64::from(c.x), f64::from(c.y));

        let mut s = ay * cx - ax * cy + (cy - ay) * px + (ax - cx) * py;
        let mut t = ax * by - ay * bx + (ay - by) * px + (bx - ax) * py;
        if (s < 0.0) != (t < 0.0) {
            return false;
        }

        let mut area = -by * cx + ay * (cx - bx) + ax * (by - cy) + bx * cy;
        if area < 0.0 {
            s = -s;
            t = -t;
            area = -area;
        }
        s > 0.0 && t > 0.0 && s + t < area
    }
}

impl PartialEq for Triangle {
    fn eq(&self, other: &Self) -> bool {
        self.circumcenter == other.circumcenter
            && self.circumradius == other.circumradius
            && self.shared_vertices(other) == 3
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "△{} {} {}", self.a, self.b, self.c)
    }
}
