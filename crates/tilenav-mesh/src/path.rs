use std::fmt;
use std::ops::Deref;

use tilenav_core::{Vec2, Visibility};

/// A route as a list of world points, starting at the query origin.
///
/// A single point means no route: hold position.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path(Vec<Vec2>);

impl Path {
    /// The degenerate path `[from]`.
    pub fn stay(from: Vec2) -> Self {
        Self(vec![from])
    }

    pub fn points(&self) -> &[Vec2] {
        &self.0
    }

    pub fn into_points(self) -> Vec<Vec2> {
        self.0
    }

    /// Sum of segment lengths, or `-1.0` below two points.
    pub fn length(&self) -> f32 {
        if self.0.len() < 2 {
            return -1.0;
        }
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    #[inline]
    pub fn waypoint_count(&self) -> usize {
        self.0.len()
    }

    /// Whether the path is not navigable.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.0.len() < 2
    }

    /// Whether every segment is free of walls. Paths below two points are
    /// never valid.
    pub fn is_valid<V: Visibility + ?Sized>(&self, vis: &V) -> bool {
        !self.is_degenerate() && self.0.windows(2).all(|w| vis.visible(w[0], w[1]))
    }
}

impl From<Vec<Vec2>> for Path {
    fn from(points: Vec<Vec2>) -> Self {
        Self(points)
    }
}

impl Deref for Path {
    type Target = [Vec2];

    fn deref(&self) -> &[Vec2] {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}
