use tilenav_core::{Point, Range};

// ---------------------------------------------------------------------------
// Internal node for priority-queue searches
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) g: i32,
    pub(crate) f: i32,
    pub(crate) parent: usize,
    pub(crate) generation: u32,
    pub(crate) open: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            g: 0,
            f: 0,
            parent: usize::MAX,
            generation: 0,
            open: false,
        }
    }
}

/// Reference into the node array, ordered by `f` for use in `BinaryHeap`.
#[derive(Clone, Copy, Eq, PartialEq)]
pub(crate) struct NodeRef {
    pub(crate) idx: usize,
    pub(crate) f: i32,
}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse so BinaryHeap (max-heap) pops smallest f first.
        other.f.cmp(&self.f)
    }
}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// PathRange
// ---------------------------------------------------------------------------

/// Reusable search state for one grid rectangle.
///
/// `PathRange` owns the node array used by jump point search, so repeated
/// queries incur no allocations after the first use. Nodes from earlier
/// searches are invalidated lazily by bumping a generation counter.
pub struct PathRange {
    pub(crate) rng: Range,
    pub(crate) width: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) generation: u32,
}

impl PathRange {
    /// Create a new `PathRange` for the given grid rectangle.
    pub fn new(rng: Range) -> Self {
        Self {
            rng,
            width: rng.width().max(0) as usize,
            nodes: vec![Node::default(); rng.len()],
            generation: 0,
        }
    }

    /// Replace the underlying range.
    ///
    /// If the new size fits within the existing node array it is kept and
    /// only the generation is bumped; otherwise the array is reallocated.
    pub fn set_range(&mut self, rng: Range) {
        let new_len = rng.len();
        self.rng = rng;
        self.width = rng.width().max(0) as usize;

        if new_len <= self.nodes.len() {
            self.generation = self.generation.wrapping_add(1);
            return;
        }

        self.nodes.clear();
        self.nodes.resize(new_len, Node::default());
        self.generation = 0;
    }

    /// The grid rectangle being used.
    #[inline]
    pub fn range(&self) -> Range {
        self.rng
    }

    /// Convert a `Point` to a flat index. Returns `None` if out of range.
    #[inline]
    pub(crate) fn idx(&self, p: Point) -> Option<usize> {
        if !self.rng.contains(p) {
            return None;
        }
        let x = (p.x - self.rng.min.x) as usize;
        let y = (p.y - self.rng.min.y) as usize;
        Some(y * self.width + x)
    }

    /// Convert a flat index back to a `Point`.
    #[inline]
    pub(crate) fn point(&self, idx: usize) -> Point {
        let x = (idx % self.width) as i32 + self.rng.min.x;
        let y = (idx / self.width) as i32 + self.rng.min.y;
        Point::new(x, y)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PathRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rng.serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for PathRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let range = Range::deserialize(deserializer)?;
        Ok(PathRange::new(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_range_smaller_preserves_capacity() {
        let mut pr = PathRange::new(Range::new(0, 0, 20, 20));
        let original_cap = pr.nodes.len();

        let small = Range::new(0, 0, 5, 5);
        pr.set_range(small);
        assert_eq!(pr.range(), small);
        assert_eq!(pr.nodes.len(), original_cap);
        assert_eq!(pr.width, 5);
        assert_eq!(pr.generation, 1);
    }

    #[test]
    fn set_range_larger_reallocates() {
        let mut pr = PathRange::new(Range::new(0, 0, 5, 5));
        let big = Range::new(0, 0, 20, 20);
        pr.set_range(big);
        assert_eq!(pr.range(), big);
        assert_eq!(pr.nodes.len(), 400);
        assert_eq!(pr.generation, 0);
    }

    #[test]
    fn idx_and_point_respect_origin() {
        let pr = PathRange::new(Range::new(5, 5, 15, 10));
        let p = Point::new(7, 8);
        let i = pr.idx(p).unwrap();
        assert_eq!(i, 3 * 10 + 2);
        assert_eq!(pr.point(i), p);
        assert_eq!(pr.idx(Point::new(4, 5)), None);
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn pathrange_round_trip() {
        let rng = Range::new(1, 2, 10, 20);
        let pr = PathRange::new(rng);
        let json = serde_json::to_string(&pr).unwrap();
        let back: PathRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back.range(), rng);
        // Node arrays are rebuilt, not serialized.
        assert_eq!(back.generation, 0);
        assert_eq!(back.nodes.len(), rng.len());
    }
}
