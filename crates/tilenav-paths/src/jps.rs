//! Jump Point Search (JPS) on uniform-cost 8-way grids.
//!
//! JPS is an optimised A* variant for grids where every passable step has
//! the same cost. It "jumps" along straight lines and diagonals, only adding
//! nodes to the open list at *jump points*: positions with forced
//! neighbours. Diagonal steps are only taken when both orthogonal cells next
//! to the step are passable, so paths never squeeze between two walls that
//! touch at a corner.

use std::collections::BinaryHeap;

use tilenav_core::{Point, Range};

use crate::PathRange;
use crate::distance;
use crate::pathrange::NodeRef;
use crate::traits::GridSearch;

const DIRS: [Point; 8] = [
    Point::new(1, 0),
    Point::new(-1, 0),
    Point::new(0, 1),
    Point::new(0, -1),
    Point::new(1, 1),
    Point::new(1, -1),
    Point::new(-1, 1),
    Point::new(-1, -1),
];

impl PathRange {
    /// Compute a shortest path from `from` to `to` using Jump Point Search.
    ///
    /// `passable` returns `true` for walkable positions; it is never asked
    /// about positions outside the range. Returns the full step-by-step path
    /// (including endpoints) or `None` if unreachable.
    pub fn jps_path(
        &mut self,
        from: Point,
        to: Point,
        passable: impl Fn(Point) -> bool,
    ) -> Option<Vec<Point>> {
        let start_idx = self.idx(from)?;
        let goal_idx = self.idx(to)?;

        let rng = self.rng;
        let passable = |p: Point| rng.contains(p) && passable(p);

        if !passable(from) || !passable(to) {
            return None;
        }
        if start_idx == goal_idx {
            return Some(vec![from]);
        }

        self.generation = self.generation.wrapping_add(1);
        let cur_gen = self.generation;

        {
            let n = &mut self.nodes[start_idx];
            n.g = 0;
            n.f = distance::chebyshev(from, to);
            n.parent = usize::MAX;
            n.generation = cur_gen;
            n.open = true;
        }

        let mut open: BinaryHeap<NodeRef> = BinaryHeap::new();
        open.push(NodeRef {
            idx: start_idx,
            f: self.nodes[start_idx].f,
        });

        let found = 'search: loop {
            let Some(cur) = open.pop() else {
                break 'search false;
            };
            let ci = cur.idx;
            if self.nodes[ci].generation != cur_gen || !self.nodes[ci].open {
                continue;
            }
            if ci == goal_idx {
                break 'search true;
            }
            self.nodes[ci].open = false;

            let cp = self.point(ci);
            let cur_g = self.nodes[ci].g;

            // The start node has no travel direction: expand every legal step.
            let dirs = if self.nodes[ci].parent == usize::MAX {
                Self::start_dirs(cp, &passable)
            } else {
                let pp = self.point(self.nodes[ci].parent);
                Self::jps_prune_dirs(cp, pp, &passable)
            };

            for dir in dirs {
                if let Some((jp, dist)) = Self::jps_jump(cp, dir, to, &passable) {
                    let Some(ji) = self.idx(jp) else {
                        continue;
                    };
                    let tentative_g = cur_g + dist;
                    let jn = &mut self.nodes[ji];
                    if jn.generation == cur_gen && tentative_g >= jn.g {
                        continue;
                    }
                    jn.generation = cur_gen;
                    jn.g = tentative_g;
                    jn.f = tentative_g + distance::chebyshev(jp, to);
                    jn.parent = ci;
                    jn.open = true;
                    open.push(NodeRef { idx: ji, f: jn.f });
                }
            }
        };

        if !found {
            return None;
        }

        // Reconstruct jump-point path, then interpolate to get a step-by-step path.
        let mut jp_path = Vec::new();
        let mut ci = goal_idx;
        while ci != usize::MAX {
            jp_path.push(self.point(ci));
            ci = self.nodes[ci].parent;
        }
        jp_path.reverse();

        Some(Self::interpolate_path(&jp_path))
    }

    // -----------------------------------------------------------------------
    // JPS internals
    // -----------------------------------------------------------------------

    /// Whether a single step from `p` along `d` is legal.
    fn can_step(p: Point, d: Point, passable: &impl Fn(Point) -> bool) -> bool {
        if !passable(p + d) {
            return false;
        }
        if d.x != 0 && d.y != 0 {
            return passable(p + Point::new(d.x, 0)) && passable(p + Point::new(0, d.y));
        }
        true
    }

    fn start_dirs(p: Point, passable: &impl Fn(Point) -> bool) -> Vec<Point> {
        DIRS.iter()
            .copied()
            .filter(|&d| Self::can_step(p, d, passable))
            .collect()
    }

    /// Pruned direction set for a node reached from `parent`.
    fn jps_prune_dirs(p: Point, parent: Point, passable: &impl Fn(Point) -> bool) -> Vec<Point> {
        let mut dirs = Vec::with_capacity(5);
        let d = Point::new((p.x - parent.x).signum(), (p.y - parent.y).signum());

        if d.x != 0 && d.y != 0 {
            // Diagonal move: natural neighbours only, forced ones are handled
            // by the straight jumps.
            let vert = passable(p + Point::new(0, d.y));
            let horiz = passable(p + Point::new(d.x, 0));
            if vert {
                dirs.push(Point::new(0, d.y));
            }
            if horiz {
                dirs.push(Point::new(d.x, 0));
            }
            if vert && horiz && passable(p + d) {
                dirs.push(d);
            }
        } else if d.x != 0 {
            // Horizontal
            let next = passable(p + Point::new(d.x, 0));
            let down = passable(p + Point::new(0, 1));
            let up = passable(p + Point::new(0, -1));
            if next {
                dirs.push(Point::new(d.x, 0));
                if down && passable(p + Point::new(d.x, 1)) {
                    dirs.push(Point::new(d.x, 1));
                }
                if up && passable(p + Point::new(d.x, -1)) {
                    dirs.push(Point::new(d.x, -1));
                }
            }
            if down {
                dirs.push(Point::new(0, 1));
            }
            if up {
                dirs.push(Point::new(0, -1));
            }
        } else {
            // Vertical
            let next = passable(p + Point::new(0, d.y));
            let right = passable(p + Point::new(1, 0));
            let left = passable(p + Point::new(-1, 0));
            if next {
                dirs.push(Point::new(0, d.y));
                if right && passable(p + Point::new(1, d.y)) {
                    dirs.push(Point::new(1, d.y));
                }
                if left && passable(p + Point::new(-1, d.y)) {
                    dirs.push(Point::new(-1, d.y));
                }
            }
            if right {
                dirs.push(Point::new(1, 0));
            }
            if left {
                dirs.push(Point::new(-1, 0));
            }
        }
        dirs
    }

    /// Jump along `dir` from `p` until we find a jump point or fail.
    /// The first step must already be legal. Returns `(jump_point, distance)`.
    fn jps_jump(
        p: Point,
        dir: Point,
        goal: Point,
        passable: &impl Fn(Point) -> bool,
    ) -> Option<(Point, i32)> {
        let mut n = p + dir;
        let mut dist = 1;

        loop {
            if !passable(n) {
                return None;
            }
            if n == goal {
                return Some((n, dist));
            }

            if dir.x != 0 && dir.y != 0 {
                // Diagonal: a jump point if either component axis finds one.
                if Self::jps_jump(n, Point::new(dir.x, 0), goal, passable).is_some()
                    || Self::jps_jump(n, Point::new(0, dir.y), goal, passable).is_some()
                {
                    return Some((n, dist));
                }
                if !Self::can_step(n, dir, passable) {
                    return None;
                }
            } else if dir.x != 0 {
                // Horizontal: forced when a wall behind us opens up beside us.
                if (passable(n + Point::new(0, -1)) && !passable(n + Point::new(-dir.x, -1)))
                    || (passable(n + Point::new(0, 1)) && !passable(n + Point::new(-dir.x, 1)))
                {
                    return Some((n, dist));
                }
            } else if (passable(n + Point::new(-1, 0)) && !passable(n + Point::new(-1, -dir.y)))
                || (passable(n + Point::new(1, 0)) && !passable(n + Point::new(1, -dir.y)))
            {
                // Vertical, same rule rotated.
                return Some((n, dist));
            }

            n = n + dir;
            dist += 1;
        }
    }

    /// Expand a jump-point path into a step-by-step path. Consecutive jump
    /// points always lie on a common row, column or diagonal.
    fn interpolate_path(jp_path: &[Point]) -> Vec<Point> {
        let Some(&last) = jp_path.last() else {
            return Vec::new();
        };
        let mut result = Vec::new();
        for window in jp_path.windows(2) {
            let (a, b) = (window[0], window[1]);
            let step = Point::new((b.x - a.x).signum(), (b.y - a.y).signum());
            let mut c = a;
            while c != b {
                result.push(c);
                c = c + step;
            }
        }
        result.push(last);
        result
    }
}

impl GridSearch for PathRange {
    fn search(
        &mut self,
        grid: &[u8],
        width: usize,
        height: usize,
        start: usize,
        goal: usize,
    ) -> Option<Vec<usize>> {
        if width == 0 || grid.len() != width * height || start >= grid.len() || goal >= grid.len()
        {
            log::debug!("grid search: malformed query ({width}x{height}, {} bytes)", grid.len());
            return None;
        }
        let rng = Range::new(0, 0, width as i32, height as i32);
        if self.rng != rng {
            self.set_range(rng);
        }

        let at = |i: usize| Point::new((i % width) as i32, (i / width) as i32);
        let path = self.jps_path(at(start), at(goal), |p| {
            grid[p.y as usize * width + p.x as usize] != 0
        })?;
        Some(
            path.into_iter()
                .map(|p| p.y as usize * width + p.x as usize)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(rows: &[&str]) -> (Vec<u8>, usize, usize) {
        let width = rows[0].len();
        let bytes = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| u8::from(b == b'.')))
            .collect();
        (bytes, width, rows.len())
    }

    fn solve(rows: &[&str], from: Point, to: Point) -> Option<Vec<Point>> {
        let (grid, w, h) = mask(rows);
        let mut pr = PathRange::new(Range::new(0, 0, w as i32, h as i32));
        pr.jps_path(from, to, |p| grid[p.y as usize * w + p.x as usize] == 1)
    }

    fn assert_legal(rows: &[&str], path: &[Point]) {
        let (grid, w, _) = mask(rows);
        let open = |p: Point| grid[p.y as usize * w + p.x as usize] == 1;
        for p in path {
            assert!(open(*p), "path crosses wall at {p}");
        }
        for pair in path.windows(2) {
            let d = pair[1] - pair[0];
            assert_eq!(distance::chebyshev(pair[0], pair[1]), 1, "gap at {}", pair[0]);
            if d.x != 0 && d.y != 0 {
                assert!(open(pair[0] + Point::new(d.x, 0)) && open(pair[0] + Point::new(0, d.y)));
            }
        }
    }

    #[test]
    fn open_grid_goes_diagonal() {
        let rows = [".....", ".....", ".....", ".....", "....."];
        let path = solve(&rows, Point::new(0, 0), Point::new(4, 4)).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], Point::new(0, 0));
        assert_eq!(path[4], Point::new(4, 4));
        assert_legal(&rows, &path);
    }

    #[test]
    fn detours_around_wall() {
        let rows = [".....", "####.", "....."];
        let path = solve(&rows, Point::new(0, 0), Point::new(0, 2)).unwrap();
        assert_legal(&rows, &path);
        assert_eq!(path.first(), Some(&Point::new(0, 0)));
        assert_eq!(path.last(), Some(&Point::new(0, 2)));
        assert_eq!(path.len(), 11);
    }

    #[test]
    fn unreachable_returns_none() {
        let rows = [".....", ".###.", ".#.#.", ".###.", "....."];
        assert!(solve(&rows, Point::new(2, 2), Point::new(0, 0)).is_none());
    }

    #[test]
    fn never_cuts_corners() {
        let rows = [".#", "#."];
        assert!(solve(&rows, Point::new(0, 0), Point::new(1, 1)).is_none());
    }

    #[test]
    fn blocked_endpoints_return_none() {
        let rows = ["..#"];
        assert!(solve(&rows, Point::new(0, 0), Point::new(2, 0)).is_none());
        assert!(solve(&rows, Point::new(2, 0), Point::new(0, 0)).is_none());
    }

    #[test]
    fn same_cell() {
        let rows = ["..."];
        let path = solve(&rows, Point::new(1, 0), Point::new(1, 0)).unwrap();
        assert_eq!(path, vec![Point::new(1, 0)]);
    }

    #[test]
    fn search_contract_uses_flat_indices() {
        let mut pr = PathRange::new(Range::default());
        let grid = [1u8, 1, 1];
        assert_eq!(pr.search(&grid, 3, 1, 0, 2), Some(vec![0, 1, 2]));
        // Range adapts to each query's dimensions.
        assert_eq!(pr.range(), Range::new(0, 0, 3, 1));
    }

    #[test]
    fn search_contract_rejects_bad_input() {
        let mut pr = PathRange::new(Range::default());
        assert_eq!(pr.search(&[1, 1], 3, 1, 0, 1), None);
        assert_eq!(pr.search(&[1, 1, 1], 3, 1, 0, 7), None);
    }

    #[test]
    fn repeated_searches_reuse_state() {
        let rows = [".....", "####.", "....."];
        let (grid, w, h) = mask(&rows);
        let mut pr = PathRange::new(Range::new(0, 0, w as i32, h as i32));
        let first = pr.search(&grid, w, h, 0, 10);
        let second = pr.search(&grid, w, h, 0, 10);
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
