/// Grid search engine over a flat walkability mask.
///
/// `grid` holds `width * height` bytes in row-major order, non-zero meaning
/// walkable. Indices are row-major cell indices. The returned sequence runs
/// from `start` to `goal`, both included.
pub trait GridSearch {
    /// Find a path from `start` to `goal`, or `None` if there is none.
    fn search(
        &mut self,
        grid: &[u8],
        width: usize,
        height: usize,
        start: usize,
        goal: usize,
    ) -> Option<Vec<usize>>;
}
