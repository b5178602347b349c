use ndarray::{Array2, ArrayView2, s};

/// Row-major tiling of a plane into non-overlapping `tile`x`tile` blocks.
/// Trailing rows/columns shorter than `tile` are never visited.
#[derive(Debug, Clone, Copy)]
pub struct BlockTiler {
    tile: usize,
    rows: usize,
    cols: usize,
}

impl BlockTiler {
    pub fn new(height: usize, width: usize, tile: usize) -> Self {
        Self {
            tile,
            rows: height / tile,
            cols: width / tile,
        }
    }

    pub fn tile(&self) -> usize {
        self.tile
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-left block origins in row-major order (top-to-bottom,
    /// left-to-right). Callers rely on this order for spatial annotation.
    /// Each call starts a fresh walk.
    pub fn origins(&self) -> impl Iterator<Item = (usize, usize)> {
        let tile = self.tile;
        let cols = self.cols;

        (0..self.rows).flat_map(move |r| (0..cols).map(move |c| (r * tile, c * tile)))
    }

    pub fn block<'a>(
        &self,
        plane: &'a Array2<f64>,
        origin: (usize, usize),
    ) -> ArrayView2<'a, f64> {
        let (i, j) = origin;
        plane.slice(s![i..i + self.tile, j..j + self.tile])
    }

    pub fn blocks<'a>(
        &self,
        plane: &'a Array2<f64>,
    ) -> impl Iterator<Item = ((usize, usize), ArrayView2<'a, f64>)> {
        let tiler = *self;
        self.origins()
            .map(move |origin| (origin, tiler.block(plane, origin)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discards_partial_tiles() {
        let tiler = BlockTiler::new(17, 30, 8);
        assert_eq!(tiler.len(), 2 * 3);
        let last = tiler.origins().last().unwrap();
        assert_eq!(last, (8, 16));
    }

    #[test]
    fn test_row_major_order() {
        let tiler = BlockTiler::new(16, 16, 8);
        let origins: Vec<_> = tiler.origins().collect();
        assert_eq!(origins, vec![(0, 0), (0, 8), (8, 0), (8, 8)]);
    }

    #[test]
    fn test_restartable() {
        let tiler = BlockTiler::new(16, 16, 8);
        let first: Vec<_> = tiler.origins().collect();
        let second: Vec<_> = tiler.origins().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_smaller_than_tile_is_empty() {
        let tiler = BlockTiler::new(7, 100, 8);
        assert!(tiler.is_empty());
        assert_eq!(tiler.origins().count(), 0);
    }

    #[test]
    fn test_block_view_contents() {
        let mut plane = Array2::<f64>::zeros((16, 16));
        plane[[8, 8]] = 42.0;
        let tiler = BlockTiler::new(16, 16, 8);
        let block = tiler.block(&plane, (8, 8));
        assert_eq!(block[[0, 0]], 42.0);
    }
}
