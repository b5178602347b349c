use ndarray::{Array2, ArrayView1};

use crate::analysis::entropy;

/// Accumulates per-frequency counts of quantized coefficient values over
/// the blocks of one image.
///
/// Counting is associative and commutative over block order, so partial
/// accumulators built in parallel can be merged without changing the
/// result.
#[derive(Debug, Clone)]
pub struct HistogramAccumulator {
    dct_block: usize,
    bin_half_width: i32,
    counts: Array2<u32>,
}

impl HistogramAccumulator {
    pub fn new(dct_block: usize, bin_half_width: i32) -> Self {
        let frequencies = dct_block * dct_block;
        let bins = 2 * bin_half_width.max(0) as usize + 1;

        Self {
            dct_block,
            bin_half_width,
            counts: Array2::zeros((frequencies, bins)),
        }
    }

    /// Records one quantized block. Frequency position `(u, v)` maps to row
    /// `u * n + v`; values outside `[-b, b]` are dropped, not clamped.
    pub fn record(&mut self, coeffs: &Array2<i32>) {
        let b = self.bin_half_width;

        for u in 0..self.dct_block {
            for v in 0..self.dct_block {
                let value = coeffs[[u, v]];
                if (-b..=b).contains(&value) {
                    self.counts[[u * self.dct_block + v, (value + b) as usize]] += 1;
                }
            }
        }
    }

    /// Folds another accumulator of the same shape into this one.
    pub fn merge(&mut self, other: &HistogramAccumulator) {
        debug_assert_eq!(self.counts.dim(), other.counts.dim());
        self.counts += &other.counts;
    }

    pub fn finish(self, source: impl Into<String>) -> CoefficientHistogram {
        CoefficientHistogram {
            source: source.into(),
            bin_half_width: self.bin_half_width,
            counts: self.counts,
        }
    }
}

/// Whole-image characterization numbers derived from a histogram: the
/// unsmoothed base-2 entropy of the flattened counts and the number of
/// occupied bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramStats {
    pub entropy: f64,
    pub non_zero_bins: usize,
}

/// Per-frequency coefficient-value counts for one image, shape
/// `n² x (2b + 1)`.
#[derive(Debug, Clone)]
pub struct CoefficientHistogram {
    source: String,
    bin_half_width: i32,
    counts: Array2<u32>,
}

impl CoefficientHistogram {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bin_half_width(&self) -> i32 {
        self.bin_half_width
    }

    pub fn counts(&self) -> &Array2<u32> {
        &self.counts
    }

    pub fn frequency_count(&self) -> usize {
        self.counts.nrows()
    }

    /// Counts for one frequency position, indexed by `value + b`.
    pub fn frequency_row(&self, frequency_index: usize) -> ArrayView1<'_, u32> {
        self.counts.row(frequency_index)
    }

    /// Count at a frequency position for one coefficient value; values
    /// outside the bin range were never recorded, so they read as 0.
    pub fn count(&self, frequency_index: usize, value: i32) -> u32 {
        let b = self.bin_half_width;
        if (-b..=b).contains(&value) {
            self.counts[[frequency_index, (value + b) as usize]]
        } else {
            0
        }
    }

    /// Entropy of a single frequency row, unsmoothed.
    pub fn row_entropy(&self, frequency_index: usize) -> f64 {
        entropy::shannon_entropy(self.frequency_row(frequency_index).iter().map(|&c| c as f64))
    }

    pub fn stats(&self) -> HistogramStats {
        HistogramStats {
            entropy: entropy::shannon_entropy(self.counts.iter().map(|&c| c as f64)),
            non_zero_bins: entropy::non_zero_bins(self.counts.iter()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn block_of(value: i32) -> Array2<i32> {
        Array2::from_elem((8, 8), value)
    }

    #[test]
    fn test_shape_is_zero_filled() {
        let histogram = HistogramAccumulator::new(8, 100).finish("empty");
        assert_eq!(histogram.counts().dim(), (64, 201));
        assert!(histogram.counts().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_record_maps_value_to_offset_bin() {
        let mut acc = HistogramAccumulator::new(8, 100);
        acc.record(&block_of(-3));
        let histogram = acc.finish("x");

        for row in 0..64 {
            assert_eq!(histogram.count(row, -3), 1);
            assert_eq!(histogram.frequency_row(row).sum(), 1);
        }
    }

    #[test]
    fn test_out_of_range_values_are_dropped() {
        let mut acc = HistogramAccumulator::new(8, 100);
        acc.record(&block_of(101));
        acc.record(&block_of(-101));
        let histogram = acc.finish("x");
        assert!(histogram.counts().iter().all(|&c| c == 0));
        assert_eq!(histogram.count(0, 101), 0);
    }

    #[test]
    fn test_order_invariance_and_merge() {
        let blocks: Vec<Array2<i32>> = vec![block_of(0), block_of(5), block_of(-100), block_of(5)];

        let mut forward = HistogramAccumulator::new(8, 100);
        for block in &blocks {
            forward.record(block);
        }

        let mut reversed = HistogramAccumulator::new(8, 100);
        for block in blocks.iter().rev() {
            reversed.record(block);
        }

        let mut left = HistogramAccumulator::new(8, 100);
        left.record(&blocks[0]);
        left.record(&blocks[1]);
        let mut right = HistogramAccumulator::new(8, 100);
        right.record(&blocks[2]);
        right.record(&blocks[3]);
        left.merge(&right);

        let forward = forward.finish("a");
        let reversed = reversed.finish("b");
        let merged = left.finish("c");
        assert_eq!(forward.counts(), reversed.counts());
        assert_eq!(forward.counts(), merged.counts());
    }

    #[test]
    fn test_stats_over_known_distribution() {
        let mut acc = HistogramAccumulator::new(8, 100);
        acc.record(&block_of(1));
        acc.record(&block_of(-1));
        let stats = acc.finish("x").stats();

        // Two occupied bins per frequency row, equal mass: 128 bins total,
        // uniform over them.
        assert_eq!(stats.non_zero_bins, 128);
        assert!((stats.entropy - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_histogram_stats_are_zero() {
        let stats = HistogramAccumulator::new(8, 100).finish("x").stats();
        assert_eq!(stats.entropy, 0.0);
        assert_eq!(stats.non_zero_bins, 0);
    }
}
