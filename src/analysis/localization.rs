use log::debug;
use ndarray::{Array2, s};
use statrs::statistics::{Data, OrderStatistics};

use crate::analysis::dct::{BlockTransform, QuantMatrix};
use crate::analysis::entropy::smoothed_density_entropy;
use crate::analysis::tiling::BlockTiler;
use crate::error::{AnalysisError, Result};
use crate::image_utils::truncate_to_multiple;

/// Additive smoothing applied to region densities before scoring, so a
/// region whose coefficients collapse into one bin still scores above zero.
const REGION_SMOOTHING: f64 = 1e-8;

/// Region histograms always span [-100, 100] in 201 bins, independent of
/// the extraction-mode bin range.
const REGION_BINS: usize = 201;
const REGION_HALF_RANGE: i32 = 100;

/// Entropy score for one macro-block region, tagged with its top-left
/// coordinate. Scores are produced in row-major tiling order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionScore {
    pub row: usize,
    pub col: usize,
    pub entropy: f64,
}

#[derive(Debug, Clone)]
pub struct LocalizationResult {
    /// Origins of regions scoring strictly below `median - threshold`.
    /// Empty means "no anomaly found", which is a meaningful result.
    pub flagged: Vec<(usize, usize)>,
    pub scores: Vec<RegionScore>,
    pub median_entropy: f64,
}

impl LocalizationResult {
    pub fn is_clean(&self) -> bool {
        self.flagged.is_empty()
    }
}

/// Scores each macro-block by the entropy of its pooled quantized DCT
/// coefficients and flags the ones falling below the image's own median.
///
/// Low entropy within a local region means the coefficients cluster the
/// way a different quantization history would leave them; comparing
/// against the median makes the detector self-calibrating per image.
pub struct RegionAnomalyDetector {
    block_size: usize,
    entropy_threshold: f64,
    transform: BlockTransform,
}

impl RegionAnomalyDetector {
    pub fn new(
        block_size: usize,
        dct_block: usize,
        quant: QuantMatrix,
        entropy_threshold: f64,
    ) -> Result<Self> {
        if dct_block == 0 || block_size % dct_block != 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "DCT block size {dct_block} must evenly divide region size {block_size}"
            )));
        }
        if !entropy_threshold.is_finite() || entropy_threshold < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "entropy threshold must be a non-negative number, got {entropy_threshold}"
            )));
        }

        Ok(Self {
            block_size,
            entropy_threshold,
            transform: BlockTransform::new(dct_block, quant)?,
        })
    }

    pub fn detect(&self, plane: &Array2<f64>) -> Result<LocalizationResult> {
        let plane = truncate_to_multiple(plane, self.block_size)?;
        let (height, width) = plane.dim();
        let regions = BlockTiler::new(height, width, self.block_size);

        let mut scores = Vec::with_capacity(regions.len());
        for (i, j) in regions.origins() {
            let entropy = self.region_entropy(&plane, (i, j))?;
            scores.push(RegionScore {
                row: i,
                col: j,
                entropy,
            });
        }

        let mut data = Data::new(scores.iter().map(|s| s.entropy).collect::<Vec<_>>());
        let median_entropy = data.median();
        let cutoff = median_entropy - self.entropy_threshold;

        let flagged: Vec<(usize, usize)> = scores
            .iter()
            .filter(|s| s.entropy < cutoff)
            .map(|s| (s.row, s.col))
            .collect();

        debug!(
            "{} of {} regions below entropy cutoff {:.4}",
            flagged.len(),
            scores.len(),
            cutoff
        );

        Ok(LocalizationResult {
            flagged,
            scores,
            median_entropy,
        })
    }

    /// Pools the quantized coefficients of every DCT block in the region
    /// into one density histogram and returns its smoothed entropy.
    fn region_entropy(&self, plane: &Array2<f64>, origin: (usize, usize)) -> Result<f64> {
        let n = self.transform.dct_block();
        let sub_blocks = BlockTiler::new(self.block_size, self.block_size, n);

        let mut pooled = Vec::with_capacity(self.block_size * self.block_size);
        for (di, dj) in sub_blocks.origins() {
            let (i, j) = (origin.0 + di, origin.1 + dj);
            let block = plane.slice(s![i..i + n, j..j + n]);
            let coeffs = self.transform.quantize(block)?;
            pooled.extend(coeffs.iter().copied());
        }

        let density = pooled_density(&pooled);
        Ok(smoothed_density_entropy(&density, REGION_SMOOTHING))
    }
}

/// Density histogram over the fixed region range; out-of-range values are
/// dropped. Density divides each count by `total * bin_width`, with
/// `bin_width = 200 / 201`.
fn pooled_density(values: &[i32]) -> Vec<f64> {
    let mut counts = vec![0u32; REGION_BINS];
    let mut total = 0u64;

    for &value in values {
        if (-REGION_HALF_RANGE..=REGION_HALF_RANGE).contains(&value) {
            counts[(value + REGION_HALF_RANGE) as usize] += 1;
            total += 1;
        }
    }

    if total == 0 {
        return vec![0.0; REGION_BINS];
    }

    let bin_width = 2.0 * REGION_HALF_RANGE as f64 / REGION_BINS as f64;
    counts
        .iter()
        .map(|&c| c as f64 / (total as f64 * bin_width))
        .collect()
}
