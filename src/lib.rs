use std::path::Path;

use image::DynamicImage;

use crate::analysis::dct::BlockTransform;
use crate::analysis::histogram::HistogramAccumulator;
use crate::analysis::localization::RegionAnomalyDetector;
use crate::analysis::tiling::BlockTiler;
use crate::error::Result;

pub mod analysis;
pub mod batch;
pub mod error;
pub mod image_utils;
pub mod report;

pub use crate::analysis::dct::QuantMatrix;
pub use crate::analysis::histogram::{CoefficientHistogram, HistogramStats};
pub use crate::analysis::localization::{LocalizationResult, RegionScore};
pub use crate::batch::{BatchOrchestrator, CancelHandle, ImageResult};
pub use crate::error::AnalysisError;

/// Process-wide analysis parameters, fixed at start and shared read-only
/// by every worker.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Side of the DCT pixel blocks.
    pub dct_block: usize,
    /// Side of the macro-block regions used for localization; must be a
    /// multiple of `dct_block`.
    pub block_size: usize,
    /// Half-width `b` of the extraction histogram range `[-b, b]`.
    pub bin_half_width: i32,
    /// How far below the per-image median a region's entropy must fall to
    /// be flagged.
    pub entropy_threshold: f64,
    pub quant_matrix: QuantMatrix,
    /// Worker pool size for batch runs; 0 means all available cores.
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dct_block: 8,
            block_size: 64,
            bin_half_width: 100,
            entropy_threshold: 0.25,
            quant_matrix: QuantMatrix::default(),
            workers: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dct_block == 0 {
            return Err(AnalysisError::InvalidConfig(
                "DCT block size must be non-zero".into(),
            ));
        }
        if self.block_size == 0 || self.block_size % self.dct_block != 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "region size {} must be a non-zero multiple of the DCT block size {}",
                self.block_size, self.dct_block
            )));
        }
        if self.quant_matrix.size() != self.dct_block {
            return Err(AnalysisError::InvalidConfig(format!(
                "quantization matrix is {0}x{0} but the DCT block size is {1}",
                self.quant_matrix.size(),
                self.dct_block
            )));
        }
        if self.quant_matrix.divisors().iter().any(|&d| d <= 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "quantization divisors must be strictly positive".into(),
            ));
        }
        if self.bin_half_width <= 0 {
            return Err(AnalysisError::InvalidConfig(
                "histogram half-width must be positive".into(),
            ));
        }
        if !self.entropy_threshold.is_finite() || self.entropy_threshold < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "entropy threshold must be a non-negative number, got {}",
                self.entropy_threshold
            )));
        }

        Ok(())
    }
}

/// Per-image entry point: decodes (or accepts) one image and runs either
/// pipeline over it. Holds no state across images.
pub struct ImageAnalyzer {
    original: DynamicImage,
    config: AnalysisConfig,
    source: Option<String>,
}

impl ImageAnalyzer {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = path.as_ref().to_string_lossy().to_string();
        let original = image::open(&path)?;

        Ok(Self {
            original,
            config: AnalysisConfig::default(),
            source: Some(source),
        })
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            original: image,
            config: AnalysisConfig::default(),
            source: None,
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    fn source_name(&self) -> String {
        self.source.clone().unwrap_or_default()
    }

    /// Extraction pipeline: per-frequency histogram of quantized DCT
    /// coefficients over the whole image.
    pub fn coefficient_histogram(&self) -> Result<CoefficientHistogram> {
        let transform = BlockTransform::new(
            self.config.dct_block,
            self.config.quant_matrix.clone(),
        )?;

        let luma = image_utils::luma_plane(&self.original)?;
        let plane = image_utils::truncate_to_multiple(&luma, self.config.dct_block)?;
        let (height, width) = plane.dim();

        let tiler = BlockTiler::new(height, width, self.config.dct_block);
        let mut accumulator =
            HistogramAccumulator::new(self.config.dct_block, self.config.bin_half_width);

        for (_, block) in tiler.blocks(&plane) {
            let coeffs = transform.quantize(block)?;
            accumulator.record(&coeffs);
        }

        Ok(accumulator.finish(self.source_name()))
    }

    /// Localization pipeline: flags macro-block regions whose coefficient
    /// entropy falls below the image's own median.
    pub fn localize(&self) -> Result<LocalizationResult> {
        let detector = RegionAnomalyDetector::new(
            self.config.block_size,
            self.config.dct_block,
            self.config.quant_matrix.clone(),
            self.config.entropy_threshold,
        )?;

        let luma = image_utils::luma_plane(&self.original)?;
        detector.detect(&luma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, GrayImage};

    #[test]
    fn test_all_midgray_image_yields_all_zero_coefficients() {
        // 16x16 plane of 128s decomposes into four blocks whose level-shifted
        // samples are all zero, so every coefficient, DC included, is zero.
        let gray = GrayImage::from_pixel(16, 16, Luma([128]));
        let analyzer = ImageAnalyzer::from_image(DynamicImage::ImageLuma8(gray));

        let histogram = analyzer.coefficient_histogram().unwrap();
        for row in 0..64 {
            assert_eq!(histogram.count(row, 0), 4);
            assert_eq!(histogram.frequency_row(row).sum(), 4);
        }

        let stats = histogram.stats();
        assert_eq!(stats.non_zero_bins, 64);
        assert!((stats.entropy - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_indivisible_block_sizes_rejected() {
        let config = AnalysisConfig {
            dct_block: 8,
            block_size: 100,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quant_shape_mismatch_rejected() {
        let config = AnalysisConfig {
            quant_matrix: QuantMatrix::constant(4, 10.0),
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
