use ndarray::{Array2, ArrayView2};

use crate::error::{AnalysisError, Result};

/// Level shift subtracted from every luma sample before the transform.
const LEVEL_SHIFT: f64 = 128.0;

/// Orthonormal DCT-II basis matrix for n-point transforms.
pub struct DctBasis {
    n: usize,
    matrix: Array2<f64>,
}

impl DctBasis {
    pub fn new(n: usize) -> Self {
        let mut matrix = Array2::zeros((n, n));

        for i in 0..n {
            for j in 0..n {
                matrix[[i, j]] = if i == 0 {
                    1.0 / (n as f64).sqrt()
                } else {
                    (2.0 / n as f64).sqrt()
                        * (std::f64::consts::PI * (2.0 * j as f64 + 1.0) * i as f64
                            / (2.0 * n as f64))
                            .cos()
                };
            }
        }

        Self { n, matrix }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// 2D transform via the separable form `C · X · Cᵀ`.
    pub fn forward(&self, block: ArrayView2<f64>) -> Array2<f64> {
        self.matrix.dot(&block).dot(&self.matrix.t())
    }

    /// 2D inverse transform, `Cᵀ · X · C`.
    pub fn inverse(&self, coeffs: ArrayView2<f64>) -> Array2<f64> {
        self.matrix.t().dot(&coeffs).dot(&self.matrix)
    }
}

/// Per-frequency divisors applied to raw DCT coefficients before rounding.
/// Built once at startup and shared read-only by every block of every image.
#[derive(Debug, Clone)]
pub struct QuantMatrix {
    divisors: Array2<f64>,
}

impl QuantMatrix {
    /// The simplified flat table: every frequency quantized by the same step.
    pub fn constant(n: usize, value: f64) -> Self {
        Self {
            divisors: Array2::from_elem((n, n), value),
        }
    }

    pub fn from_divisors(divisors: Array2<f64>) -> Result<Self> {
        let (rows, cols) = divisors.dim();
        if rows != cols {
            return Err(AnalysisError::InvalidConfig(format!(
                "quantization matrix must be square, got {rows}x{cols}"
            )));
        }
        if divisors.iter().any(|&d| d <= 0.0) {
            return Err(AnalysisError::InvalidConfig(
                "quantization divisors must be strictly positive".into(),
            ));
        }

        Ok(Self { divisors })
    }

    pub fn size(&self) -> usize {
        self.divisors.nrows()
    }

    pub fn divisors(&self) -> &Array2<f64> {
        &self.divisors
    }

    pub fn max_divisor(&self) -> f64 {
        self.divisors.iter().cloned().fold(0.0, f64::max)
    }
}

impl Default for QuantMatrix {
    fn default() -> Self {
        Self::constant(8, 10.0)
    }
}

/// Level-shifts, transforms and quantizes one pixel block into integer
/// DCT coefficients.
pub struct BlockTransform {
    basis: DctBasis,
    quant: QuantMatrix,
}

impl BlockTransform {
    pub fn new(dct_block: usize, quant: QuantMatrix) -> Result<Self> {
        if dct_block == 0 {
            return Err(AnalysisError::InvalidConfig(
                "DCT block size must be non-zero".into(),
            ));
        }
        if quant.size() != dct_block {
            return Err(AnalysisError::InvalidConfig(format!(
                "quantization matrix is {0}x{0}, transform expects {1}x{1}",
                quant.size(),
                dct_block
            )));
        }

        Ok(Self {
            basis: DctBasis::new(dct_block),
            quant,
        })
    }

    pub fn dct_block(&self) -> usize {
        self.basis.n()
    }

    pub fn quant(&self) -> &QuantMatrix {
        &self.quant
    }

    /// Pure function: identical input and float environment give identical
    /// output. Ties round half away from zero (`f64::round`).
    pub fn quantize(&self, block: ArrayView2<f64>) -> Result<Array2<i32>> {
        let n = self.basis.n();
        if block.dim() != (n, n) {
            return Err(AnalysisError::InvalidConfig(format!(
                "block is {}x{}, transform expects {n}x{n}",
                block.nrows(),
                block.ncols()
            )));
        }

        let shifted = block.mapv(|v| v - LEVEL_SHIFT);
        let coeffs = self.basis.forward(shifted.view());
        let quantized = &coeffs / self.quant.divisors();

        Ok(quantized.mapv(|v| v.round() as i32))
    }

    /// Undoes `quantize` up to quantization error: rescale, inverse
    /// transform, restore the level shift.
    pub fn dequantize(&self, coeffs: &Array2<i32>) -> Array2<f64> {
        let rescaled = coeffs.mapv(|v| v as f64) * self.quant.divisors();
        self.basis.inverse(rescaled.view()).mapv(|v| v + LEVEL_SHIFT)
    }
}
