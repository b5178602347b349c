use image::{DynamicImage, RgbImage};
use ndarray::{Array2, s};

use crate::error::{AnalysisError, Result};

/// ITU-R BT.601 luma weights, the fixed conversion used throughout.
pub fn rgb_to_luma(image: &RgbImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    let mut luma = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        luma[[y as usize, x as usize]] =
            0.299 * pixel[0] as f64 + 0.587 * pixel[1] as f64 + 0.114 * pixel[2] as f64;
    }

    luma
}

pub fn luma_plane(image: &DynamicImage) -> Result<Array2<f64>> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    if width == 0 || height == 0 {
        return Err(AnalysisError::ImageTooSmall(1));
    }

    Ok(rgb_to_luma(&rgb))
}

/// Drops trailing rows/columns so both dimensions are multiples of `tile`.
/// Partial tiles cannot be transformed, so they are discarded rather than padded.
pub fn truncate_to_multiple(plane: &Array2<f64>, tile: usize) -> Result<Array2<f64>> {
    let (height, width) = plane.dim();
    let h = height - height % tile;
    let w = width - width % tile;

    if h == 0 || w == 0 {
        return Err(AnalysisError::ImageTooSmall(tile));
    }

    Ok(plane.slice(s![..h, ..w]).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_luma_weights() {
        let mut image = RgbImage::new(1, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        let luma = rgb_to_luma(&image);
        assert!((luma[[0, 0]] - 0.299 * 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_luma_gray_pixel_is_identity() {
        let mut image = RgbImage::new(1, 1);
        image.put_pixel(0, 0, Rgb([128, 128, 128]));
        let luma = rgb_to_luma(&image);
        assert!((luma[[0, 0]] - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncate_drops_remainder() {
        let plane = Array2::<f64>::zeros((17, 30));
        let truncated = truncate_to_multiple(&plane, 8).unwrap();
        assert_eq!(truncated.dim(), (16, 24));
    }

    #[test]
    fn test_truncate_too_small_fails() {
        let plane = Array2::<f64>::zeros((7, 30));
        assert!(truncate_to_multiple(&plane, 8).is_err());
    }
}
