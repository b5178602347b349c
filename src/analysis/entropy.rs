/// Base-2 Shannon entropy of a non-negative count (or density) vector.
///
/// A zero-mass input has entropy exactly 0 rather than being an error;
/// zero bins contribute nothing, per the `0 * log 0 = 0` convention.
pub fn shannon_entropy(counts: impl IntoIterator<Item = f64>) -> f64 {
    let counts: Vec<f64> = counts.into_iter().collect();
    let total: f64 = counts.iter().sum();

    if total <= 0.0 {
        return 0.0;
    }

    counts
        .iter()
        .filter(|&&c| c > 0.0)
        .map(|&c| {
            let p = c / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy after adding `smoothing` to every bin, then normalizing.
///
/// Used for per-region scores so a near-empty region keeps a measurable
/// value instead of collapsing to zero. Whole-image statistics are
/// deliberately left unsmoothed.
pub fn smoothed_density_entropy(densities: &[f64], smoothing: f64) -> f64 {
    shannon_entropy(densities.iter().map(|&d| d + smoothing))
}

/// Number of strictly positive bins, the sparsity measure reported next to
/// whole-image entropy.
pub fn non_zero_bins<'a>(counts: impl IntoIterator<Item = &'a u32>) -> usize {
    counts.into_iter().filter(|&&c| c > 0).count()
}
