use serde::Serialize;

use crate::analysis::histogram::CoefficientHistogram;
use crate::analysis::localization::LocalizationResult;
use crate::batch::ImageResult;

/// Whole-image histogram summary handed to the external reporting side:
/// the characterization numbers plus the full per-frequency counts.
#[derive(Serialize)]
pub struct HistogramReport {
    pub source: String,
    pub entropy: f64,
    pub non_zero_bins: usize,
    pub bin_half_width: i32,
    pub counts: Vec<Vec<u32>>,
}

impl From<&CoefficientHistogram> for HistogramReport {
    fn from(histogram: &CoefficientHistogram) -> Self {
        let stats = histogram.stats();

        Self {
            source: histogram.source().to_string(),
            entropy: stats.entropy,
            non_zero_bins: stats.non_zero_bins,
            bin_half_width: histogram.bin_half_width(),
            counts: histogram
                .counts()
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct RegionReport {
    pub row: usize,
    pub col: usize,
    pub entropy: f64,
}

#[derive(Serialize)]
pub struct LocalizationReport {
    pub clean: bool,
    pub median_entropy: f64,
    pub flagged_regions: Vec<(usize, usize)>,
    pub region_scores: Vec<RegionReport>,
}

impl From<&LocalizationResult> for LocalizationReport {
    fn from(result: &LocalizationResult) -> Self {
        Self {
            clean: result.is_clean(),
            median_entropy: result.median_entropy,
            flagged_regions: result.flagged.clone(),
            region_scores: result
                .scores
                .iter()
                .map(|s| RegionReport {
                    row: s.row,
                    col: s.col,
                    entropy: s.entropy,
                })
                .collect(),
        }
    }
}

/// One batch entry: success carries the analysis section, failure carries
/// the reason.
#[derive(Serialize)]
pub struct ItemReport<R> {
    pub source: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<R>,
}

impl<'a, T, R> From<&'a ImageResult<T>> for ItemReport<R>
where
    R: From<&'a T>,
{
    fn from(result: &'a ImageResult<T>) -> Self {
        match &result.outcome {
            Ok(value) => Self {
                source: result.source.clone(),
                succeeded: true,
                error: None,
                analysis: Some(R::from(value)),
            },
            Err(e) => Self {
                source: result.source.clone(),
                succeeded: false,
                error: Some(e.to_string()),
                analysis: None,
            },
        }
    }
}

#[derive(Serialize)]
pub struct BatchReport<R> {
    pub total: usize,
    pub failed: usize,
    pub items: Vec<ItemReport<R>>,
}

impl<R> BatchReport<R> {
    pub fn new<'a, T>(results: &'a [ImageResult<T>]) -> Self
    where
        R: From<&'a T>,
    {
        let items: Vec<ItemReport<R>> = results.iter().map(ItemReport::from).collect();

        Self {
            total: items.len(),
            failed: items.iter().filter(|i| !i.succeeded).count(),
            items,
        }
    }
}

impl<R: Serialize> BatchReport<R> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
