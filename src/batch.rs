use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::analysis::histogram::CoefficientHistogram;
use crate::analysis::localization::LocalizationResult;
use crate::error::{AnalysisError, Result};
use crate::{AnalysisConfig, ImageAnalyzer};

/// Cooperative stop flag for a running batch. Cancelling stops images that
/// have not started yet from being picked up; images already in flight run
/// to completion, so no torn result is ever observable.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// One outcome per processed image: the pipeline output or the reason the
/// image failed. A failure here never affects sibling images.
#[derive(Debug)]
pub struct ImageResult<T> {
    /// Position of the image in the input collection.
    pub index: usize,
    pub source: String,
    pub outcome: Result<T>,
}

impl<T> ImageResult<T> {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Fans the per-image pipeline out across a fixed-size worker pool.
///
/// Workers share nothing but the read-only configuration; the only
/// synchronization point is the result vector at the pool boundary.
pub struct BatchOrchestrator {
    config: AnalysisConfig,
    pool: rayon::ThreadPool,
    cancel: CancelHandle,
    preserve_input_order: bool,
}

impl BatchOrchestrator {
    /// Validates the configuration and builds the worker pool. Bad
    /// configuration surfaces here, before any image is touched.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            config,
            pool,
            cancel: CancelHandle::default(),
            preserve_input_order: false,
        })
    }

    /// Results arrive in completion order by default. Enable this to get
    /// them back sorted by input position, for deterministic output.
    pub fn preserve_input_order(mut self, yes: bool) -> Self {
        self.preserve_input_order = yes;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Whole-image histogram extraction for every path.
    pub fn run_extraction<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
    ) -> Vec<ImageResult<CoefficientHistogram>> {
        self.run(paths, |analyzer| analyzer.coefficient_histogram())
    }

    /// Forgery localization for every path.
    pub fn run_localization<P: AsRef<Path> + Sync>(
        &self,
        paths: &[P],
    ) -> Vec<ImageResult<LocalizationResult>> {
        self.run(paths, |analyzer| analyzer.localize())
    }

    fn run<P, T, F>(&self, paths: &[P], task: F) -> Vec<ImageResult<T>>
    where
        P: AsRef<Path> + Sync,
        T: Send,
        F: Fn(&ImageAnalyzer) -> Result<T> + Sync,
    {
        info!(
            "Processing {} images on {} workers",
            paths.len(),
            self.pool.current_num_threads()
        );

        let collected = Mutex::new(Vec::with_capacity(paths.len()));

        self.pool.install(|| {
            paths.par_iter().enumerate().for_each(|(index, path)| {
                if self.cancel.is_cancelled() {
                    debug!("batch cancelled, not starting {:?}", path.as_ref());
                    return;
                }

                let source = path.as_ref().to_string_lossy().to_string();
                let outcome = ImageAnalyzer::new(path.as_ref())
                    .map(|analyzer| analyzer.with_config(self.config.clone()))
                    .and_then(|analyzer| task(&analyzer));

                if let Err(ref e) = outcome {
                    warn!("{source}: {e}");
                }

                collected.lock().push(ImageResult {
                    index,
                    source,
                    outcome,
                });
            });
        });

        let mut results = collected.into_inner();
        if self.preserve_input_order {
            results.sort_by_key(|r| r.index);
        }

        results
    }
}
