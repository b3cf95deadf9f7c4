//! Sliding-window power forecaster.
//!
//! Features per sample are `[tick, total_load, trend]`, where trend is the
//! first difference of total load between consecutive samples. The model is
//! refit from scratch on the whole window every time a sample arrives once
//! `min_samples` have been seen.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, trace, warn};

use greengrid_core::config::ForecastConfig;

use crate::forest::{Features, ForestParams, RegressionForest};

/// One training sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: Features,
    /// Observed fleet power in watts.
    pub power_w: f64,
}

/// Online power forecaster with anomaly detection.
#[derive(Debug)]
pub struct Forecaster {
    window: VecDeque<Sample>,
    capacity: usize,
    min_samples: usize,
    tolerance: f64,
    params: ForestParams,
    /// Total load of the most recent sample, used to derive trend.
    last_observed_load: f64,
    /// Latched once the window first reaches `min_samples`.
    ready: bool,
    model: Option<RegressionForest>,
    rng: StdRng,
}

impl Forecaster {
    /// Create an empty forecaster. `seed` drives bootstrap resampling.
    pub fn new(config: &ForecastConfig, seed: u64) -> Self {
        Self {
            window: VecDeque::with_capacity(config.window_size),
            capacity: config.window_size.max(1),
            min_samples: config.min_samples.max(1),
            tolerance: config.anomaly_tolerance,
            params: ForestParams {
                trees: config.trees,
                max_depth: config.max_depth,
                ..ForestParams::default()
            },
            last_observed_load: 0.0,
            ready: false,
            model: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn window_capacity(&self) -> usize {
        self.capacity
    }

    pub fn last_observed_load(&self) -> f64 {
        self.last_observed_load
    }

    /// Observed power values in the window, oldest first.
    pub fn power_history(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().map(|s| s.power_w)
    }

    /// Ingest one tick's observation and refit once enough samples exist.
    pub fn add_data(&mut self, tick: u64, total_load: f64, actual_power_w: f64) {
        let trend = total_load - self.last_observed_load;
        self.last_observed_load = total_load;

        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(Sample {
            features: [tick as f64, total_load, trend],
            power_w: actual_power_w,
        });

        if self.window.len() >= self.min_samples {
            self.retrain();
            if !self.ready {
                self.ready = true;
                info!(samples = self.window.len(), "forecaster ready");
            }
        }
    }

    /// Refit the model on the current window.
    ///
    /// A failed fit is logged and the previous model stays in place.
    pub fn retrain(&mut self) {
        let (x, y): (Vec<Features>, Vec<f64>) =
            self.window.iter().map(|s| (s.features, s.power_w)).unzip();

        match RegressionForest::fit(&x, &y, &self.params, &mut self.rng) {
            Ok(model) => {
                trace!(samples = x.len(), trees = model.tree_count(), "forecast model retrained");
                self.model = Some(model);
            }
            Err(e) => {
                warn!(error = %e, samples = x.len(), "forecast retrain failed, keeping previous model");
            }
        }
    }

    /// Predict fleet power at `next_tick`, assuming the latest trend holds.
    ///
    /// Returns 0.0 before the forecaster is ready or when prediction fails.
    pub fn predict_next(&self, next_tick: u64, current_total_load: f64) -> f64 {
        if !self.ready {
            return 0.0;
        }
        let Some(model) = &self.model else {
            return 0.0;
        };

        let trend = current_total_load - self.last_observed_load;
        let estimated_load = current_total_load + trend;

        match model.predict(&[next_tick as f64, estimated_load, trend]) {
            Ok(watts) if watts.is_finite() => watts,
            Ok(_) => 0.0,
            Err(e) => {
                trace!(error = %e, "forecast prediction failed");
                0.0
            }
        }
    }

    /// Whether `actual_w` deviates from `predicted_w` by at least the
    /// configured relative tolerance. A zero prediction is never anomalous.
    pub fn is_anomaly(&self, actual_w: f64, predicted_w: f64) -> bool {
        if predicted_w == 0.0 || !predicted_w.is_finite() {
            return false;
        }
        (actual_w - predicted_w).abs() >= self.tolerance * predicted_w.abs()
    }
}
