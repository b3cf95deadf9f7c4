//! greengrid-forecast — online power forecasting.
//!
//! Keeps a bounded window of `(tick, total_load, trend) → watts` samples and
//! refits a small regression forest on the whole window every time a sample
//! arrives. Predictions extrapolate the latest load trend one tick ahead.
//!
//! # Architecture
//!
//! ```text
//! Forecaster
//!   ├── add_data()      ← one sample per tick, evicts oldest past capacity
//!   ├── retrain()       → RegressionForest::fit() on the window
//!   ├── predict_next()  → naive-trend features → forest prediction
//!   └── is_anomaly()    → relative deviation check
//! ```
//!
//! Training and prediction failures never escape the forecaster: a failed
//! fit keeps the previous model, a failed prediction reads as 0 W.

pub mod error;
pub mod forecaster;
pub mod forest;

pub use error::{ForecastError, ForecastResult};
pub use forecaster::{Forecaster, Sample};
pub use forest::{FEATURE_COUNT, Features, ForestParams, RegressionForest};
