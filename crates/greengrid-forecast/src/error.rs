//! Forecast error types.

use thiserror::Error;

/// Errors raised while fitting or querying a regression model.
#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    #[error("cannot fit a model without samples")]
    EmptyTrainingSet,

    #[error("training sample {0} has a non-finite feature or label")]
    NonFiniteSample(usize),

    #[error("prediction input is not finite")]
    NonFiniteInput,
}

pub type ForecastResult<T> = Result<T, ForecastError>;
