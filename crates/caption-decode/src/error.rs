//! Decode error taxonomy
//!
//! Configuration problems are detected before the first predictor call.
//! Predictor problems abort the loop at the step they occur. A predicted id
//! missing from the vocabulary is not an error: see
//! [`DecodeState::Aborted`](crate::DecodeState::Aborted).

use thiserror::Error;

/// Invalid decode parameters
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("max_length must be greater than zero")]
    ZeroMaxLength,
    #[error("feature vector is empty")]
    EmptyFeatureVector,
    #[error("feature vector has length {actual}, expected {expected}")]
    FeatureDimMismatch { expected: usize, actual: usize },
    #[error("vocabulary is missing the reserved {role} token {token:?}")]
    MissingReservedToken { role: &'static str, token: String },
    #[error("reserved {role} token {token:?} does not survive text normalization")]
    MarkerNotNormalized { role: &'static str, token: String },
}

/// The predictor failed or produced an unusable distribution
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("predictor failed at step {step}")]
    Failed {
        step: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("predictor returned {actual} scores at step {step}, expected at least {expected}")]
    Incomplete {
        step: usize,
        expected: usize,
        actual: usize,
    },
    #[error("predictor returned NaN for id {id} at step {step}")]
    NotANumber { step: usize, id: usize },
}

impl PredictionError {
    /// Zero-based loop iteration at which the predictor failed
    pub fn step(&self) -> usize {
        match self {
            Self::Failed { step, .. }
            | Self::Incomplete { step, .. }
            | Self::NotANumber { step, .. } => *step,
        }
    }
}

/// Errors returned by caption decoding
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid decode configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl DecodeError {
    /// Whether the caller supplied bad input, as opposed to the predictor failing
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
