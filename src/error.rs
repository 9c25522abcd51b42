use thiserror::Error;

/// Contract violations that abort a city's run.
///
/// Feature-level defects and statistical degeneracies are not errors; they
/// are counted or handled by a defined fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("hex set is empty")]
    EmptyHexSet,

    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    #[error("invalid quantiles: {0}")]
    InvalidQuantiles(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid projection {proj:?}: {reason}")]
    InvalidProjection { proj: String, reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
