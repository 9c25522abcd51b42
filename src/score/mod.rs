mod band;
mod compose;
mod normalize;
pub mod stats;

pub use band::{band, Band, BandedRow, Thresholds};
pub use compose::{compose, effective_weights, ScoredRow};
pub use normalize::{normalize, ColumnScale, Metric, NormalizedRow, Normalization, ScaleMethod};
