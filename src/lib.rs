#![doc = "Urbanicity hex metrics and scoring engine"]
mod aggregate;
mod common;
pub mod config;
mod error;
mod grid;
mod pipeline;
mod score;
mod validate;

pub mod io;

use std::collections::BTreeMap;

pub use hexgrid::{HexId, Resolution};

/// Per-hex values of one stage, iterated in id order.
pub type HexTable<T> = BTreeMap<HexId, T>;

#[doc(inline)]
pub use aggregate::{aggregate, AggregateStats, Aggregation, Edge, FeatureCounts, Node, RawMetricRow};

#[doc(inline)]
pub use config::{EngineConfig, Quantiles, SignalMode, Weights};

#[doc(inline)]
pub use error::{EngineError, EngineResult};

#[doc(inline)]
pub use grid::{build_hex_set, HexCell, HexSet, LatLon, Unprojector};

#[doc(inline)]
pub use pipeline::{run_city, CityInputs, CityOutput, HexRecord, ThresholdSummary};

#[doc(inline)]
pub use score::{
    band, compose, effective_weights, normalize, stats, Band, BandedRow, ColumnScale, Metric,
    NormalizedRow, Normalization, ScaleMethod, ScoredRow, Thresholds,
};

#[doc(inline)]
pub use validate::{validate, CheckResult, ValidationReport};
