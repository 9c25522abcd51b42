use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::aggregate::RawMetricRow;
use crate::config::SignalMode;
use crate::score::stats;
use crate::HexTable;

/// Guards divisions by a near-zero spread.
const EPSILON: f64 = 1e-9;

/// Bound on the magnitude of any z-score.
const Z_CLAMP: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Intersection,
    Road,
    Signal,
}

impl Metric {
    #[inline]
    pub fn of(self, row: &RawMetricRow) -> f64 {
        match self {
            Metric::Intersection => row.intersection_density,
            Metric::Road => row.road_density,
            Metric::Signal => row.signal_density,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Intersection => "intersection_density",
            Metric::Road => "road_density",
            Metric::Signal => "signal_density",
        })
    }
}

/// How a column was scaled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMethod {
    /// `(x − median) / (MAD + ε)`.
    Mad,
    /// `(x − mean) / (std + ε)`, used when the MAD is degenerate.
    StdFallback,
    /// Every value identical: z = 0.
    Constant,
}

/// City-wide statistics of one metric column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ColumnScale {
    pub metric: Metric,
    pub method: ScaleMethod,
    pub center: f64,
    pub scale: f64,
}

impl ColumnScale {
    /// Fit over the finite values of a column.
    pub fn fit(metric: Metric, values: &[f64]) -> Self {
        let finite = values.iter().copied().filter(|x| x.is_finite()).collect::<Vec<_>>();
        let constant = |center| Self { metric, method: ScaleMethod::Constant, center, scale: 0.0 };

        let Some(median) = stats::median(&finite) else { return constant(0.0) };
        let mad = stats::mad(&finite, median).unwrap_or(0.0);
        if mad > EPSILON {
            return Self { metric, method: ScaleMethod::Mad, center: median, scale: mad };
        }

        let mean = stats::mean(&finite).unwrap_or(0.0);
        let std = stats::population_std(&finite, mean).unwrap_or(0.0);
        if std > EPSILON {
            Self { metric, method: ScaleMethod::StdFallback, center: mean, scale: std }
        } else {
            constant(mean)
        }
    }

    /// Clamped z-score; non-finite inputs stay non-finite.
    pub fn z(&self, x: f64) -> f64 {
        match self.method {
            ScaleMethod::Constant if x.is_finite() => 0.0,
            ScaleMethod::Constant => f64::NAN,
            _ => ((x - self.center) / (self.scale + EPSILON)).clamp(-Z_CLAMP, Z_CLAMP),
        }
    }
}

/// Per-hex z-scores. `z_signal` is `None` when the signal metric was
/// dropped city-wide.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NormalizedRow {
    pub z_intersection: f64,
    pub z_road: f64,
    pub z_signal: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct Normalization {
    pub rows: HexTable<NormalizedRow>,
    /// Scales of the computed columns (signal omitted when dropped).
    pub scales: Vec<ColumnScale>,
    pub signals_used: bool,
    /// Fraction of hexes with a signal density above zero.
    pub signal_coverage: f64,
}

/// Decide whether the signal column takes part in the score.
fn signals_used(mode: SignalMode, coverage: f64, sparsity_threshold: f64) -> bool {
    match mode {
        SignalMode::On => true,
        SignalMode::Off => false,
        SignalMode::Auto => coverage >= sparsity_threshold,
    }
}

/// Robust z-scores for every hex, each column scaled over the whole city.
pub fn normalize(
    rows: &HexTable<RawMetricRow>,
    mode: SignalMode,
    sparsity_threshold: f64,
) -> Normalization {
    let column = |metric: Metric| rows.values().map(|row| metric.of(row)).collect::<Vec<_>>();

    let signal_coverage = match rows.len() {
        0 => 0.0,
        n => rows.values().filter(|row| row.signal_density > 0.0).count() as f64 / n as f64,
    };
    let signals_used = signals_used(mode, signal_coverage, sparsity_threshold);
    info!(
        "[normalize] signal coverage {:.2}% (mode {mode}, threshold {:.2}%): signals {}",
        signal_coverage * 100.0,
        sparsity_threshold * 100.0,
        if signals_used { "used" } else { "dropped" },
    );

    let intersection = ColumnScale::fit(Metric::Intersection, &column(Metric::Intersection));
    let road = ColumnScale::fit(Metric::Road, &column(Metric::Road));
    let signal = signals_used.then(|| ColumnScale::fit(Metric::Signal, &column(Metric::Signal)));

    let scales = [Some(intersection), Some(road), signal].into_iter().flatten().collect::<Vec<_>>();
    for scale in &scales {
        debug!("[normalize] {}: {:?} center={} scale={}", scale.metric, scale.method, scale.center, scale.scale);
    }

    let rows = rows.iter()
        .map(|(id, row)| {
            let normalized = NormalizedRow {
                z_intersection: intersection.z(row.intersection_density),
                z_road: road.z(row.road_density),
                z_signal: signal.map(|s| s.z(row.signal_density)),
            };
            (*id, normalized)
        })
        .collect();

    Normalization { rows, scales, signals_used, signal_coverage }
}
