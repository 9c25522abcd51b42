use log::info;
use serde::Serialize;

use crate::config::Weights;
use crate::error::EngineResult;
use crate::score::NormalizedRow;
use crate::HexTable;

/// Composite score of one hex, with the city-wide weighting decision that
/// produced it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoredRow {
    pub score: f64,
    pub weights_effective: Weights,
    pub signals_used: bool,
}

/// Weights actually applied: the base weights, or with the signal share
/// redistributed when signals are dropped.
pub fn effective_weights(base: Weights, signals_used: bool) -> EngineResult<Weights> {
    base.validate()?;
    if signals_used { Ok(base) } else { base.redistribute_signal() }
}

/// Weighted sum of the available z-scores. A missing signal z while signals
/// are in use yields NaN so the defect is visible downstream.
fn weighted_sum(row: &NormalizedRow, w: &Weights, signals_used: bool) -> f64 {
    let base = w.intersection * row.z_intersection + w.road * row.z_road;
    match (signals_used, row.z_signal) {
        (false, _) => base,
        (true, Some(z)) => base + w.signal * z,
        (true, None) => f64::NAN,
    }
}

/// Score every hex with the effective weights.
pub fn compose(
    rows: &HexTable<NormalizedRow>,
    base_weights: Weights,
    signals_used: bool,
) -> EngineResult<HexTable<ScoredRow>> {
    let weights_effective = effective_weights(base_weights, signals_used)?;
    info!("[compose] effective weights {weights_effective} (signals used: {signals_used})");

    Ok(rows.iter()
        .map(|(id, row)| {
            let score = weighted_sum(row, &weights_effective, signals_used);
            (*id, ScoredRow { score, weights_effective, signals_used })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use hexgrid::{HexId, Resolution};

    use super::*;
    use crate::error::EngineError;

    fn id(q: i32) -> HexId {
        HexId::new(Resolution::new(8).unwrap(), q, 0).unwrap()
    }

    #[test]
    fn all_three_metrics_are_weighted() {
        let rows = HexTable::from([(id(0), NormalizedRow { z_intersection: 1.0, z_road: 2.0, z_signal: Some(-1.0) })]);
        let scored = compose(&rows, Weights::default(), true).unwrap();
        let row = scored[&id(0)];
        assert!((row.score - (0.5 + 0.6 - 0.2)).abs() < 1e-12);
        assert_eq!(row.weights_effective, Weights::default());
    }

    #[test]
    fn dropped_signal_is_absent_not_zero() {
        let rows = HexTable::from([(id(0), NormalizedRow { z_intersection: 1.0, z_road: 1.0, z_signal: None })]);
        let scored = compose(&rows, Weights::default(), false).unwrap();
        let row = scored[&id(0)];
        assert!((row.score - 1.0).abs() < 1e-12);
        assert!((row.weights_effective.sum() - 1.0).abs() < 1e-12);
        assert_eq!(row.weights_effective.signal, 0.0);
        assert!(!row.signals_used);
    }

    #[test]
    fn missing_signal_while_used_is_not_finite() {
        let rows = HexTable::from([(id(0), NormalizedRow { z_intersection: 1.0, z_road: 1.0, z_signal: None })]);
        let scored = compose(&rows, Weights::default(), true).unwrap();
        assert!(scored[&id(0)].score.is_nan());
    }

    #[test]
    fn bad_weights_are_rejected() {
        let rows = HexTable::new();
        let err = compose(&rows, Weights::new(0.6, 0.6, 0.2), true).unwrap_err();
        assert!(matches!(err, EngineError::InvalidWeights(_)));
        let err = compose(&rows, Weights::new(0.0, 0.0, 1.0), false).unwrap_err();
        assert!(matches!(err, EngineError::InvalidWeights(_)));
    }
}
