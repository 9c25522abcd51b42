use std::fmt;

use log::{info, warn};
use serde::{Serialize, Serializer};

use crate::config::Quantiles;
use crate::error::EngineResult;
use crate::score::{stats, ScoredRow};
use crate::HexTable;

/// Ordinal urbanicity band. Serialises as its numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
    Suburban = 1,
    Urban = 2,
    VeryUrban = 3,
}

impl Band {
    #[inline] pub fn code(self) -> u8 { self as u8 }

    pub fn label(self) -> &'static str {
        match self {
            Band::Suburban => "Suburban",
            Band::Urban => "Urban",
            Band::VeryUrban => "Very Urban",
        }
    }

    /// `score >= t_high` → 3, `score <= t_low` → 1, otherwise 2. Ties with a
    /// single threshold go to the extreme band. A score matching both can
    /// only occur when the thresholds have collapsed to one value, and stays
    /// in the middle band.
    pub fn classify(score: f64, thresholds: &Thresholds) -> Self {
        match (score >= thresholds.t_high, score <= thresholds.t_low) {
            (true, false) => Band::VeryUrban,
            (false, true) => Band::Suburban,
            _ => Band::Urban,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.label())
    }
}

impl Serialize for Band {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// The two per-city cut points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Thresholds {
    pub t_low: f64,
    pub t_high: f64,
}

impl Thresholds {
    /// Quantiles of the finite scores; both 0 if none is finite.
    pub fn from_scores(scores: impl Iterator<Item = f64>, quantiles: Quantiles) -> EngineResult<Self> {
        quantiles.validate()?;
        let finite = scores.filter(|s| s.is_finite()).collect::<Vec<_>>();
        let sorted = stats::sorted(&finite);
        Ok(Self {
            t_low: stats::quantile_sorted(&sorted, quantiles.low).unwrap_or(0.0),
            t_high: stats::quantile_sorted(&sorted, quantiles.high).unwrap_or(0.0),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BandedRow {
    pub band: Band,
    pub t_low: f64,
    pub t_high: f64,
}

/// Cut the city's score distribution at its quantiles and band every hex.
pub fn band(
    rows: &HexTable<ScoredRow>,
    quantiles: Quantiles,
) -> EngineResult<(HexTable<BandedRow>, Thresholds)> {
    let thresholds = Thresholds::from_scores(rows.values().map(|r| r.score), quantiles)?;
    if thresholds.t_low == thresholds.t_high {
        warn!(
            "[band] degenerate score distribution: t_low == t_high == {}; hexes at that score stay in band 2",
            thresholds.t_low
        );
    }
    info!(
        "[band] q_low={} → t_low={:.6}, q_high={} → t_high={:.6}",
        quantiles.low, thresholds.t_low, quantiles.high, thresholds.t_high
    );

    let banded = rows.iter()
        .map(|(id, row)| {
            let band = Band::classify(row.score, &thresholds);
            (*id, BandedRow { band, t_low: thresholds.t_low, t_high: thresholds.t_high })
        })
        .collect();

    Ok((banded, thresholds))
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: Thresholds = Thresholds { t_low: -1.0, t_high: 1.0 };

    #[test]
    fn ties_favour_extreme_bands() {
        assert_eq!(Band::classify(1.0, &T), Band::VeryUrban);
        assert_eq!(Band::classify(-1.0, &T), Band::Suburban);
        assert_eq!(Band::classify(0.0, &T), Band::Urban);
        assert_eq!(Band::classify(5.0, &T), Band::VeryUrban);
        assert_eq!(Band::classify(-5.0, &T), Band::Suburban);
    }

    #[test]
    fn collapsed_thresholds_keep_strict_sides() {
        let t = Thresholds { t_low: 0.0, t_high: 0.0 };
        assert_eq!(Band::classify(0.0, &t), Band::Urban);
        assert_eq!(Band::classify(0.1, &t), Band::VeryUrban);
        assert_eq!(Band::classify(-0.1, &t), Band::Suburban);
        assert_eq!(Band::classify(f64::NAN, &t), Band::Urban);
    }

    #[test]
    fn non_finite_scores_are_ignored_by_thresholds() {
        let scores = [0.0, 1.0, 2.0, 3.0, f64::NAN, 4.0];
        let t = Thresholds::from_scores(scores.into_iter(), Quantiles { low: 0.25, high: 0.75 }).unwrap();
        assert_eq!(t, Thresholds { t_low: 1.0, t_high: 3.0 });

        let t = Thresholds::from_scores([f64::NAN].into_iter(), Quantiles::default()).unwrap();
        assert_eq!(t, Thresholds { t_low: 0.0, t_high: 0.0 });
    }

    #[test]
    fn band_serialises_as_code() {
        assert_eq!(serde_json::to_string(&Band::VeryUrban).unwrap(), "3");
    }
}
