//! City summary: band distribution, column statistics, extremes, thresholds
//! and a fingerprint of the banding result.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::io::input::InputStats;
use crate::pipeline::{CityOutput, HexRecord};
use crate::score::{stats, Band};

/// Hexes listed at each end of the score ranking.
const EXTREMES: usize = 10;

/// count/mean/std/min/quartiles/max of the finite values, like a dataframe
/// `describe()` (std with n−1).
fn describe(values: impl Iterator<Item = f64>) -> Value {
    let finite = values.filter(|v| v.is_finite()).collect::<Vec<_>>();
    let sorted = stats::sorted(&finite);
    let n = sorted.len();
    let mean = stats::mean(&sorted);
    let std = mean.filter(|_| n > 1).map(|m| {
        (sorted.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    });
    json!({
        "count": n,
        "mean": mean,
        "std": std,
        "min": sorted.first(),
        "25%": stats::quantile_sorted(&sorted, 0.25),
        "50%": stats::quantile_sorted(&sorted, 0.50),
        "75%": stats::quantile_sorted(&sorted, 0.75),
        "max": sorted.last(),
    })
}

fn ranked(records: &[HexRecord], descending: bool) -> Vec<Value> {
    let mut finite = records.iter().filter(|r| r.score.is_finite()).collect::<Vec<_>>();
    finite.sort_by(|a, b| {
        let order = a.score.total_cmp(&b.score);
        if descending { order.reverse() } else { order }
    });
    finite.into_iter()
        .take(EXTREMES)
        .map(|r| json!({
            "hex_id": r.hex_id.to_string(),
            "urbanicity_score_continuous": r.score,
            "urbanicity_band_3_2_1": r.band.code(),
        }))
        .collect()
}

/// SHA-256 over the thresholds, effective weights and every hex's band.
/// Identical runs give identical digests.
pub fn banding_digest(output: &CityOutput) -> String {
    let t = &output.thresholds;
    let mut hasher = Sha256::new();
    for v in [t.t_low, t.t_high].into_iter().chain(t.weights_effective.as_array()) {
        hasher.update(v.to_bits().to_le_bytes());
    }
    hasher.update([t.signals_used as u8]);
    for record in &output.records {
        hasher.update(record.hex_id.raw().to_le_bytes());
        hasher.update([record.band.code()]);
    }
    hex::encode(hasher.finalize())
}

pub fn build_summary(output: &CityOutput, input: Option<&InputStats>) -> Value {
    let records = &output.records;
    let total = records.len();

    let mut counts = Map::new();
    let mut percent = Map::new();
    for band in [Band::Suburban, Band::Urban, Band::VeryUrban] {
        let n = records.iter().filter(|r| r.band == band).count();
        let pct = if total == 0 { 0.0 } else { n as f64 * 100.0 / total as f64 };
        counts.insert(band.code().to_string(), json!(n));
        percent.insert(band.code().to_string(), json!((pct * 10.0).round() / 10.0));
    }

    json!({
        "city": output.city,
        "hex_res": output.resolution.level(),
        "total_hexes": total,
        "band_distribution": { "counts": counts, "percent": percent },
        "metric_stats": {
            "intersection_density_per_km2": describe(records.iter().map(|r| r.raw.intersection_density)),
            "road_density_km_per_km2": describe(records.iter().map(|r| r.raw.road_density)),
            "signal_density_per_km2": describe(records.iter().map(|r| r.raw.signal_density)),
            "urbanicity_score_continuous": describe(records.iter().map(|r| r.score)),
        },
        "top10_by_score": ranked(records, true),
        "bottom10_by_score": ranked(records, false),
        "thresholds": output.thresholds,
        "signal_coverage": output.signal_coverage,
        "normalization": output.scales,
        "aggregation": output.aggregate_stats,
        "input": input,
        "validation": {
            "passed": output.validation.passed(),
            "failed": output.validation.failures().map(|c| c.code).collect::<Vec<_>>(),
        },
        "digest_sha256": banding_digest(output),
    })
}
