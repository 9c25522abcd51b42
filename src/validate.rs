use log::{info, warn};
use serde::Serialize;

use crate::pipeline::{HexRecord, ThresholdSummary};

/// Share of rows that must have a finite score.
const MIN_FINITE_SCORE_SHARE: f64 = 0.99;

/// Share of hexes that must carry intersections and roads.
const MIN_COVERAGE_SHARE: f64 = 0.30;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CheckResult {
    pub code: &'static str,
    pub name: &'static str,
    pub passed: bool,
    pub message: String,
}

impl CheckResult {
    fn new(code: &'static str, name: &'static str, passed: bool, message: String) -> Self {
        Self { code, name, passed, message }
    }
}

/// Outcome of the acceptance checks for one city. Purely informational.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<CheckResult>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool { self.checks.iter().all(|c| c.passed) }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    pub fn get(&self, code: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.code == code)
    }
}

/// Fraction of records satisfying `pred`; 0 for no records.
fn share(records: &[HexRecord], pred: impl Fn(&HexRecord) -> bool) -> f64 {
    match records.len() {
        0 => 0.0,
        n => records.iter().filter(|r| pred(r)).count() as f64 / n as f64,
    }
}

fn non_empty(records: &[HexRecord]) -> CheckResult {
    let n = records.len();
    CheckResult::new("E1.1", "non_empty", n > 0, format!("{n} hexes"))
}

fn no_negative_density(records: &[HexRecord]) -> CheckResult {
    let negative = records.iter()
        .flat_map(|r| [r.raw.intersection_density, r.raw.road_density, r.raw.signal_density])
        .filter(|d| *d < 0.0)
        .count();
    CheckResult::new("E1.2", "no_negative_density", negative == 0, format!("{negative} negative density values"))
}

fn bands_in_range(records: &[HexRecord]) -> CheckResult {
    let bad = records.iter().filter(|r| !(1..=3).contains(&r.band.code())).count();
    CheckResult::new("E1.3", "bands_in_range", bad == 0, format!("{bad} bands outside {{1, 2, 3}}"))
}

fn scores_finite(records: &[HexRecord]) -> CheckResult {
    let finite = share(records, |r| r.score.is_finite());
    CheckResult::new(
        "E1.4",
        "scores_finite",
        finite > MIN_FINITE_SCORE_SHARE,
        format!("{:.2}% of scores finite (need > {:.0}%)", finite * 100.0, MIN_FINITE_SCORE_SHARE * 100.0),
    )
}

fn signal_consistency(records: &[HexRecord], thresholds: &ThresholdSummary) -> CheckResult {
    let present = records.iter().filter(|r| r.normalized.z_signal.is_some()).count();
    let weight = thresholds.weights_effective.signal;

    let (passed, message) = if thresholds.signals_used {
        let passed = records.is_empty() || present > 0;
        (passed, format!("signals used; {present} of {} rows carry z_signal", records.len()))
    } else {
        (
            present == 0 && weight == 0.0,
            format!("signals dropped; {present} rows carry z_signal, effective signal weight {weight}"),
        )
    };
    CheckResult::new("E1.5", "signal_consistency", passed, message)
}

fn coverage(code: &'static str, name: &'static str, records: &[HexRecord], value: impl Fn(&HexRecord) -> f64) -> CheckResult {
    let covered = share(records, |r| value(r) > 0.0);
    CheckResult::new(
        code,
        name,
        covered >= MIN_COVERAGE_SHARE,
        format!("{:.2}% of hexes > 0 (need >= {:.0}%)", covered * 100.0, MIN_COVERAGE_SHARE * 100.0),
    )
}

/// Run every acceptance check. Failures are logged, never raised.
pub fn validate(records: &[HexRecord], thresholds: &ThresholdSummary) -> ValidationReport {
    let report = ValidationReport {
        checks: vec![
            non_empty(records),
            no_negative_density(records),
            bands_in_range(records),
            scores_finite(records),
            signal_consistency(records, thresholds),
            coverage("E1.6", "intersection_coverage", records, |r| r.raw.intersection_density),
            coverage("E1.7", "road_coverage", records, |r| r.raw.road_density),
        ],
    };

    for check in report.failures() {
        warn!("[validate] {} {} failed: {}", check.code, check.name, check.message);
    }
    if report.passed() {
        info!("[validate] all {} checks passed ({} hexes)", report.checks.len(), records.len());
    }
    report
}
