use geo::{Coord, MultiPolygon};
use hexgrid::{HexId, Resolution};
use log::info;
use serde::Serialize;

use crate::aggregate::{aggregate, AggregateStats, Edge, Node, RawMetricRow};
use crate::config::{EngineConfig, Weights};
use crate::error::EngineResult;
use crate::grid::{build_hex_set, HexSet, LatLon, Unprojector};
use crate::score::{band, compose, effective_weights, normalize, Band, ColumnScale, NormalizedRow};
use crate::validate::{validate, ValidationReport};

/// Planar inputs for one city, already in the projected CRS.
#[derive(Clone, Debug)]
pub struct CityInputs {
    pub boundary: MultiPolygon<f64>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub signals: Vec<Coord<f64>>,
}

/// No boundary and no features.
impl Default for CityInputs {
    fn default() -> Self {
        Self { boundary: MultiPolygon(vec![]), nodes: Vec::new(), edges: Vec::new(), signals: Vec::new() }
    }
}

/// The full output row of one hex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexRecord {
    pub hex_id: HexId,
    pub lat_lon: Option<LatLon>,
    pub area_km2: f64,
    pub raw: RawMetricRow,
    pub normalized: NormalizedRow,
    pub score: f64,
    pub band: Band,
}

/// City-wide decisions shared by every row.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ThresholdSummary {
    pub t_low: f64,
    pub t_high: f64,
    pub signals_used: bool,
    pub weights_effective: Weights,
}

#[derive(Debug)]
pub struct CityOutput {
    pub city: String,
    pub resolution: Resolution,
    pub hexes: HexSet,
    /// One record per hex, in id order.
    pub records: Vec<HexRecord>,
    pub thresholds: ThresholdSummary,
    pub validation: ValidationReport,
    pub aggregate_stats: AggregateStats,
    pub scales: Vec<ColumnScale>,
    pub signal_coverage: f64,
}

/// Run Builder → Aggregator → Normalizer → Composer → Bander → Validator for
/// one city. Configuration and input-contract violations abort the city;
/// validation failures are only reported.
pub fn run_city(city: &str, inputs: &CityInputs, config: &EngineConfig) -> EngineResult<CityOutput> {
    let resolution = config.validate()?;
    let unprojector = config.crs.as_deref().map(Unprojector::new).transpose()?;

    info!("[{city}] step 1: building hex grid (res {resolution}, buffer {} m)", config.buffer_m);
    let hexes = build_hex_set(&inputs.boundary, resolution, config.buffer_m, unprojector.as_ref())?;

    info!(
        "[{city}] step 2: aggregating {} nodes, {} edges, {} signals",
        inputs.nodes.len(), inputs.edges.len(), inputs.signals.len()
    );
    let aggregation = aggregate(
        &hexes,
        &inputs.nodes,
        &inputs.edges,
        &inputs.signals,
        config.min_intersection_degree,
    )?;

    info!("[{city}] step 3: normalizing");
    let normalization = normalize(&aggregation.rows, config.signal_mode, config.signal_sparsity_threshold);

    info!("[{city}] step 4: scoring");
    let scored = compose(&normalization.rows, config.weights, normalization.signals_used)?;
    let weights_effective = effective_weights(config.weights, normalization.signals_used)?;

    info!("[{city}] step 5: banding");
    let (banded, cut) = band(&scored, config.quantiles)?;

    // Every stage's table is keyed by the same ids, so the values line up
    // with the id-sorted cells.
    let records = hexes.cells().iter()
        .zip(aggregation.rows.values())
        .zip(normalization.rows.values())
        .zip(scored.values())
        .zip(banded.values())
        .map(|((((cell, raw), normalized), scored), banded)| HexRecord {
            hex_id: cell.id,
            lat_lon: cell.lat_lon,
            area_km2: cell.area_km2,
            raw: *raw,
            normalized: *normalized,
            score: scored.score,
            band: banded.band,
        })
        .collect::<Vec<_>>();

    let thresholds = ThresholdSummary {
        t_low: cut.t_low,
        t_high: cut.t_high,
        signals_used: normalization.signals_used,
        weights_effective,
    };

    info!("[{city}] step 6: validating");
    let validation = validate(&records, &thresholds);

    info!("[{city}] done: {} hexes", records.len());
    Ok(CityOutput {
        city: city.to_string(),
        resolution,
        hexes,
        records,
        thresholds,
        validation,
        aggregate_stats: aggregation.stats,
        scales: normalization.scales,
        signal_coverage: normalization.signal_coverage,
    })
}
