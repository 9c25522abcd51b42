mod points;
mod roads;

use geo::{Coord, LineString};
use log::{info, warn};
use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::grid::HexSet;
use crate::HexTable;

/// A road-graph node with its degree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub point: Coord<f64>,
    pub degree: u32,
}

/// A road segment with its known total length.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub geometry: LineString<f64>,
    pub length_m: f64,
}

impl Edge {
    /// Edge whose recorded length is its planar length.
    pub fn from_geometry(geometry: LineString<f64>) -> Self {
        let length_m = hexgrid::planar_length(&geometry);
        Self { geometry, length_m }
    }
}

/// Raw per-hex densities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RawMetricRow {
    /// Intersections per km².
    pub intersection_density: f64,
    /// Road km per km².
    pub road_density: f64,
    /// Signal/stop points per km².
    pub signal_density: f64,
}

/// What happened to the features of one collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FeatureCounts {
    pub total: usize,
    pub assigned: usize,
    pub outside: usize,
    pub malformed: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    /// Nodes below the intersection degree threshold.
    pub below_degree: usize,
    pub intersections: FeatureCounts,
    pub edges: FeatureCounts,
    pub signals: FeatureCounts,
}

#[derive(Clone, Debug)]
pub struct Aggregation {
    /// One row for every cell of the hex set.
    pub rows: HexTable<RawMetricRow>,
    pub stats: AggregateStats,
}

/// Aggregate node, edge and signal features into per-hex densities.
///
/// Nodes count as intersections when their degree is at least
/// `min_intersection_degree`. Malformed features are skipped and counted.
pub fn aggregate(
    hexes: &HexSet,
    nodes: &[Node],
    edges: &[Edge],
    signals: &[Coord<f64>],
    min_intersection_degree: u32,
) -> EngineResult<Aggregation> {
    if hexes.is_empty() { return Err(EngineError::EmptyHexSet) }

    let below_degree = nodes.iter().filter(|n| n.degree < min_intersection_degree).count();
    let intersections = nodes.iter()
        .filter(|n| n.degree >= min_intersection_degree)
        .map(|n| n.point);
    let (intersection_counts, intersection_stats) = points::count_points(hexes, intersections);
    let (signal_counts, signal_stats) = points::count_points(hexes, signals.iter().copied());
    let (road_metres, edge_stats) = roads::apportion_edges(hexes, edges);

    let stats = AggregateStats {
        below_degree,
        intersections: intersection_stats,
        edges: edge_stats,
        signals: signal_stats,
    };
    for (name, counts) in [("intersections", stats.intersections), ("edges", stats.edges), ("signals", stats.signals)] {
        if counts.malformed > 0 {
            warn!("[aggregate] skipped {} malformed {name} of {}", counts.malformed, counts.total);
        }
        info!("[aggregate] {name}: {} assigned, {} outside the hex set", counts.assigned, counts.outside);
    }

    let rows = hexes.cells().iter().enumerate()
        .map(|(i, cell)| {
            let row = RawMetricRow {
                intersection_density: intersection_counts[i] as f64 / cell.area_km2,
                road_density: road_metres[i] / 1000.0 / cell.area_km2,
                signal_density: signal_counts[i] as f64 / cell.area_km2,
            };
            (cell.id, row)
        })
        .collect();

    Ok(Aggregation { rows, stats })
}
