use geo::BoundingRect;
use hexgrid::{overlap_length, planar_length};
use rayon::prelude::*;

use crate::aggregate::{Edge, FeatureCounts};
use crate::grid::HexSet;

/// One edge's share of length per cell.
enum Contribution {
    Malformed,
    Pieces(Vec<(usize, f64)>),
}

/// Apportion the edge's `length_m` to the cells its geometry crosses, in
/// proportion to the planar overlap with each hexagon.
fn apportion(hexes: &HexSet, edge: &Edge) -> Contribution {
    let line = &edge.geometry;
    if line.0.len() < 2
        || line.0.iter().any(|c| !(c.x.is_finite() && c.y.is_finite()))
        || !(edge.length_m.is_finite() && edge.length_m >= 0.0)
    {
        return Contribution::Malformed;
    }

    let planar = planar_length(line);
    let Some(bbox) = line.bounding_rect() else { return Contribution::Malformed };
    if !(planar.is_finite() && planar > 0.0) { return Contribution::Malformed }

    let scale = edge.length_m / planar;
    let mut pieces = hexes.candidates(bbox)
        .filter_map(|i| {
            let overlap = overlap_length(line, hexes.cells()[i].polygon.exterior());
            (overlap > 0.0).then_some((i, overlap * scale))
        })
        .collect::<Vec<_>>();
    pieces.sort_unstable_by_key(|&(i, _)| i);
    Contribution::Pieces(pieces)
}

/// Metres of road per cell (indexed like `hexes.cells()`).
///
/// Edges are overlaid in parallel; the per-edge results are summed in input
/// order so repeated runs produce identical totals.
pub(super) fn apportion_edges(hexes: &HexSet, edges: &[Edge]) -> (Vec<f64>, FeatureCounts) {
    let contributions = edges.par_iter()
        .map(|edge| apportion(hexes, edge))
        .collect::<Vec<_>>();

    let mut metres = vec![0.0; hexes.len()];
    let mut stats = FeatureCounts { total: edges.len(), ..Default::default() };

    for contribution in contributions {
        match contribution {
            Contribution::Malformed => stats.malformed += 1,
            Contribution::Pieces(pieces) if pieces.is_empty() => stats.outside += 1,
            Contribution::Pieces(pieces) => {
                stats.assigned += 1;
                for (i, length) in pieces {
                    metres[i] += length;
                }
            }
        }
    }

    (metres, stats)
}
