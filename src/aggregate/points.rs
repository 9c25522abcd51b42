use geo::Coord;

use crate::aggregate::FeatureCounts;
use crate::grid::HexSet;

/// Count points per cell (indexed like `hexes.cells()`).
pub(super) fn count_points(
    hexes: &HexSet,
    points: impl Iterator<Item = Coord<f64>>,
) -> (Vec<u32>, FeatureCounts) {
    let mut counts = vec![0u32; hexes.len()];
    let mut stats = FeatureCounts::default();

    for point in points {
        stats.total += 1;
        if !(point.x.is_finite() && point.y.is_finite()) {
            stats.malformed += 1;
            continue;
        }
        match hexes.locate_position(point) {
            Some(i) => {
                counts[i] += 1;
                stats.assigned += 1;
            }
            None => stats.outside += 1,
        }
    }

    (counts, stats)
}
