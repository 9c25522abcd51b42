use geo::{Area, BoundingRect, Coord, Intersects, MultiPolygon, Rect};
use hexgrid::{HexId, Resolution};
use log::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::grid::{HexCell, HexSet, Unprojector};

/// Relative slack allowed above the theoretical cell area.
const AREA_TOLERANCE: f64 = 1e-9;

/// Upper bound on candidate cells enumerated for one boundary.
const MAX_CANDIDATE_CELLS: u64 = 20_000_000;

#[inline]
fn expand(rect: Rect<f64>, by: f64) -> Rect<f64> {
    let pad = Coord { x: by, y: by };
    Rect::new(rect.min() - pad, rect.max() + pad)
}

/// Tile a planar city boundary into hexagons at `res`.
///
/// Candidates come from the boundary's extent grown by `buffer_m`; a cell is
/// kept when its hexagon intersects the un-buffered boundary, so every
/// boundary point lies in some kept cell. Cells with an implausible planar
/// area are dropped with a warning.
pub fn build_hex_set(
    boundary: &MultiPolygon<f64>,
    res: Resolution,
    buffer_m: f64,
    unprojector: Option<&Unprojector>,
) -> EngineResult<HexSet> {
    if !(buffer_m.is_finite() && buffer_m >= 0.0) {
        return Err(EngineError::InvalidConfig(format!("buffer_m must be finite and >= 0, got {buffer_m}")));
    }

    let area = boundary.unsigned_area();
    if !(area.is_finite() && area > 0.0) {
        return Err(EngineError::InvalidBoundary(format!("boundary has no area ({area} m²)")));
    }
    let Some(bbox) = boundary.bounding_rect() else {
        return Err(EngineError::InvalidBoundary("boundary has no coordinates".into()));
    };

    let extent = expand(bbox, buffer_m);
    let count = HexId::covering_len(extent, res)
        .ok_or_else(|| EngineError::InvalidBoundary("boundary has non-finite coordinates".into()))?;
    if count > MAX_CANDIDATE_CELLS {
        return Err(EngineError::InvalidConfig(format!(
            "resolution {res} needs {count} candidate cells for this boundary (limit {MAX_CANDIDATE_CELLS}); use a coarser resolution"
        )));
    }

    let candidates = HexId::covering(extent, res);
    debug!("[grid] {} candidate cells at res {res} for {:.3} km² boundary", candidates.len(), area / 1e6);

    let max_area = res.cell_area_m2() * (1.0 + AREA_TOLERANCE);
    let mut implausible = 0usize;

    let cells = candidates.into_iter()
        .filter_map(|id| {
            let polygon = id.boundary();
            if !polygon.intersects(boundary) { return None }

            let area = polygon.unsigned_area();
            if !(area > 0.0 && area <= max_area) {
                warn!("[grid] dropping cell {id}: area {area} m² outside (0, {max_area}]");
                implausible += 1;
                return None;
            }
            Some(HexCell::with_polygon(id, polygon, area, unprojector))
        })
        .collect::<Vec<_>>();

    if cells.is_empty() {
        warn!("[grid] boundary produced no cells at res {res}");
    }
    info!("[grid] {} cells at res {res} (buffer {buffer_m} m, {implausible} dropped)", cells.len());

    Ok(HexSet::new(res, cells))
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Contains, Point};

    use super::*;

    fn res(level: u8) -> Resolution { Resolution::new(level).unwrap() }

    fn square(side: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: side, y: 0.0), (x: side, y: side), (x: 0.0, y: side), (x: 0.0, y: 0.0),
        ]])
    }

    #[test]
    fn degenerate_boundary_is_rejected() {
        let flat = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)]]);
        assert!(matches!(build_hex_set(&flat, res(8), 300.0, None), Err(EngineError::InvalidBoundary(_))));
        let empty = MultiPolygon::<f64>(vec![]);
        assert!(matches!(build_hex_set(&empty, res(8), 300.0, None), Err(EngineError::InvalidBoundary(_))));
    }

    #[test]
    fn negative_buffer_is_rejected() {
        assert!(matches!(build_hex_set(&square(1000.0), res(8), -1.0, None), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn every_cell_touches_boundary_and_has_valid_area() {
        let boundary = square(5_000.0);
        let set = build_hex_set(&boundary, res(8), 300.0, None).unwrap();
        assert!(!set.is_empty());
        for cell in set.cells() {
            assert!(cell.polygon.intersects(&boundary));
            assert!(cell.area_km2 > 0.0);
            assert!(cell.area_km2 * 1e6 <= res(8).cell_area_m2() * (1.0 + AREA_TOLERANCE));
            assert!(cell.lat_lon.is_none());
        }
    }

    #[test]
    fn interior_centres_are_always_kept() {
        let boundary = square(5_000.0);
        let set = build_hex_set(&boundary, res(8), 0.0, None).unwrap();
        for id in HexId::covering(boundary.bounding_rect().unwrap(), res(8)) {
            if boundary.contains(&Point::from(id.center())) {
                assert!(set.contains(id), "{id} missing");
            }
        }
    }

    #[test]
    fn buffer_does_not_change_the_cells() {
        let boundary = square(3_000.0);
        let bare = build_hex_set(&boundary, res(8), 0.0, None).unwrap();
        let buffered = build_hex_set(&boundary, res(8), 600.0, None).unwrap();
        assert_eq!(bare.ids().collect::<Vec<_>>(), buffered.ids().collect::<Vec<_>>());
    }

    #[test]
    fn boundary_edge_points_are_covered_at_default_buffer() {
        let boundary = square(3_000.0);
        let set = build_hex_set(&boundary, res(8), 300.0, None).unwrap();
        for i in 0..=300 {
            let t = i as f64 * 10.0;
            for p in [(t, 0.0), (3_000.0, t), (t, 3_000.0), (0.0, t)] {
                let p = Coord { x: p.0, y: p.1 };
                assert!(set.locate(p).is_some(), "{p:?} not covered");
            }
        }
    }

    #[test]
    fn too_many_candidates_is_a_config_error() {
        let boundary = square(100_000.0);
        assert!(matches!(build_hex_set(&boundary, res(15), 300.0, None), Err(EngineError::InvalidConfig(_))));
        assert!(build_hex_set(&square(1_000.0), res(11), 300.0, None).is_ok());
    }

    #[test]
    fn building_twice_gives_the_same_set() {
        let boundary = square(4_000.0);
        let a = build_hex_set(&boundary, res(9), 300.0, None).unwrap();
        let b = build_hex_set(&boundary, res(9), 300.0, None).unwrap();
        assert_eq!(a.ids().collect::<Vec<_>>(), b.ids().collect::<Vec<_>>());
    }
}
