// Integration tests for the planar hexagonal index:
//   point → cell mapping, cell geometry, tiling, neighbours, hierarchy.

use geo::{Area, Contains, Coord, Intersects, Point, Rect};
use hexgrid::{HexId, Resolution};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn res(level: u8) -> Resolution { Resolution::new(level).unwrap() }

/// A seeded spread of sample points in a UTM-like coordinate range.
fn sample_points(n: usize) -> Vec<Coord<f64>> {
    let mut rng = StdRng::seed_from_u64(0x2545_f491);
    (0..n)
        .map(|_| Coord {
            x: 500_000.0 + rng.random_range(0.0..20_000.0),
            y: 5_270_000.0 + rng.random_range(0.0..20_000.0),
        })
        .collect()
}

#[test]
fn center_maps_back_to_its_cell() {
    for level in [0, 4, 8, 12, 15] {
        for (q, r) in [(0, 0), (7, -3), (-120, 55), (1000, 1000)] {
            let id = HexId::new(res(level), q, r).unwrap();
            assert_eq!(HexId::from_coord(id.center(), res(level)), Some(id));
        }
    }
}

#[test]
fn every_point_lies_in_its_cell() {
    for point in sample_points(2_000) {
        let id = HexId::from_coord(point, res(8)).unwrap();
        assert!(
            id.boundary().intersects(&Point::from(point)),
            "{id} does not contain {point:?}"
        );
    }
}

#[test]
fn non_finite_points_have_no_cell() {
    assert_eq!(HexId::from_coord(Coord { x: f64::NAN, y: 0.0 }, res(8)), None);
    assert_eq!(HexId::from_coord(Coord { x: 0.0, y: f64::INFINITY }, res(8)), None);
}

#[test]
fn boundary_area_matches_resolution() {
    for level in [0, 8, 15] {
        let id = HexId::new(res(level), 3, -9).unwrap();
        let area = id.boundary().unsigned_area();
        let expected = res(level).cell_area_m2();
        assert!(((area - expected) / expected).abs() < 1e-9, "level {level}: {area} vs {expected}");
    }
}

#[test]
fn boundary_is_closed_counter_clockwise_hexagon() {
    let poly = HexId::new(res(8), -2, 5).unwrap().boundary();
    let ring = &poly.exterior().0;
    assert_eq!(ring.len(), 7);
    assert_eq!(ring.first(), ring.last());
    assert!(poly.signed_area() > 0.0);
}

#[test]
fn neighbours_share_an_edge_exactly() {
    let id = HexId::new(res(8), 10, -4).unwrap();
    let mine = id.boundary().exterior().0.clone();

    let neighbours = id.neighbors().collect::<Vec<_>>();
    assert_eq!(neighbours.len(), 6);

    for other in neighbours {
        assert_eq!(id.grid_distance(other), Some(1));
        let theirs = other.boundary().exterior().0.clone();
        let shared = mine[..6].iter().filter(|v| theirs[..6].contains(v)).count();
        assert_eq!(shared, 2, "{id} and {other} must share exactly two vertices");
    }
}

#[test]
fn neighbour_interiors_do_not_overlap() {
    let id = HexId::new(res(9), 0, 0).unwrap();
    for other in id.neighbors() {
        // Centre of each cell is strictly inside itself and outside the other.
        assert!(id.boundary().contains(&Point::from(id.center())));
        assert!(!other.boundary().intersects(&Point::from(id.center())));
    }
}

#[test]
fn grid_distance_is_symmetric_and_rejects_mixed_resolutions() {
    let a = HexId::new(res(8), 0, 0).unwrap();
    let b = HexId::new(res(8), 3, -1).unwrap();
    assert_eq!(a.grid_distance(b), Some(3));
    assert_eq!(b.grid_distance(a), Some(3));
    assert_eq!(a.grid_distance(HexId::new(res(7), 0, 0).unwrap()), None);
}

#[test]
fn parent_contains_child_centre() {
    for point in sample_points(200) {
        let child = HexId::from_coord(point, res(9)).unwrap();
        let parent = child.parent(res(7)).unwrap();
        assert_eq!(parent.resolution(), res(7));
        assert!(parent.boundary().intersects(&Point::from(child.center())));
        assert_eq!(child.parent(res(9)), Some(child));
        assert_eq!(child.parent(res(10)), None);
    }
}

#[test]
fn covering_includes_every_cell_touching_rect() {
    let rect = Rect::new(Coord { x: 501_000.0, y: 5_271_000.0 }, Coord { x: 504_500.0, y: 5_273_200.0 });
    let cover = HexId::covering(rect, res(8));
    for point in sample_points(2_000).into_iter().filter(|p| rect.intersects(&Point::from(*p))) {
        let id = HexId::from_coord(point, res(8)).unwrap();
        assert!(cover.contains(&id));
    }
    // Corners are covered too.
    for corner in [rect.min(), rect.max()] {
        assert!(cover.contains(&HexId::from_coord(corner, res(8)).unwrap()));
    }
}

#[test]
fn covering_non_finite_rect_is_empty() {
    let rect = Rect::new(Coord { x: f64::NAN, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
    assert!(HexId::covering(rect, res(8)).is_empty());
    assert_eq!(HexId::covering_len(rect, res(8)), None);
}

#[test]
fn covering_len_counts_without_building() {
    let rect = Rect::new(Coord { x: 501_000.0, y: 5_271_000.0 }, Coord { x: 504_500.0, y: 5_273_200.0 });
    for level in [6, 8, 10] {
        assert_eq!(HexId::covering_len(rect, res(level)), Some(HexId::covering(rect, res(level)).len() as u64));
    }
    let continent = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1_000_000.0, y: 1_000_000.0 });
    assert!(HexId::covering_len(continent, res(15)).unwrap() > 1_000_000_000_000);
}
