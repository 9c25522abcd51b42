mod build;
mod proj;

use ahash::AHashMap;
use geo::{BoundingRect, Coord, Intersects, Point, Polygon, Rect};
use hexgrid::{HexId, Resolution};
use rstar::{RTree, RTreeObject, AABB};

pub use build::build_hex_set;
pub use proj::{LatLon, Unprojector};

/// One cell of a city's hex set. Immutable once built.
#[derive(Clone, Debug)]
pub struct HexCell {
    pub id: HexId,
    /// Hexagon in the planar input CRS.
    pub polygon: Polygon<f64>,
    pub centroid: Coord<f64>,
    /// Centroid in degrees, when a projection is configured.
    pub lat_lon: Option<LatLon>,
    /// Hexagon in lon/lat degrees, when a projection is configured.
    pub geographic: Option<Polygon<f64>>,
    pub area_km2: f64,
}

impl HexCell {
    /// Cell geometry straight from the index.
    pub fn from_id(id: HexId, unprojector: Option<&Unprojector>) -> Self {
        let polygon = id.boundary();
        Self::with_polygon(id, polygon, id.area_m2(), unprojector)
    }

    pub(crate) fn with_polygon(
        id: HexId,
        polygon: Polygon<f64>,
        area_m2: f64,
        unprojector: Option<&Unprojector>,
    ) -> Self {
        let centroid = id.center();
        Self {
            id,
            lat_lon: unprojector.and_then(|u| u.lat_lon(centroid)),
            geographic: unprojector.and_then(|u| u.polygon(&polygon)),
            polygon,
            centroid,
            area_km2: area_m2 / 1e6,
        }
    }
}

/// R-tree entry pointing at a cell by index.
#[derive(Debug, Clone)]
struct CellEnvelope {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for CellEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// The cells of one city at one resolution, sorted by id, with an id
/// lookup and a spatial index. Read-only after construction.
#[derive(Debug)]
pub struct HexSet {
    resolution: Resolution,
    cells: Vec<HexCell>,
    index: AHashMap<HexId, usize>,
    rtree: RTree<CellEnvelope>,
}

impl HexSet {
    /// Cells at other resolutions and repeated ids are discarded.
    pub fn new(resolution: Resolution, mut cells: Vec<HexCell>) -> Self {
        cells.retain(|cell| cell.id.resolution() == resolution);
        cells.sort_by_key(|cell| cell.id);
        cells.dedup_by_key(|cell| cell.id);

        let index = cells.iter().enumerate()
            .map(|(i, cell)| (cell.id, i))
            .collect();

        let rtree = RTree::bulk_load(
            cells.iter().enumerate()
                .filter_map(|(idx, cell)| Some(CellEnvelope { idx, bbox: cell.polygon.bounding_rect()? }))
                .collect()
        );

        Self { resolution, cells, index, rtree }
    }

    /// A set holding exactly `ids` with index geometry.
    pub fn from_ids(resolution: Resolution, ids: impl IntoIterator<Item = HexId>) -> Self {
        Self::new(resolution, ids.into_iter().map(|id| HexCell::from_id(id, None)).collect())
    }

    #[inline] pub fn resolution(&self) -> Resolution { self.resolution }
    #[inline] pub fn len(&self) -> usize { self.cells.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.cells.is_empty() }

    /// Cells in ascending id order.
    #[inline] pub fn cells(&self) -> &[HexCell] { &self.cells }

    #[inline] pub fn ids(&self) -> impl Iterator<Item = HexId> + '_ { self.cells.iter().map(|c| c.id) }

    #[inline] pub fn contains(&self, id: HexId) -> bool { self.index.contains_key(&id) }

    #[inline] pub fn position(&self, id: HexId) -> Option<usize> { self.index.get(&id).copied() }

    #[inline] pub fn get(&self, id: HexId) -> Option<&HexCell> { self.position(id).map(|i| &self.cells[i]) }

    /// Index of the single cell a point belongs to.
    ///
    /// Among cells whose hexagon contains the point (boundary inclusive) the
    /// smallest id wins, so a point on a shared edge or vertex is counted
    /// once. If floating-point rounding leaves the point in no hexagon, the
    /// index mapping decides, provided that cell is in the set.
    pub fn locate_position(&self, coord: Coord<f64>) -> Option<usize> {
        if !(coord.x.is_finite() && coord.y.is_finite()) { return None }

        let point = Point::from(coord);
        let envelope = AABB::from_point([coord.x, coord.y]);
        self.rtree.locate_in_envelope_intersecting(&envelope)
            .filter(|entry| self.cells[entry.idx].polygon.intersects(&point))
            .min_by_key(|entry| self.cells[entry.idx].id)
            .map(|entry| entry.idx)
            .or_else(|| HexId::from_coord(coord, self.resolution).and_then(|id| self.position(id)))
    }

    pub fn locate(&self, coord: Coord<f64>) -> Option<HexId> {
        self.locate_position(coord).map(|i| self.cells[i].id)
    }

    /// Indices of cells whose envelope intersects `rect`.
    pub(crate) fn candidates(&self, rect: Rect<f64>) -> impl Iterator<Item = usize> + '_ {
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        self.rtree.locate_in_envelope_intersecting(&envelope).map(|entry| entry.idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(level: u8) -> Resolution { Resolution::new(level).unwrap() }

    #[test]
    fn set_is_sorted_and_deduplicated() {
        let a = HexId::new(res(8), 5, 0).unwrap();
        let b = HexId::new(res(8), -5, 0).unwrap();
        let stray = HexId::new(res(7), 0, 0).unwrap();
        let set = HexSet::from_ids(res(8), [a, b, a, stray]);
        assert_eq!(set.len(), 2);
        assert!(set.ids().collect::<Vec<_>>().windows(2).all(|w| w[0] < w[1]));
        assert!(!set.contains(stray));
    }

    #[test]
    fn shared_vertex_goes_to_smallest_id() {
        let origin = HexId::new(res(8), 0, 0).unwrap();
        let set = HexSet::from_ids(res(8), std::iter::once(origin).chain(origin.neighbors()));

        // Every vertex of the origin cell is shared with two neighbours.
        for vertex in origin.boundary().exterior().coords().take(6) {
            let owners = set.cells().iter()
                .filter(|c| c.polygon.intersects(&Point::from(*vertex)))
                .map(|c| c.id)
                .collect::<Vec<_>>();
            assert_eq!(owners.len(), 3);
            assert_eq!(set.locate(*vertex), owners.iter().min().copied());
        }
    }

    #[test]
    fn points_outside_the_set_are_unassigned() {
        let set = HexSet::from_ids(res(8), [HexId::new(res(8), 0, 0).unwrap()]);
        assert_eq!(set.locate(Coord { x: 10_000.0, y: 0.0 }), None);
        assert_eq!(set.locate(Coord { x: f64::NAN, y: 0.0 }), None);
        assert!(set.locate(Coord { x: 0.0, y: 0.0 }).is_some());
    }
}
