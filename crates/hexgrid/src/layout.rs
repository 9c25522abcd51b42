//! Planar geometry of the hexagonal lattice.
//!
//! Cells are pointy-top hexagons in axial coordinates anchored at the origin
//! of the projected plane. Every vertex sits on an integer lattice of
//! half-steps, `(hx · i, hy · j)` with `hx = edge·√3/2` and `hy = edge/2`, so
//! a vertex shared by neighbouring cells is computed from the same integers
//! and is bit-identical in both polygons.

use geo::{Coord, LineString, Polygon, Rect};

use crate::id::{AXIS_LIMIT, HexId};
use crate::resolution::Resolution;

const SQRT3: f64 = 1.732_050_807_568_877_2;

/// Axial neighbour offsets, counter-clockwise starting east.
const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Vertex offsets in half-steps, counter-clockwise starting at 30°.
const VERTEX_OFFSETS: [(i64, i64); 6] = [(1, 1), (0, 2), (-1, 1), (-1, -1), (0, -2), (1, -1)];

/// Horizontal and vertical half-step sizes for a resolution.
#[inline]
fn half_steps(res: Resolution) -> (f64, f64) {
    let edge = res.edge_length_m();
    (edge * SQRT3 / 2.0, edge / 2.0)
}

/// Round fractional axial coordinates to the containing cell (cube rounding).
fn cube_round(fq: f64, fr: f64) -> (f64, f64) {
    let fs = -fq - fr;
    let (mut q, mut r, s) = (fq.round(), fr.round(), fs.round());
    let (dq, dr, ds) = ((q - fq).abs(), (r - fr).abs(), (s - fs).abs());
    if dq > dr && dq > ds {
        q = -r - s;
    } else if dr > ds {
        r = -q - s;
    }
    (q, r)
}

/// Axial rows `(r, q_lo, q_hi)` of every cell whose centre is within one
/// circumradius (= edge) of `rect`, the only cells that can touch it.
fn covering_rows(rect: Rect<f64>, res: Resolution) -> Option<impl Iterator<Item = (i64, i64, i64)>> {
    let (min, max) = (rect.min(), rect.max());
    if ![min.x, min.y, max.x, max.y].iter().all(|v| v.is_finite()) { return None }

    let edge = res.edge_length_m();
    let (hx, hy) = half_steps(res);

    let r_lo = ((min.y - edge) / (3.0 * hy)).floor() as i64;
    let r_hi = ((max.y + edge) / (3.0 * hy)).ceil() as i64;

    Some((r_lo..=r_hi).map(move |r| {
        let q_lo = (((min.x - edge) / hx - r as f64) / 2.0).floor() as i64;
        let q_hi = (((max.x + edge) / hx - r as f64) / 2.0).ceil() as i64;
        (r, q_lo, q_hi)
    }))
}

impl HexId {
    /// The cell containing `coord` at `res`, or `None` for non-finite or
    /// unencodable coordinates. Points on a shared edge resolve to one cell
    /// deterministically.
    pub fn from_coord(coord: Coord<f64>, res: Resolution) -> Option<Self> {
        if !(coord.x.is_finite() && coord.y.is_finite()) { return None }

        let edge = res.edge_length_m();
        let fq = (SQRT3 / 3.0 * coord.x - coord.y / 3.0) / edge;
        let fr = (2.0 / 3.0 * coord.y) / edge;
        let (q, r) = cube_round(fq, fr);

        let limit = AXIS_LIMIT as f64;
        if q.abs() >= limit || r.abs() >= limit { return None }
        Self::new(res, q as i32, r as i32)
    }

    /// Planar centre of the cell.
    pub fn center(self) -> Coord<f64> {
        let (hx, hy) = half_steps(self.resolution());
        let (q, r) = self.axial();
        let (q, r) = (q as i64, r as i64);
        Coord { x: hx * (2 * q + r) as f64, y: hy * (3 * r) as f64 }
    }

    /// Closed counter-clockwise hexagon of the cell.
    pub fn boundary(self) -> Polygon<f64> {
        let (hx, hy) = half_steps(self.resolution());
        let (q, r) = self.axial();
        let (q, r) = (q as i64, r as i64);

        let mut ring = VERTEX_OFFSETS.iter()
            .map(|&(dx, dy)| Coord {
                x: hx * (2 * q + r + dx) as f64,
                y: hy * (3 * r + dy) as f64,
            })
            .collect::<Vec<_>>();
        ring.push(ring[0]);

        Polygon::new(LineString(ring), vec![])
    }

    /// Planar area of the cell in m² (identical for every cell at a level).
    #[inline]
    pub fn area_m2(self) -> f64 { self.resolution().cell_area_m2() }

    /// The six adjacent cells at the same resolution (fewer at the encodable edge).
    pub fn neighbors(self) -> impl Iterator<Item = HexId> {
        let res = self.resolution();
        let (q, r) = self.axial();
        DIRECTIONS.into_iter()
            .filter_map(move |(dq, dr)| Self::new(res, q.checked_add(dq)?, r.checked_add(dr)?))
    }

    /// Number of cell steps between two cells, or `None` across resolutions.
    pub fn grid_distance(self, other: HexId) -> Option<u32> {
        if self.resolution() != other.resolution() { return None }
        let (q1, r1) = self.axial();
        let (q2, r2) = other.axial();
        let (dq, dr) = ((q1 as i64 - q2 as i64), (r1 as i64 - r2 as i64));
        Some(((dq.abs() + dr.abs() + (dq + dr).abs()) / 2) as u32)
    }

    /// The cell at the coarser `res` containing this cell's centre.
    /// Returns `None` if `res` is finer than this cell.
    pub fn parent(self, res: Resolution) -> Option<HexId> {
        if res > self.resolution() { return None }
        if res == self.resolution() { return Some(self) }
        Self::from_coord(self.center(), res)
    }

    /// All cells at `res` whose hexagon can touch `rect` (a superset; callers
    /// filter by exact geometry). Empty for non-finite rectangles.
    pub fn covering(rect: Rect<f64>, res: Resolution) -> Vec<HexId> {
        let Some(rows) = covering_rows(rect, res) else { return Vec::new() };

        let mut cells = Vec::new();
        for (r, q_lo, q_hi) in rows {
            for q in q_lo..=q_hi {
                let (Ok(q), Ok(r)) = (i32::try_from(q), i32::try_from(r)) else { continue };
                if let Some(id) = Self::new(res, q, r) {
                    cells.push(id);
                }
            }
        }
        cells
    }

    /// Number of candidates `covering` would enumerate, without building
    /// them. `None` for non-finite rectangles.
    pub fn covering_len(rect: Rect<f64>, res: Resolution) -> Option<u64> {
        let rows = covering_rows(rect, res)?;
        Some(rows.map(|(_, q_lo, q_hi)| (q_hi - q_lo + 1).max(0) as u64).sum())
    }
}
