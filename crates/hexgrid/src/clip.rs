//! Parametric (Cyrus–Beck) clipping of line geometry against convex rings.

use geo::{Coord, Euclidean, Length, Line, LineString};

#[inline]
fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Of two cells sharing an edge, exactly one owns it: the one traversing it
/// (counter-clockwise) towards +x, or towards +y when vertical.
#[inline]
fn owns_edge(e: Coord<f64>) -> bool {
    e.x > 0.0 || (e.x == 0.0 && e.y > 0.0)
}

/// Twice the signed area of a closed ring (positive for counter-clockwise).
fn signed_area2(ring: &[Coord<f64>]) -> f64 {
    ring.windows(2).map(|w| cross(w[0], w[1])).sum()
}

/// Parameter interval `(t0, t1)`, `0 <= t0 < t1 <= 1`, of the segment `a → b`
/// lying inside the closed convex `ring` (either orientation, boundary
/// inclusive). A segment running exactly along an edge belongs to only one of
/// the two cells sharing that edge. Returns `None` if the segment does not
/// cross the interior.
pub fn clip_segment(a: Coord<f64>, b: Coord<f64>, ring: &[Coord<f64>]) -> Option<(f64, f64)> {
    if ring.len() < 4 { return None }

    let orientation = signed_area2(ring).signum();
    if orientation == 0.0 { return None }

    let d = b - a;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for w in ring.windows(2) {
        let e = w[1] - w[0];
        // Inside iff orientation * cross(e, p - w0) >= 0 along p = a + t·d.
        let base = orientation * cross(e, a - w[0]);
        let slope = orientation * cross(e, d);

        if slope == 0.0 {
            if base < 0.0 { return None }
            if base == 0.0 && !owns_edge(e * orientation) { return None }
            continue;
        }

        let t = -base / slope;
        if slope > 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 >= t1 { return None }
    }

    Some((t0, t1))
}

/// Planar length of `line` (sum of segment lengths).
#[inline]
pub fn planar_length(line: &LineString<f64>) -> f64 {
    Euclidean.length(line)
}

/// Planar length of the part of `line` lying inside the closed convex `ring`.
pub fn overlap_length(line: &LineString<f64>, ring: &LineString<f64>) -> f64 {
    line.0.windows(2)
        .filter_map(|w| {
            let (t0, t1) = clip_segment(w[0], w[1], &ring.0)?;
            Some((t1 - t0) * Euclidean.length(&Line::new(w[0], w[1])))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Coord<f64>> {
        vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 2.0, y: 2.0 },
            Coord { x: 0.0, y: 2.0 },
            Coord { x: 0.0, y: 0.0 },
        ]
    }

    #[test]
    fn segment_inside_is_unclipped() {
        let hit = clip_segment(Coord { x: 0.5, y: 0.5 }, Coord { x: 1.5, y: 1.5 }, &square());
        assert_eq!(hit, Some((0.0, 1.0)));
    }

    #[test]
    fn crossing_segment_is_trimmed() {
        let (t0, t1) = clip_segment(Coord { x: -1.0, y: 1.0 }, Coord { x: 3.0, y: 1.0 }, &square()).unwrap();
        assert!((t0 - 0.25).abs() < 1e-12);
        assert!((t1 - 0.75).abs() < 1e-12);
    }

    #[test]
    fn clockwise_ring_gives_same_answer() {
        let mut cw = square();
        cw.reverse();
        let a = Coord { x: -1.0, y: 1.0 };
        let b = Coord { x: 3.0, y: 1.0 };
        assert_eq!(clip_segment(a, b, &cw), clip_segment(a, b, &square()));
    }

    #[test]
    fn outside_and_touching_segments_miss() {
        assert_eq!(clip_segment(Coord { x: 3.0, y: 0.0 }, Coord { x: 4.0, y: 1.0 }, &square()), None);
        // Touching a single corner has zero length.
        assert_eq!(clip_segment(Coord { x: 2.0, y: 2.0 }, Coord { x: 3.0, y: 3.0 }, &square()), None);
    }

    #[test]
    fn segment_along_shared_edge_counts_once() {
        let right = vec![
            Coord { x: 2.0, y: 0.0 },
            Coord { x: 4.0, y: 0.0 },
            Coord { x: 4.0, y: 2.0 },
            Coord { x: 2.0, y: 2.0 },
            Coord { x: 2.0, y: 0.0 },
        ];
        let (a, b) = (Coord { x: 2.0, y: 0.5 }, Coord { x: 2.0, y: 1.5 });
        let hits = [clip_segment(a, b, &square()), clip_segment(a, b, &right)];
        assert_eq!(hits.iter().filter(|h| h.is_some()).count(), 1);
    }

    #[test]
    fn overlap_of_polyline() {
        let line = LineString::from(vec![(-1.0, 1.0), (1.0, 1.0), (1.0, 5.0)]);
        let ring = LineString(square());
        assert!((overlap_length(&line, &ring) - 2.0).abs() < 1e-12);
        assert!((planar_length(&line) - 6.0).abs() < 1e-12);
    }
}
