use std::fmt;

/// Finest supported resolution.
pub const MAX_RESOLUTION: u8 = 15;

/// Edge length of a resolution-0 cell, in metres.
const RES0_EDGE_M: f64 = 1_107_712.591;

/// Each finer level shrinks cell area by this factor (edge by its square root).
const APERTURE: f64 = 7.0;

/// A level of the hexagonal hierarchy, `0..=MAX_RESOLUTION`.
///
/// Level 0 cells are continental in size; every finer level divides cell area
/// by seven. Level 8 has an edge length of roughly 461 m.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution(u8);

impl Resolution {
    /// Returns `None` for levels above `MAX_RESOLUTION`.
    pub fn new(level: u8) -> Option<Self> {
        (level <= MAX_RESOLUTION).then_some(Self(level))
    }

    #[inline] pub fn level(self) -> u8 { self.0 }

    /// Edge length (equal to circumradius) of a cell, in metres.
    #[inline]
    pub fn edge_length_m(self) -> f64 {
        RES0_EDGE_M / APERTURE.sqrt().powi(self.0 as i32)
    }

    /// Area of a cell in m². Every cell at a level has exactly this area.
    #[inline]
    pub fn cell_area_m2(self) -> f64 {
        let edge = self.edge_length_m();
        1.5 * 3f64.sqrt() * edge * edge
    }

    /// The next finer level, if any.
    pub fn finer(self) -> Option<Self> { Self::new(self.0 + 1) }

    /// The next coarser level, if any.
    pub fn coarser(self) -> Option<Self> { self.0.checked_sub(1).map(Self) }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when converting an out-of-range level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidResolution(pub u8);

impl fmt::Display for InvalidResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resolution {} is out of range 0..={MAX_RESOLUTION}", self.0)
    }
}

impl std::error::Error for InvalidResolution {}

impl TryFrom<u8> for Resolution {
    type Error = InvalidResolution;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level).ok_or(InvalidResolution(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_levels_above_max() {
        assert!(Resolution::new(MAX_RESOLUTION).is_some());
        assert!(Resolution::new(MAX_RESOLUTION + 1).is_none());
        assert_eq!(Resolution::try_from(16), Err(InvalidResolution(16)));
    }

    #[test]
    fn area_shrinks_by_aperture() {
        for level in 0..MAX_RESOLUTION {
            let coarse = Resolution::new(level).unwrap();
            let fine = coarse.finer().unwrap();
            let ratio = coarse.cell_area_m2() / fine.cell_area_m2();
            assert!((ratio - 7.0).abs() < 1e-9, "level {level}: ratio {ratio}");
        }
    }

    #[test]
    fn level_eight_edge_is_about_461m() {
        let edge = Resolution::new(8).unwrap().edge_length_m();
        assert!((edge - 461.35).abs() < 0.01, "edge {edge}");
    }

    #[test]
    fn coarser_and_finer_are_inverse() {
        let res = Resolution::new(5).unwrap();
        assert_eq!(res.finer().unwrap().coarser(), Some(res));
        assert_eq!(Resolution::new(0).unwrap().coarser(), None);
        assert_eq!(Resolution::new(MAX_RESOLUTION).unwrap().finer(), None);
    }
}
