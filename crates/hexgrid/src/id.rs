use std::{fmt, str::FromStr};

use crate::resolution::Resolution;

const RES_SHIFT: u32 = 60;
const Q_SHIFT: u32 = 30;
const AXIS_BITS: u32 = 30;
const AXIS_MASK: u64 = (1 << AXIS_BITS) - 1;

/// Axial coordinates must satisfy `-AXIS_LIMIT <= v < AXIS_LIMIT` to be encodable.
pub(crate) const AXIS_LIMIT: i32 = 1 << (AXIS_BITS - 1);

/// Stable identifier of one hexagonal cell at one resolution.
///
/// Layout (most significant first): 4 bits resolution, 30 bits zigzag-encoded
/// axial `q`, 30 bits zigzag-encoded axial `r`. The text form is 16 lowercase
/// hex digits, so lexicographic order of the strings matches numeric order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexId(u64);

#[inline]
fn zigzag(v: i32) -> u64 {
    ((v << 1) ^ (v >> 31)) as u32 as u64
}

#[inline]
fn unzigzag(u: u64) -> i32 {
    let u = u as u32;
    ((u >> 1) as i32) ^ -((u & 1) as i32)
}

impl HexId {
    /// Build an id from axial coordinates; `None` if they are not encodable.
    pub fn new(res: Resolution, q: i32, r: i32) -> Option<Self> {
        let range = -AXIS_LIMIT..AXIS_LIMIT;
        if !range.contains(&q) || !range.contains(&r) { return None }

        Some(Self(
            (res.level() as u64) << RES_SHIFT
                | zigzag(q) << Q_SHIFT
                | zigzag(r)
        ))
    }

    /// Reinterpret a raw 64-bit value.
    pub fn from_raw(raw: u64) -> Option<Self> {
        Resolution::new((raw >> RES_SHIFT) as u8).map(|_| Self(raw))
    }

    #[inline] pub fn raw(self) -> u64 { self.0 }

    #[inline]
    pub fn resolution(self) -> Resolution {
        // Every 4-bit nibble is a valid level.
        Resolution::new((self.0 >> RES_SHIFT) as u8).unwrap_or_else(|| unreachable!())
    }

    /// Axial `(q, r)` coordinates of the cell.
    #[inline]
    pub fn axial(self) -> (i32, i32) {
        (unzigzag((self.0 >> Q_SHIFT) & AXIS_MASK), unzigzag(self.0 & AXIS_MASK))
    }
}

impl fmt::Display for HexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Error returned when parsing a malformed cell id string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseHexIdError(pub String);

impl fmt::Display for ParseHexIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex cell id: {:?}", self.0)
    }
}

impl std::error::Error for ParseHexIdError {}

impl FromStr for HexId {
    type Err = ParseHexIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(ParseHexIdError(s.to_string()));
        }
        u64::from_str_radix(s, 16).ok()
            .and_then(Self::from_raw)
            .ok_or_else(|| ParseHexIdError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(level: u8) -> Resolution { Resolution::new(level).unwrap() }

    #[test]
    fn zigzag_roundtrip_extremes() {
        for v in [0, 1, -1, 2, -2, AXIS_LIMIT - 1, -AXIS_LIMIT] {
            assert_eq!(unzigzag(zigzag(v)), v);
            assert!(zigzag(v) <= AXIS_MASK);
        }
    }

    #[test]
    fn axial_and_resolution_survive_packing() {
        let id = HexId::new(res(8), -12345, 678).unwrap();
        assert_eq!(id.axial(), (-12345, 678));
        assert_eq!(id.resolution(), res(8));
    }

    #[test]
    fn rejects_out_of_range_axial() {
        assert!(HexId::new(res(0), AXIS_LIMIT, 0).is_none());
        assert!(HexId::new(res(0), 0, -AXIS_LIMIT - 1).is_none());
    }

    #[test]
    fn text_form_is_fixed_width() {
        let id = HexId::new(res(0), 0, 0).unwrap();
        assert_eq!(id.to_string(), "0000000000000000");
        let id = HexId::new(res(8), 3, -4).unwrap();
        assert_eq!(id.to_string().len(), 16);
        assert!(id.to_string().starts_with('8'));
    }

    #[test]
    fn string_order_matches_numeric_order() {
        let a = HexId::new(res(8), 5, 1).unwrap();
        let b = HexId::new(res(8), -5, 1).unwrap();
        assert_eq!(a.cmp(&b), a.to_string().cmp(&b.to_string()));
    }

    #[test]
    fn parse_roundtrip_and_rejects_garbage() {
        let id = HexId::new(res(12), 99, -7).unwrap();
        assert_eq!(id.to_string().parse::<HexId>(), Ok(id));
        assert!("xyz".parse::<HexId>().is_err());
        assert!("F000000000000000".parse::<HexId>().is_err()); // uppercase
        assert!("00000000000000001".parse::<HexId>().is_err()); // too long
    }
}
