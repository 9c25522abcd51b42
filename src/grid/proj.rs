use std::fmt;

use geo::{Coord, LineString, Polygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};
use serde::Serialize;

use crate::error::{EngineError, EngineResult};

const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// Geographic position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Maps planar coordinates of the input CRS back to WGS84 lon/lat.
pub struct Unprojector {
    definition: String,
    from: Proj4,
    to: Proj4,
}

impl fmt::Debug for Unprojector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unprojector").field("definition", &self.definition).finish()
    }
}

impl Unprojector {
    /// `definition` is the PROJ.4 string of the planar CRS the inputs use.
    pub fn new(definition: &str) -> EngineResult<Self> {
        let invalid = |reason: String| EngineError::InvalidProjection {
            proj: definition.to_string(),
            reason,
        };
        let from = Proj4::from_proj_string(definition).map_err(|e| invalid(e.to_string()))?;
        let to = Proj4::from_proj_string(WGS84_LONGLAT).map_err(|e| invalid(e.to_string()))?;
        Ok(Self { definition: definition.to_string(), from, to })
    }

    /// Lon/lat in degrees as a coordinate (`x` = lon, `y` = lat).
    pub fn to_lon_lat(&self, coord: Coord<f64>) -> Option<Coord<f64>> {
        let mut point = (coord.x, coord.y, 0.0);
        transform(&self.from, &self.to, &mut point).ok()?;
        let (lon, lat) = (point.0.to_degrees(), point.1.to_degrees());
        (lon.is_finite() && lat.is_finite()).then_some(Coord { x: lon, y: lat })
    }

    pub fn lat_lon(&self, coord: Coord<f64>) -> Option<LatLon> {
        self.to_lon_lat(coord).map(|c| LatLon { lat: c.y, lon: c.x })
    }

    /// The polygon's exterior in lon/lat; `None` if any vertex fails to map.
    pub fn polygon(&self, polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
        let ring = polygon.exterior().coords()
            .map(|c| self.to_lon_lat(*c))
            .collect::<Option<Vec<_>>>()?;
        Some(Polygon::new(LineString(ring), vec![]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTM_10N: &str = "+proj=utm +zone=10 +datum=WGS84 +units=m +no_defs";

    #[test]
    fn utm_origin_of_zone_maps_to_central_meridian() {
        let unproject = Unprojector::new(UTM_10N).unwrap();
        // False easting 500 km lies on the central meridian of zone 10 (123°W).
        let ll = unproject.lat_lon(Coord { x: 500_000.0, y: 5_270_000.0 }).unwrap();
        assert!((ll.lon + 123.0).abs() < 1e-6, "lon {}", ll.lon);
        assert!(ll.lat > 47.0 && ll.lat < 48.0, "lat {}", ll.lat);
    }

    #[test]
    fn garbage_definition_is_rejected() {
        let err = Unprojector::new("+proj=nonsense").unwrap_err();
        assert!(matches!(err, EngineError::InvalidProjection { .. }));
    }
}
