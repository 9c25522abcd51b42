use anyhow::{Context, Result};
use geo::Polygon;
use serde_json::{json, Value};

use crate::io::table::FIELD_SEMANTICS;
use crate::pipeline::{CityOutput, HexRecord};

fn polygon_coords(polygon: &Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}

fn properties(output: &CityOutput, record: &HexRecord) -> Value {
    json!({
        "city": output.city,
        "hex_res": output.resolution.level(),
        "hex_id": record.hex_id.to_string(),
        "hex_centroid_lat": record.lat_lon.map(|ll| ll.lat),
        "hex_centroid_lon": record.lat_lon.map(|ll| ll.lon),
        "hex_area_km2": record.area_km2,
        "intersection_density_per_km2": record.raw.intersection_density,
        "road_density_km_per_km2": record.raw.road_density,
        "signal_density_per_km2": record.raw.signal_density,
        "z_intersection_density": record.normalized.z_intersection,
        "z_road_density": record.normalized.z_road,
        "z_signal_density": record.normalized.z_signal,
        "urbanicity_score_continuous": record.score,
        "urbanicity_band_3_2_1": record.band.code(),
        "t_low": output.thresholds.t_low,
        "t_high": output.thresholds.t_high,
        "field_semantics": FIELD_SEMANTICS,
    })
}

/// FeatureCollection of hex polygons. Uses lon/lat polygons when a
/// projection was configured, planar coordinates otherwise. Non-finite
/// numbers become `null`.
pub fn hexes_to_geojson(output: &CityOutput) -> Value {
    let features = output.records.iter()
        .filter_map(|record| {
            let cell = output.hexes.get(record.hex_id)?;
            let polygon = cell.geographic.as_ref().unwrap_or(&cell.polygon);
            Some(json!({
                "type": "Feature",
                "id": record.hex_id.to_string(),
                "geometry": {
                    "type": "Polygon",
                    "coordinates": polygon_coords(polygon),
                },
                "properties": properties(output, record),
            }))
        })
        .collect::<Vec<_>>();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

pub fn hexes_to_geojson_bytes(output: &CityOutput) -> Result<Vec<u8>> {
    serde_json::to_vec(&hexes_to_geojson(output)).context("Failed to serialize GeoJSON to bytes")
}
