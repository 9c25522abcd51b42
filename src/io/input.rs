//! Reading a city's planar inputs from GeoJSON.
//!
//! A city directory holds `boundary.geojson` (Polygon/MultiPolygon),
//! `nodes.geojson` (Points with an integer `degree` property),
//! `edges.geojson` (LineString/MultiLineString with optional `length_m`)
//! and optionally `signals.geojson` (Points). Features that cannot be read
//! are skipped and counted.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{Edge, Node};
use crate::pipeline::CityInputs;

pub const BOUNDARY_FILE: &str = "boundary.geojson";
pub const NODES_FILE: &str = "nodes.geojson";
pub const EDGES_FILE: &str = "edges.geojson";
pub const SIGNALS_FILE: &str = "signals.geojson";

static NO_PROPERTIES: Value = Value::Null;

/// Features dropped while reading, per file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InputStats {
    pub nodes_skipped: usize,
    pub edges_skipped: usize,
    pub signals_skipped: usize,
}

/// Read all inputs of one city directory.
pub fn read_city_dir(dir: &Path) -> Result<(CityInputs, InputStats)> {
    if !dir.is_dir() {
        bail!("City directory does not exist: {}", dir.display());
    }

    let boundary = parse_boundary(&read_json(&dir.join(BOUNDARY_FILE))?)
        .with_context(|| format!("Invalid boundary in {}", dir.display()))?;
    let (nodes, nodes_skipped) = parse_nodes(&read_json(&dir.join(NODES_FILE))?);
    let (edges, edges_skipped) = parse_edges(&read_json(&dir.join(EDGES_FILE))?);

    let signals_path = dir.join(SIGNALS_FILE);
    let (signals, signals_skipped) = if signals_path.exists() {
        parse_points(&read_json(&signals_path)?)
    } else {
        debug!("[input] no {} in {}; no signals", SIGNALS_FILE, dir.display());
        (Vec::new(), 0)
    };

    let stats = InputStats { nodes_skipped, edges_skipped, signals_skipped };
    for (name, skipped) in [("nodes", nodes_skipped), ("edges", edges_skipped), ("signals", signals_skipped)] {
        if skipped > 0 {
            warn!("[input] {}: skipped {skipped} unreadable {name} features", dir.display());
        }
    }

    Ok((CityInputs { boundary, nodes, edges, signals }, stats))
}

fn read_json(path: &Path) -> Result<Value> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse GeoJSON {}", path.display()))
}

/// `(geometry, properties)` of every feature. A bare geometry or a single
/// feature counts as a collection of one.
fn features(value: &Value) -> Vec<(&Value, &Value)> {
    match value["type"].as_str() {
        Some("FeatureCollection") => value["features"].as_array()
            .map(|fs| fs.iter().map(|f| (&f["geometry"], &f["properties"])).collect())
            .unwrap_or_default(),
        Some("Feature") => vec![(&value["geometry"], &value["properties"])],
        Some(_) => vec![(value, &NO_PROPERTIES)],
        None => Vec::new(),
    }
}

fn parse_coord(value: &Value) -> Option<Coord<f64>> {
    let xy = value.as_array()?;
    if xy.len() < 2 { return None }
    let (x, y) = (xy[0].as_f64()?, xy[1].as_f64()?);
    (x.is_finite() && y.is_finite()).then_some(Coord { x, y })
}

fn parse_line(value: &Value) -> Option<LineString<f64>> {
    value.as_array()?.iter().map(parse_coord).collect::<Option<Vec<_>>>().map(LineString)
}

/// Rings are closed if the file left them open.
fn parse_polygon(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = value.as_array()?.iter().map(parse_line).collect::<Option<Vec<_>>>()?.into_iter();
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

/// Union (as parts) of every Polygon and MultiPolygon in the file.
pub fn parse_boundary(value: &Value) -> Result<MultiPolygon<f64>> {
    let mut polygons = Vec::new();
    for (geometry, _) in features(value) {
        let coords = &geometry["coordinates"];
        match geometry["type"].as_str() {
            Some("Polygon") => polygons.extend(parse_polygon(coords)),
            Some("MultiPolygon") => polygons.extend(
                coords.as_array().into_iter().flatten().filter_map(parse_polygon)
            ),
            other => debug!("[input] ignoring boundary geometry of type {other:?}"),
        }
    }
    if polygons.is_empty() {
        bail!("no Polygon or MultiPolygon geometry found");
    }
    Ok(MultiPolygon(polygons))
}

/// Points with an integer `degree`; returns the nodes and the skip count.
pub fn parse_nodes(value: &Value) -> (Vec<Node>, usize) {
    let mut skipped = 0;
    let nodes = features(value).into_iter()
        .filter_map(|(geometry, properties)| {
            let node = (geometry["type"].as_str() == Some("Point"))
                .then(|| parse_coord(&geometry["coordinates"]))
                .flatten()
                .zip(properties["degree"].as_u64().and_then(|d| u32::try_from(d).ok()))
                .map(|(point, degree)| Node { point, degree });
            if node.is_none() { skipped += 1 }
            node
        })
        .collect();
    (nodes, skipped)
}

/// Line features. Each part of a MultiLineString becomes its own edge, with
/// `length_m` shared out by planar length. Without `length_m` the planar
/// length is used.
pub fn parse_edges(value: &Value) -> (Vec<Edge>, usize) {
    let mut edges = Vec::new();
    let mut skipped = 0;

    for (geometry, properties) in features(value) {
        let coords = &geometry["coordinates"];
        let parts = match geometry["type"].as_str() {
            Some("LineString") => parse_line(coords).map(|l| vec![l]),
            Some("MultiLineString") => coords.as_array()
                .and_then(|ls| ls.iter().map(parse_line).collect::<Option<Vec<_>>>()),
            _ => None,
        };
        let length_m = match &properties["length_m"] {
            Value::Null => Some(None),
            v => v.as_f64().map(Some),
        };

        let (Some(parts), Some(length_m)) = (parts, length_m) else {
            skipped += 1;
            continue;
        };

        let total = parts.iter().map(hexgrid::planar_length).sum::<f64>();
        for part in parts {
            let edge = match length_m {
                None => Edge::from_geometry(part),
                Some(_) if total <= 0.0 => Edge { geometry: part, length_m: 0.0 },
                Some(length) => {
                    let share = hexgrid::planar_length(&part) / total;
                    Edge { geometry: part, length_m: length * share }
                }
            };
            edges.push(edge);
        }
    }
    (edges, skipped)
}

/// Point (and MultiPoint) features.
pub fn parse_points(value: &Value) -> (Vec<Coord<f64>>, usize) {
    let mut points = Vec::new();
    let mut skipped = 0;

    for (geometry, _) in features(value) {
        let coords = &geometry["coordinates"];
        let parsed = match geometry["type"].as_str() {
            Some("Point") => parse_coord(coords).map(|c| vec![c]),
            Some("MultiPoint") => coords.as_array()
                .and_then(|cs| cs.iter().map(parse_coord).collect::<Option<Vec<_>>>()),
            _ => None,
        };
        match parsed {
            Some(ps) => points.extend(ps),
            None => skipped += 1,
        }
    }
    (points, skipped)
}

#[cfg(test)]
mod tests {
    use geo::Area;
    use serde_json::json;

    use super::*;

    #[test]
    fn boundary_collects_polygons_and_closes_rings() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": {
                    "type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10]]] } },
                { "type": "Feature", "properties": {}, "geometry": {
                    "type": "Point", "coordinates": [5, 5] } },
            ]
        });
        let boundary = parse_boundary(&value).unwrap();
        assert_eq!(boundary.0.len(), 1);
        assert_eq!(boundary.unsigned_area(), 100.0);
        assert!(boundary.0[0].exterior().is_closed());
    }

    #[test]
    fn boundary_without_polygons_is_an_error() {
        assert!(parse_boundary(&json!({ "type": "Point", "coordinates": [0, 0] })).is_err());
    }

    #[test]
    fn nodes_need_point_and_degree() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "degree": 3 }, "geometry": { "type": "Point", "coordinates": [1, 2] } },
                { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [1, 2] } },
                { "type": "Feature", "properties": { "degree": 4 }, "geometry": { "type": "Point", "coordinates": ["x", 2] } },
                { "type": "Feature", "properties": { "degree": -1 }, "geometry": { "type": "Point", "coordinates": [1, 2] } },
            ]
        });
        let (nodes, skipped) = parse_nodes(&value);
        assert_eq!(nodes, vec![Node { point: Coord { x: 1.0, y: 2.0 }, degree: 3 }]);
        assert_eq!(skipped, 3);
    }

    #[test]
    fn edges_default_to_planar_length_and_split_multilines() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": {
                    "type": "LineString", "coordinates": [[0, 0], [3, 4]] } },
                { "type": "Feature", "properties": { "length_m": 30.0 }, "geometry": {
                    "type": "MultiLineString", "coordinates": [[[0, 0], [10, 0]], [[0, 0], [0, 20]]] } },
                { "type": "Feature", "properties": { "length_m": "long" }, "geometry": {
                    "type": "LineString", "coordinates": [[0, 0], [1, 1]] } },
                { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [0, 0] } },
            ]
        });
        let (edges, skipped) = parse_edges(&value);
        assert_eq!(skipped, 2);
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[0].length_m, 5.0);
        assert!((edges[1].length_m - 10.0).abs() < 1e-12);
        assert!((edges[2].length_m - 20.0).abs() < 1e-12);
    }

    #[test]
    fn points_accept_multipoints() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": { "type": "MultiPoint", "coordinates": [[0, 0], [1, 1]] } },
                { "type": "Feature", "properties": {}, "geometry": null },
            ]
        });
        let (points, skipped) = parse_points(&value);
        assert_eq!(points.len(), 2);
        assert_eq!(skipped, 1);
    }
}
