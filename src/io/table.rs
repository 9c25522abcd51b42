//! Tabular per-hex output (Parquet or CSV) with the published column schema.

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::pipeline::CityOutput;

/// Provenance tag carried by every row.
pub const FIELD_SEMANTICS: &str = "DERIVED_FROM_OSM";

/// Output columns, in order.
pub const COLUMNS: [&str; 17] = [
    "city",
    "hex_res",
    "hex_id",
    "hex_centroid_lat",
    "hex_centroid_lon",
    "hex_area_km2",
    "intersection_density_per_km2",
    "road_density_km_per_km2",
    "signal_density_per_km2",
    "z_intersection_density",
    "z_road_density",
    "z_signal_density",
    "urbanicity_score_continuous",
    "urbanicity_band_3_2_1",
    "t_low",
    "t_high",
    "field_semantics",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Parquet,
    Csv,
}

impl TableFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Parquet => "parquet",
            TableFormat::Csv => "csv",
        }
    }
}

/// One row per hex, in id order.
pub fn records_frame(output: &CityOutput) -> Result<DataFrame> {
    let records = &output.records;
    let n = records.len();
    let t = &output.thresholds;

    let f64_col = |name: &str, get: &dyn Fn(usize) -> f64| -> Column {
        Series::new(name.into(), (0..n).map(get).collect::<Vec<f64>>()).into()
    };
    let opt_col = |name: &str, get: &dyn Fn(usize) -> Option<f64>| -> Column {
        Series::new(name.into(), (0..n).map(get).collect::<Vec<Option<f64>>>()).into()
    };

    let df = DataFrame::new(vec![
        Series::new(COLUMNS[0].into(), vec![output.city.as_str(); n]).into(),
        Series::new(COLUMNS[1].into(), vec![output.resolution.level() as u32; n]).into(),
        Series::new(COLUMNS[2].into(), records.iter().map(|r| r.hex_id.to_string()).collect::<Vec<_>>()).into(),
        opt_col(COLUMNS[3], &|i| records[i].lat_lon.map(|ll| ll.lat)),
        opt_col(COLUMNS[4], &|i| records[i].lat_lon.map(|ll| ll.lon)),
        f64_col(COLUMNS[5], &|i| records[i].area_km2),
        f64_col(COLUMNS[6], &|i| records[i].raw.intersection_density),
        f64_col(COLUMNS[7], &|i| records[i].raw.road_density),
        f64_col(COLUMNS[8], &|i| records[i].raw.signal_density),
        f64_col(COLUMNS[9], &|i| records[i].normalized.z_intersection),
        f64_col(COLUMNS[10], &|i| records[i].normalized.z_road),
        opt_col(COLUMNS[11], &|i| records[i].normalized.z_signal),
        f64_col(COLUMNS[12], &|i| records[i].score),
        Series::new(COLUMNS[13].into(), records.iter().map(|r| r.band.code() as u32).collect::<Vec<_>>()).into(),
        f64_col(COLUMNS[14], &|_| t.t_low),
        f64_col(COLUMNS[15], &|_| t.t_high),
        Series::new(COLUMNS[16].into(), vec![FIELD_SEMANTICS; n]).into(),
    ])?;
    Ok(df)
}

/// Serialise the frame in `format`.
pub fn write_table_bytes(df: &DataFrame, format: TableFormat) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match format {
        TableFormat::Parquet => {
            ParquetWriter::new(&mut out)
                .finish(&mut df.clone())
                .context("[io::table] Failed to write Parquet")?;
        }
        TableFormat::Csv => {
            CsvWriter::new(&mut out)
                .finish(&mut df.clone())
                .context("[io::table] Failed to write CSV")?;
        }
    }
    Ok(out)
}
