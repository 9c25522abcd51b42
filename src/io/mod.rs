mod geojson;
mod input;
mod summary;
mod table;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::common::write_atomic;
use crate::pipeline::CityOutput;

pub use geojson::{hexes_to_geojson, hexes_to_geojson_bytes};
pub use input::{
    parse_boundary, parse_edges, parse_nodes, parse_points, read_city_dir, InputStats,
    BOUNDARY_FILE, EDGES_FILE, NODES_FILE, SIGNALS_FILE,
};
pub use summary::{banding_digest, build_summary};
pub use table::{records_frame, write_table_bytes, TableFormat, COLUMNS, FIELD_SEMANTICS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputOptions {
    pub format: TableFormat,
    pub geojson: bool,
    pub force: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self { format: TableFormat::Parquet, geojson: true, force: false }
    }
}

/// Filesystem-safe city name: lowercase ASCII alphanumerics, everything else
/// collapsed to single underscores.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Directory a city's files go to: `<out_dir>/<city slug>`.
pub fn city_output_dir(out_dir: &Path, city: &str) -> PathBuf {
    out_dir.join(slugify(city))
}

/// Write the table, optional GeoJSON, `summary.json` and `validation.json`
/// for one city. Every file is written atomically.
pub fn write_city_outputs(
    output: &CityOutput,
    input: Option<&InputStats>,
    out_dir: &Path,
    options: &OutputOptions,
) -> Result<Vec<PathBuf>> {
    let dir = city_output_dir(out_dir, &output.city);

    let stem = format!("hex_urbanicity_res{}", output.resolution.level());
    let mut written = Vec::new();

    let table = write_table_bytes(&records_frame(output)?, options.format)?;
    let path = dir.join(format!("{stem}.{}", options.format.extension()));
    written.push(write_atomic(&path, &table, options.force)?);
    info!("[{}] table written: {} ({} rows)", output.city, path.display(), output.records.len());

    if options.geojson {
        let path = dir.join(format!("{stem}.geojson"));
        written.push(write_atomic(&path, &hexes_to_geojson_bytes(output)?, options.force)?);
        info!("[{}] GeoJSON written: {}", output.city, path.display());
    }

    let summary = serde_json::to_vec_pretty(&build_summary(output, input))
        .context("Failed to serialize summary")?;
    written.push(write_atomic(&dir.join("summary.json"), &summary, options.force)?);

    let validation = serde_json::to_vec_pretty(&output.validation)
        .context("Failed to serialize validation report")?;
    written.push(write_atomic(&dir.join("validation.json"), &validation, options.force)?);

    info!("[{}] outputs written to {}", output.city, dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_filesystem_safe() {
        assert_eq!(slugify("Los Angeles"), "los_angeles");
        assert_eq!(slugify("  St. Louis -- MO "), "st_louis_mo");
        assert_eq!(slugify("seattle"), "seattle");
        assert_eq!(city_output_dir(Path::new("out"), "San José"), Path::new("out/san_jos"));
    }
}
