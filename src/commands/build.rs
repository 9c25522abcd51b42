use anyhow::{bail, Context, Result};
use log::error;
use std::path::{Path, PathBuf};

use urbanicity::io::{read_city_dir, write_city_outputs, OutputOptions};
use urbanicity::{run_city, EngineConfig, Quantiles};

use crate::cli::{BuildArgs, Cli};

/// Config file (or defaults) with command-line overrides applied.
fn resolve_config(args: &BuildArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    if let Some(res) = args.res { config.resolution = res }
    if let Some(buffer_m) = args.buffer_m { config.buffer_m = buffer_m }
    if let Some(mode) = args.signal_mode { config.signal_mode = mode }
    if let Some(weights) = args.weights { config.weights = weights }
    if let Some(crs) = &args.crs { config.crs = Some(crs.clone()) }
    config.quantiles = Quantiles {
        low: args.q_low.unwrap_or(config.quantiles.low),
        high: args.q_high.unwrap_or(config.quantiles.high),
    };

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// City name taken from the input directory's name.
fn city_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

fn build_city(dir: &Path, city: &str, config: &EngineConfig, options: &OutputOptions, out: &Path) -> Result<Vec<PathBuf>> {
    let (inputs, input_stats) = read_city_dir(dir)?;
    let output = run_city(city, &inputs, config)
        .with_context(|| format!("Pipeline failed for {city}"))?;
    write_city_outputs(&output, Some(&input_stats), out, options)
}

pub fn run(cli: &Cli, args: &BuildArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let options = OutputOptions {
        format: args.format.into(),
        geojson: !args.no_geojson,
        force: args.force,
    };

    let mut failed = Vec::new();
    for dir in &args.cities {
        let city = city_name(dir);
        match build_city(dir, &city, &config, &options, &args.out) {
            Ok(paths) => {
                if cli.verbose > 0 {
                    for path in &paths {
                        eprintln!("[build] {city} -> {}", path.display());
                    }
                }
                println!("Built {city} -> {}", args.out.display());
            }
            Err(e) => {
                error!("[{city}] {e:#}");
                failed.push(city);
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} of {} cities failed: {}", failed.len(), args.cities.len(), failed.join(", "));
    }
    Ok(())
}
