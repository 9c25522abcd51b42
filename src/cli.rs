use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

use urbanicity::io::TableFormat;
use urbanicity::{SignalMode, Weights};

/// Per-city hexagonal urbanicity scoring
#[derive(Parser, Debug)]
#[command(name = "urbanicity", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score one or more city directories
    Build(BuildArgs),

    /// Print the hex cell containing a planar point
    Locate(LocateArgs),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum OutputFormat { Parquet, Csv }

impl From<OutputFormat> for TableFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Parquet => TableFormat::Parquet,
            OutputFormat::Csv => TableFormat::Csv,
        }
    }
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// City input directories (boundary, nodes, edges and optional signals GeoJSON)
    #[arg(required = true, value_hint = ValueHint::DirPath)]
    pub cities: Vec<PathBuf>,

    /// Output location (directory); each city gets a subdirectory
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub out: PathBuf,

    /// JSON engine config; flags below override its values
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Hex resolution (0-15)
    #[arg(long)]
    pub res: Option<u8>,

    /// Boundary buffer in metres
    #[arg(long)]
    pub buffer_m: Option<f64>,

    /// Signal metric: on, off or auto
    #[arg(long)]
    pub signal_mode: Option<SignalMode>,

    /// Base weights "intersection,road,signal", e.g. 0.5,0.3,0.2
    #[arg(long)]
    pub weights: Option<Weights>,

    /// Lower band quantile
    #[arg(long)]
    pub q_low: Option<f64>,

    /// Upper band quantile
    #[arg(long)]
    pub q_high: Option<f64>,

    /// PROJ.4 string of the planar input CRS (enables lat/lon output)
    #[arg(long)]
    pub crs: Option<String>,

    /// Tabular output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Parquet)]
    pub format: OutputFormat,

    /// Skip the GeoJSON output
    #[arg(long)]
    pub no_geojson: bool,

    /// Overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Planar x (easting, metres)
    #[arg(allow_hyphen_values = true)]
    pub x: f64,

    /// Planar y (northing, metres)
    #[arg(allow_hyphen_values = true)]
    pub y: f64,

    /// Hex resolution (0-15)
    #[arg(long, default_value_t = urbanicity::config::DEFAULT_RESOLUTION)]
    pub res: u8,
}
