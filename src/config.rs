use std::{fmt, fs, path::Path, str::FromStr};

use anyhow::{Context, Result};
use hexgrid::Resolution;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

pub const DEFAULT_RESOLUTION: u8 = 8;
pub const DEFAULT_BUFFER_M: f64 = 300.0;
pub const DEFAULT_MIN_INTERSECTION_DEGREE: u32 = 3;
pub const DEFAULT_SIGNAL_SPARSITY_THRESHOLD: f64 = 0.05;

/// Allowed deviation of a weight vector's sum from 1.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Weights of the three metrics in the composite score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub intersection: f64,
    pub road: f64,
    pub signal: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self { intersection: 0.5, road: 0.3, signal: 0.2 }
    }
}

impl Weights {
    pub fn new(intersection: f64, road: f64, signal: f64) -> Self {
        Self { intersection, road, signal }
    }

    #[inline] pub fn sum(&self) -> f64 { self.intersection + self.road + self.signal }

    #[inline] pub fn as_array(&self) -> [f64; 3] { [self.intersection, self.road, self.signal] }

    /// Every weight finite and non-negative, summing to 1 within tolerance.
    pub fn validate(&self) -> EngineResult<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::InvalidWeights(format!(
                "weights must be finite and non-negative, got {self}"
            )));
        }
        if (self.sum() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(EngineError::InvalidWeights(format!(
                "weights must sum to 1 (±{WEIGHT_TOLERANCE}), got {self} summing to {}",
                self.sum()
            )));
        }
        Ok(())
    }

    /// Spread the signal weight over the other two in proportion to their
    /// size, leaving signal at exactly 0.
    pub fn redistribute_signal(&self) -> EngineResult<Self> {
        let remaining = 1.0 - self.signal;
        if remaining <= WEIGHT_TOLERANCE {
            return Err(EngineError::InvalidWeights(format!(
                "signal weight {} leaves nothing to redistribute when signals are dropped",
                self.signal
            )));
        }
        let scale = 1.0 / remaining;
        Ok(Self { intersection: self.intersection * scale, road: self.road * scale, signal: 0.0 })
    }
}

impl fmt::Display for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.intersection, self.road, self.signal)
    }
}

/// Parses `"intersection,road,signal"`, e.g. `"0.5,0.3,0.2"`.
impl FromStr for Weights {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split(',')
            .map(|p| p.trim().parse::<f64>().map_err(|e| format!("{p:?}: {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            &[intersection, road, signal] => Ok(Self { intersection, road, signal }),
            _ => Err(format!("expected three comma-separated weights, got {s:?}")),
        }
    }
}

/// Quantile pair used for the band cut points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantiles {
    pub low: f64,
    pub high: f64,
}

impl Default for Quantiles {
    fn default() -> Self {
        Self { low: 0.30, high: 0.70 }
    }
}

impl Quantiles {
    /// Requires `0 < low < high < 1`.
    pub fn validate(&self) -> EngineResult<()> {
        let in_unit = |q: f64| q > 0.0 && q < 1.0;
        if !(in_unit(self.low) && in_unit(self.high) && self.low < self.high) {
            return Err(EngineError::InvalidQuantiles(format!(
                "need 0 < q_low < q_high < 1, got q_low={} q_high={}",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Whether the signal metric takes part in the score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    /// Always computed, however sparse.
    On,
    /// Always dropped.
    Off,
    /// Dropped when too few hexes contain a signal.
    #[default]
    Auto,
}

impl fmt::Display for SignalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Auto => "auto",
        })
    }
}

impl FromStr for SignalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "auto" => Ok(Self::Auto),
            _ => Err(format!("unknown signal mode {s:?} (expected on, off or auto)")),
        }
    }
}

/// Engine settings for one build. Every field has a default, so a config
/// file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub resolution: u8,
    pub buffer_m: f64,
    pub weights: Weights,
    pub quantiles: Quantiles,
    pub signal_mode: SignalMode,
    pub min_intersection_degree: u32,
    pub signal_sparsity_threshold: f64,
    /// PROJ.4 definition of the planar input CRS, used only to report
    /// latitude/longitude.
    pub crs: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            buffer_m: DEFAULT_BUFFER_M,
            weights: Weights::default(),
            quantiles: Quantiles::default(),
            signal_mode: SignalMode::default(),
            min_intersection_degree: DEFAULT_MIN_INTERSECTION_DEGREE,
            signal_sparsity_threshold: DEFAULT_SIGNAL_SPARSITY_THRESHOLD,
            crs: None,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file; missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Check every setting up front and return the hex resolution.
    pub fn validate(&self) -> EngineResult<Resolution> {
        let resolution = Resolution::try_from(self.resolution)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

        if !(self.buffer_m.is_finite() && self.buffer_m >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "buffer_m must be finite and >= 0, got {}", self.buffer_m
            )));
        }
        if !(0.0..=1.0).contains(&self.signal_sparsity_threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "signal_sparsity_threshold must lie in [0, 1], got {}", self.signal_sparsity_threshold
            )));
        }

        self.weights.validate()?;
        self.quantiles.validate()?;
        Ok(resolution)
    }
}
