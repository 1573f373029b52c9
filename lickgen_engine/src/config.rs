// Generation options, tuning knobs, and boundary errors.
//
// `LickOptions` is what a caller (the CLI, or a host application) hands to
// the generator: the style strategies from the input contract plus a nested
// `Tuning` block holding every probability and weight the engine consults.
// The engine never uses a magic number for these; it reads them from here.
//
// Options can be loaded from a JSON file (camelCase keys, every field
// optional) and then overridden field by field. `validate` is the single place
// where out-of-range values are rejected. Past that point generation itself
// cannot fail.

use crate::pitch::{PLAYABLE_HIGH, PLAYABLE_LOW};
use crate::scale::ScaleStrategy;
use crate::selector::DeviceStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Errors raised at the generator's input and output boundaries.
#[derive(Debug, thiserror::Error)]
pub enum LickError {
    #[error("unknown scale strategy '{0}' (expected default, varied, exotic or per-family-varied)")]
    UnknownScaleStrategy(String),

    #[error(
        "unknown device strategy '{0}' (expected arpeggio-focused, scale-focused, cell-focused, \
         neighbor-enclosure, arpeggio-scale-mix or varied)"
    )]
    UnknownDeviceStrategy(String),

    #[error("swing ratio {0} is outside [0, 1]")]
    SwingOutOfRange(f64),

    #[error("start pitch {0} is outside the playable range {lo}-{hi}", lo = PLAYABLE_LOW, hi = PLAYABLE_HIGH)]
    StartPitchOutOfRange(u8),

    #[error("tuning value '{name}' = {value} is invalid: {reason}")]
    InvalidTuning {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("tempo must be positive")]
    InvalidTempo,

    #[error("progression is empty")]
    EmptyProgression,

    #[error("progression bar {bar}: {reason}")]
    InvalidProgression { bar: usize, reason: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode output: {0}")]
    Encode(String),
}

impl FromStr for ScaleStrategy {
    type Err = LickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScaleStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.tag() == s)
            .ok_or_else(|| LickError::UnknownScaleStrategy(s.to_string()))
    }
}

impl FromStr for DeviceStrategy {
    type Err = LickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.tag() == s)
            .ok_or_else(|| LickError::UnknownDeviceStrategy(s.to_string()))
    }
}

/// Read and deserialize a JSON file, mapping failures to `LickError`.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LickError> {
    let data = std::fs::read_to_string(path).map_err(|source| LickError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| LickError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Probabilities and weights consulted during generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tuning {
    /// Chance that a non-final measure reserves its last two slots for an
    /// enclosure onto the next target.
    pub enclosure_probability: f64,
    /// Weights for the `varied` device strategy, in `DeviceKind::ALL` order
    /// (arpeggio, scale-run, melodic-cell, neighbor).
    pub varied_weights: [f64; 4],
    /// Share of arpeggios under `arpeggio-scale-mix`; the rest are scale runs.
    pub mix_arpeggio_weight: f64,
    /// Chance that a measure receives an inserted rest region.
    pub rest_probability: f64,
    /// Longest inserted rest region, in notes.
    pub max_rest_notes: usize,
    /// Velocity of downbeat targets and cadences.
    pub accent_velocity: u8,
    /// Velocity of every other note.
    pub base_velocity: u8,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            enclosure_probability: 0.3,
            varied_weights: [0.25; 4],
            mix_arpeggio_weight: 0.5,
            rest_probability: 0.35,
            max_rest_notes: 2,
            accent_velocity: 100,
            base_velocity: 80,
        }
    }
}

/// Input-contract metadata for a progression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LickMeta {
    pub tempo: u16,
}

impl Default for LickMeta {
    fn default() -> Self {
        LickMeta { tempo: 120 }
    }
}

/// Style options for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LickOptions {
    pub scale_strategy: ScaleStrategy,
    pub device_strategy: DeviceStrategy,
    /// Swing ratio in [0, 1]; 0 is straight eighths.
    pub swing: f64,
    pub insert_rests: bool,
    /// Pitch the first target is measured from.
    pub start_pitch: u8,
    pub tuning: Tuning,
}

impl Default for LickOptions {
    fn default() -> Self {
        LickOptions {
            scale_strategy: ScaleStrategy::Default,
            device_strategy: DeviceStrategy::Varied,
            swing: 0.0,
            insert_rests: false,
            start_pitch: 67,
            tuning: Tuning::default(),
        }
    }
}

impl LickOptions {
    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, LickError> {
        let options: LickOptions = load_json(path)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values the engine cannot honor.
    pub fn validate(&self) -> Result<(), LickError> {
        if !(0.0..=1.0).contains(&self.swing) {
            return Err(LickError::SwingOutOfRange(self.swing));
        }
        if !(PLAYABLE_LOW..=PLAYABLE_HIGH).contains(&self.start_pitch) {
            return Err(LickError::StartPitchOutOfRange(self.start_pitch));
        }
        let t = &self.tuning;
        for (name, value) in [
            ("enclosureProbability", t.enclosure_probability),
            ("mixArpeggioWeight", t.mix_arpeggio_weight),
            ("restProbability", t.rest_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LickError::InvalidTuning {
                    name,
                    value,
                    reason: "must be a probability in [0, 1]",
                });
            }
        }
        for &w in &t.varied_weights {
            if !w.is_finite() || w < 0.0 {
                return Err(LickError::InvalidTuning {
                    name: "variedWeights",
                    value: w,
                    reason: "weights must be finite and non-negative",
                });
            }
        }
        if t.varied_weights.iter().sum::<f64>() <= 0.0 {
            return Err(LickError::InvalidTuning {
                name: "variedWeights",
                value: 0.0,
                reason: "at least one weight must be positive",
            });
        }
        if t.max_rest_notes == 0 {
            return Err(LickError::InvalidTuning {
                name: "maxRestNotes",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
