// Device selection: which melodic device fills the next stretch of a measure.
//
// A `DeviceStrategy` is the user-facing style choice. `DeviceSelector` binds a
// strategy to the tuning weights and is consulted once per device invocation,
// not once per measure, so a single measure can mix devices under `varied`.

use crate::config::Tuning;
use crate::note::DeviceKind;
use lickgen_prng::LickRng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceStrategy {
    ArpeggioFocused,
    ScaleFocused,
    CellFocused,
    NeighborEnclosure,
    ArpeggioScaleMix,
    #[default]
    Varied,
}

impl DeviceStrategy {
    pub const ALL: [DeviceStrategy; 6] = [
        DeviceStrategy::ArpeggioFocused,
        DeviceStrategy::ScaleFocused,
        DeviceStrategy::CellFocused,
        DeviceStrategy::NeighborEnclosure,
        DeviceStrategy::ArpeggioScaleMix,
        DeviceStrategy::Varied,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            DeviceStrategy::ArpeggioFocused => "arpeggio-focused",
            DeviceStrategy::ScaleFocused => "scale-focused",
            DeviceStrategy::CellFocused => "cell-focused",
            DeviceStrategy::NeighborEnclosure => "neighbor-enclosure",
            DeviceStrategy::ArpeggioScaleMix => "arpeggio-scale-mix",
            DeviceStrategy::Varied => "varied",
        }
    }

    /// The single device kind a focused strategy always uses.
    pub fn fixed_kind(self) -> Option<DeviceKind> {
        match self {
            DeviceStrategy::ArpeggioFocused => Some(DeviceKind::Arpeggio),
            DeviceStrategy::ScaleFocused => Some(DeviceKind::ScaleRun),
            DeviceStrategy::CellFocused => Some(DeviceKind::MelodicCell),
            DeviceStrategy::NeighborEnclosure => Some(DeviceKind::Neighbor),
            DeviceStrategy::ArpeggioScaleMix | DeviceStrategy::Varied => None,
        }
    }
}

impl fmt::Display for DeviceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A strategy bound to its weights.
#[derive(Debug, Clone)]
pub struct DeviceSelector {
    strategy: DeviceStrategy,
    varied_weights: [f64; 4],
    mix_arpeggio_weight: f64,
}

impl DeviceSelector {
    pub fn new(strategy: DeviceStrategy, tuning: &Tuning) -> Self {
        DeviceSelector {
            strategy,
            varied_weights: tuning.varied_weights,
            mix_arpeggio_weight: tuning.mix_arpeggio_weight,
        }
    }

    pub fn strategy(&self) -> DeviceStrategy {
        self.strategy
    }

    /// Choose the device for the next invocation.
    pub fn pick(&self, rng: &mut LickRng) -> DeviceKind {
        if let Some(kind) = self.strategy.fixed_kind() {
            return kind;
        }
        match self.strategy {
            DeviceStrategy::ArpeggioScaleMix => {
                if rng.random_bool(self.mix_arpeggio_weight) {
                    DeviceKind::Arpeggio
                } else {
                    DeviceKind::ScaleRun
                }
            }
            _ => {
                let idx = rng.weighted_index(&self.varied_weights).unwrap_or(0);
                DeviceKind::ALL[idx]
            }
        }
    }

    /// Whether this strategy can ever choose `kind`. Cross-measure enclosures
    /// are neighbor devices, so they are only reserved when this allows
    /// `DeviceKind::Neighbor`.
    pub fn allows(&self, kind: DeviceKind) -> bool {
        match self.strategy {
            DeviceStrategy::ArpeggioScaleMix => {
                matches!(kind, DeviceKind::Arpeggio | DeviceKind::ScaleRun)
            }
            DeviceStrategy::Varied => self.varied_weights[kind.index()] > 0.0,
            focused => focused.fixed_kind() == Some(kind),
        }
    }
}
