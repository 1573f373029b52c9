// Notes and licks: the output contract of the generator.
//
// A `Note` is the atomic output unit. Timing and pitch come from the device
// that produced it; the harmonic fields (`harmonic_function`, `degree`) are
// attached afterwards by harmony.rs from the note's own chord and scale, so
// they never depend on which device played the note.
//
// A `Lick` is the ordered note sequence for a whole progression together with
// the measures it was generated from, which the rest-insertion pass needs to
// find bar boundaries and midpoints. Field names serialize in camelCase to
// match what renderers and players consume.

use crate::chord::{ChordQuality, Degree};
use crate::config::LickError;
use crate::measure::{BEAT_EPSILON, Measure};
use crate::pitch::pitch_name;
use crate::scale::ScaleName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Harmonic role of a pitch over its chord and scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HarmonicFunction {
    ChordTone,
    ScaleStep,
    Chromatic,
}

impl HarmonicFunction {
    /// One-letter marker used in text summaries.
    pub fn marker(self) -> char {
        match self {
            HarmonicFunction::ChordTone => 'C',
            HarmonicFunction::ScaleStep => 'S',
            HarmonicFunction::Chromatic => 'X',
        }
    }
}

impl fmt::Display for HarmonicFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HarmonicFunction::ChordTone => "chord-tone",
            HarmonicFunction::ScaleStep => "scale-step",
            HarmonicFunction::Chromatic => "chromatic",
        })
    }
}

/// The melodic devices that fill a measure after its target note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    Arpeggio,
    ScaleRun,
    MelodicCell,
    /// Neighbor tones, including cross-measure enclosures.
    Neighbor,
}

impl DeviceKind {
    pub const ALL: [DeviceKind; 4] = [
        DeviceKind::Arpeggio,
        DeviceKind::ScaleRun,
        DeviceKind::MelodicCell,
        DeviceKind::Neighbor,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn tag(self) -> &'static str {
        match self {
            DeviceKind::Arpeggio => "arpeggio",
            DeviceKind::ScaleRun => "scale-run",
            DeviceKind::MelodicCell => "melodic-cell",
            DeviceKind::Neighbor => "neighbor",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which rule inside a device placed a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    /// Downbeat chord tone from the target planner.
    Target,
    ArpeggioStep,
    ScaleStep,
    CellDegree,
    NeighborUpper,
    NeighborLower,
    NeighborReturn,
    EnclosureUpper,
    EnclosureLower,
    /// Closing chord tone of the final measure.
    Cadence,
}

impl Rule {
    /// Notes that rest insertion must leave alone.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            Rule::Target | Rule::EnclosureUpper | Rule::EnclosureLower | Rule::Cadence
        )
    }

    pub fn is_enclosure(self) -> bool {
        matches!(self, Rule::EnclosureUpper | Rule::EnclosureLower)
    }
}

/// One note (or rest) of a lick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub start_beat: f64,
    pub duration_beats: f64,
    pub midi: u8,
    pub velocity: u8,
    pub is_rest: bool,
    pub device: DeviceKind,
    pub rule_id: Rule,
    pub harmonic_function: HarmonicFunction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<Degree>,
    pub chord_symbol: String,
    pub root_pc: u8,
    pub quality: ChordQuality,
    pub scale_name: ScaleName,
}

impl Note {
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration_beats
    }

    /// The same note silenced. Pitch and harmonic fields are kept so the
    /// rest still classifies consistently.
    pub fn to_rest(&self) -> Note {
        Note {
            is_rest: true,
            velocity: 0,
            ..self.clone()
        }
    }
}

/// A generated phrase: the measures it was planned over and its notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lick {
    pub tempo_bpm: u16,
    pub measures: Vec<Measure>,
    pub notes: Vec<Note>,
}

impl Lick {
    /// Notes that start inside the given measure, in order.
    pub fn notes_in<'a>(&'a self, measure: &'a Measure) -> impl Iterator<Item = &'a Note> + 'a {
        self.notes
            .iter()
            .filter(move |n| measure.contains_beat(n.start_beat))
    }

    /// Compact per-measure text view: chord, then each note as name plus a
    /// harmonic marker (C chord tone, S scale step, X chromatic), rests as ".".
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for m in &self.measures {
            out.push_str(&format!(
                "{:>3} {:<8} {:<22}|",
                m.bar,
                m.chord_span.symbol,
                m.scale_name.tag()
            ));
            for n in self.notes_in(m) {
                if n.is_rest {
                    out.push_str(" .");
                    continue;
                }
                out.push(' ');
                out.push_str(&pitch_name(n.midi));
                out.push(n.harmonic_function.marker());
                if n.duration_beats > 0.75 + BEAT_EPSILON {
                    out.push('-');
                }
            }
            out.push('\n');
        }
        out
    }

    /// Pretty-printed JSON in the output contract shape.
    pub fn to_json(&self) -> Result<String, LickError> {
        serde_json::to_string_pretty(self).map_err(|e| LickError::Encode(e.to_string()))
    }

    pub fn write_json(&self, path: &Path) -> Result<(), LickError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| LickError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn stats(&self) -> LickStats {
        let mut stats = LickStats::default();
        for n in &self.notes {
            if n.is_rest {
                stats.rests += 1;
                continue;
            }
            stats.notes += 1;
            match n.harmonic_function {
                HarmonicFunction::ChordTone => stats.chord_tones += 1,
                HarmonicFunction::ScaleStep => stats.scale_steps += 1,
                HarmonicFunction::Chromatic => stats.chromatic += 1,
            }
            stats.by_device[n.device.index()] += 1;
        }
        stats
    }
}

/// Counts over a lick, for the CLI report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LickStats {
    pub notes: usize,
    pub rests: usize,
    pub chord_tones: usize,
    pub scale_steps: usize,
    pub chromatic: usize,
    /// Sounding notes per device, indexed by `DeviceKind::index`.
    pub by_device: [usize; 4],
}
