// Scale library: interval content, tonal families, and per-quality choices.
//
// Three fixed tables drive everything here:
// - `ScaleName::intervals`: the 6–8 semitone offsets of each scale from its
//   tonic (the chord root).
// - `ScaleName::family`: which of the four tonal families (major, dominant,
//   minor, diminished) a scale belongs to.
// - `quality_scales`: for each chord quality, its family and an ordered list
//   of eligible scales whose first entry is the conventional choice.
//
// `select_scale` applies one of four strategies on top of these tables. The
// generator resolves a scale once per measure (measure.rs) and the scale is
// then fixed for every device and for classification (harmony.rs).

use crate::chord::ChordQuality;
use lickgen_prng::LickRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every scale the generator can play over a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleName {
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
    MelodicMinor,
    HarmonicMinor,
    HarmonicMajor,
    LydianAugmented,
    LydianDominant,
    #[serde(rename = "mixolydian-b6")]
    MixolydianFlat6,
    Altered,
    #[serde(rename = "locrian-natural2")]
    LocrianNatural2,
    #[serde(rename = "dorian-b2")]
    DorianFlat2,
    PhrygianDominant,
    HalfWholeDiminished,
    WholeHalfDiminished,
    WholeTone,
    BebopDominant,
    BebopMajor,
}

/// Tonal families used by the per-family selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleFamily {
    Major,
    Dominant,
    Minor,
    Diminished,
}

impl ScaleName {
    pub const ALL: [ScaleName; 22] = [
        ScaleName::Ionian,
        ScaleName::Dorian,
        ScaleName::Phrygian,
        ScaleName::Lydian,
        ScaleName::Mixolydian,
        ScaleName::Aeolian,
        ScaleName::Locrian,
        ScaleName::MelodicMinor,
        ScaleName::HarmonicMinor,
        ScaleName::HarmonicMajor,
        ScaleName::LydianAugmented,
        ScaleName::LydianDominant,
        ScaleName::MixolydianFlat6,
        ScaleName::Altered,
        ScaleName::LocrianNatural2,
        ScaleName::DorianFlat2,
        ScaleName::PhrygianDominant,
        ScaleName::HalfWholeDiminished,
        ScaleName::WholeHalfDiminished,
        ScaleName::WholeTone,
        ScaleName::BebopDominant,
        ScaleName::BebopMajor,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ScaleName::Ionian => "ionian",
            ScaleName::Dorian => "dorian",
            ScaleName::Phrygian => "phrygian",
            ScaleName::Lydian => "lydian",
            ScaleName::Mixolydian => "mixolydian",
            ScaleName::Aeolian => "aeolian",
            ScaleName::Locrian => "locrian",
            ScaleName::MelodicMinor => "melodic-minor",
            ScaleName::HarmonicMinor => "harmonic-minor",
            ScaleName::HarmonicMajor => "harmonic-major",
            ScaleName::LydianAugmented => "lydian-augmented",
            ScaleName::LydianDominant => "lydian-dominant",
            ScaleName::MixolydianFlat6 => "mixolydian-b6",
            ScaleName::Altered => "altered",
            ScaleName::LocrianNatural2 => "locrian-natural2",
            ScaleName::DorianFlat2 => "dorian-b2",
            ScaleName::PhrygianDominant => "phrygian-dominant",
            ScaleName::HalfWholeDiminished => "half-whole-diminished",
            ScaleName::WholeHalfDiminished => "whole-half-diminished",
            ScaleName::WholeTone => "whole-tone",
            ScaleName::BebopDominant => "bebop-dominant",
            ScaleName::BebopMajor => "bebop-major",
        }
    }

    /// Semitone offsets from the tonic, ascending, starting at 0.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleName::Ionian => &[0, 2, 4, 5, 7, 9, 11],
            ScaleName::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleName::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleName::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleName::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleName::Aeolian => &[0, 2, 3, 5, 7, 8, 10],
            ScaleName::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            ScaleName::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleName::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleName::HarmonicMajor => &[0, 2, 4, 5, 7, 8, 11],
            ScaleName::LydianAugmented => &[0, 2, 4, 6, 8, 9, 11],
            ScaleName::LydianDominant => &[0, 2, 4, 6, 7, 9, 10],
            ScaleName::MixolydianFlat6 => &[0, 2, 4, 5, 7, 8, 10],
            ScaleName::Altered => &[0, 1, 3, 4, 6, 8, 10],
            ScaleName::LocrianNatural2 => &[0, 2, 3, 5, 6, 8, 10],
            ScaleName::DorianFlat2 => &[0, 1, 3, 5, 7, 9, 10],
            ScaleName::PhrygianDominant => &[0, 1, 4, 5, 7, 8, 10],
            ScaleName::HalfWholeDiminished => &[0, 1, 3, 4, 6, 7, 9, 10],
            ScaleName::WholeHalfDiminished => &[0, 2, 3, 5, 6, 8, 9, 11],
            ScaleName::WholeTone => &[0, 2, 4, 6, 8, 10],
            ScaleName::BebopDominant => &[0, 2, 4, 5, 7, 9, 10, 11],
            ScaleName::BebopMajor => &[0, 2, 4, 5, 7, 8, 9, 11],
        }
    }

    pub fn family(self) -> ScaleFamily {
        match self {
            ScaleName::Ionian
            | ScaleName::Lydian
            | ScaleName::HarmonicMajor
            | ScaleName::LydianAugmented
            | ScaleName::BebopMajor => ScaleFamily::Major,
            ScaleName::Mixolydian
            | ScaleName::LydianDominant
            | ScaleName::MixolydianFlat6
            | ScaleName::Altered
            | ScaleName::PhrygianDominant
            | ScaleName::HalfWholeDiminished
            | ScaleName::WholeTone
            | ScaleName::BebopDominant => ScaleFamily::Dominant,
            ScaleName::Dorian
            | ScaleName::Phrygian
            | ScaleName::Aeolian
            | ScaleName::MelodicMinor
            | ScaleName::HarmonicMinor
            | ScaleName::DorianFlat2 => ScaleFamily::Minor,
            ScaleName::Locrian | ScaleName::LocrianNatural2 | ScaleName::WholeHalfDiminished => {
                ScaleFamily::Diminished
            }
        }
    }

    /// Interval membership mask relative to the tonic.
    pub fn interval_mask(self) -> [bool; 12] {
        let mut mask = [false; 12];
        for &iv in self.intervals() {
            mask[iv as usize] = true;
        }
        mask
    }
}

impl fmt::Display for ScaleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ScaleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScaleName::ALL
            .into_iter()
            .find(|n| n.tag() == s)
            .ok_or_else(|| format!("unknown scale '{s}'"))
    }
}

impl ScaleFamily {
    /// All scales in the family, in table order.
    pub fn scales(self) -> Vec<ScaleName> {
        ScaleName::ALL
            .into_iter()
            .filter(|s| s.family() == self)
            .collect()
    }
}

/// Tonal family a chord quality draws from.
pub fn quality_family(quality: ChordQuality) -> ScaleFamily {
    match quality {
        ChordQuality::Maj7 | ChordQuality::Maj7Sharp11 | ChordQuality::Maj7Sharp5 => {
            ScaleFamily::Major
        }
        ChordQuality::Min7 | ChordQuality::Min7Flat6 | ChordQuality::MinMaj7 => ScaleFamily::Minor,
        ChordQuality::Min7Flat5 | ChordQuality::Dim7 => ScaleFamily::Diminished,
        ChordQuality::Dom7
        | ChordQuality::Dom7Sharp11
        | ChordQuality::Dom7Flat13
        | ChordQuality::Dom7Sharp5
        | ChordQuality::Dom7Flat9
        | ChordQuality::Dom7Sharp9
        | ChordQuality::Dom7Sharp9Flat13
        | ChordQuality::Dom7Alt
        | ChordQuality::Dom7Sus4Flat9
        | ChordQuality::Sus4Flat9 => ScaleFamily::Dominant,
    }
}

/// Ordered eligible scales for a chord quality. The first is the
/// conventional default.
pub fn eligible_scales(quality: ChordQuality) -> &'static [ScaleName] {
    use ScaleName::*;
    match quality {
        ChordQuality::Maj7 => &[Ionian, Lydian, BebopMajor, HarmonicMajor],
        ChordQuality::Maj7Sharp11 => &[Lydian, LydianAugmented],
        ChordQuality::Maj7Sharp5 => &[LydianAugmented, HarmonicMajor],
        ChordQuality::Dom7 => &[Mixolydian, BebopDominant, LydianDominant, MixolydianFlat6],
        ChordQuality::Dom7Sharp11 => &[LydianDominant, WholeTone],
        ChordQuality::Dom7Flat13 => &[MixolydianFlat6, PhrygianDominant, Altered],
        ChordQuality::Dom7Sharp5 => &[WholeTone, Altered],
        ChordQuality::Dom7Flat9 => &[PhrygianDominant, HalfWholeDiminished, Altered],
        ChordQuality::Dom7Sharp9 => &[HalfWholeDiminished, Altered],
        ChordQuality::Dom7Sharp9Flat13 => &[Altered, PhrygianDominant],
        ChordQuality::Dom7Alt => &[Altered, HalfWholeDiminished, WholeTone],
        ChordQuality::Dom7Sus4Flat9 => &[DorianFlat2, Phrygian],
        ChordQuality::Min7 => &[Dorian, Aeolian, Phrygian, DorianFlat2],
        ChordQuality::Min7Flat6 => &[Aeolian, Phrygian],
        ChordQuality::MinMaj7 => &[MelodicMinor, HarmonicMinor],
        ChordQuality::Min7Flat5 => &[Locrian, LocrianNatural2],
        ChordQuality::Dim7 => &[WholeHalfDiminished],
        ChordQuality::Sus4Flat9 => &[Phrygian, DorianFlat2],
    }
}

/// Family and eligible scales together.
pub fn quality_scales(quality: ChordQuality) -> (ScaleFamily, &'static [ScaleName]) {
    (quality_family(quality), eligible_scales(quality))
}

/// How a measure's scale is chosen from its chord quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleStrategy {
    /// Always the conventional first scale.
    #[default]
    Default,
    /// Uniform among the quality's eligible scales.
    Varied,
    /// Uniform among the latter half of the eligible list.
    Exotic,
    /// Uniform among every scale in the quality's family.
    PerFamilyVaried,
}

impl ScaleStrategy {
    pub const ALL: [ScaleStrategy; 4] = [
        ScaleStrategy::Default,
        ScaleStrategy::Varied,
        ScaleStrategy::Exotic,
        ScaleStrategy::PerFamilyVaried,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ScaleStrategy::Default => "default",
            ScaleStrategy::Varied => "varied",
            ScaleStrategy::Exotic => "exotic",
            ScaleStrategy::PerFamilyVaried => "per-family-varied",
        }
    }
}

impl fmt::Display for ScaleStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Choose the scale for a chord quality under the given strategy.
pub fn select_scale(quality: ChordQuality, strategy: ScaleStrategy, rng: &mut LickRng) -> ScaleName {
    let (family, eligible) = quality_scales(quality);
    let Some(&conventional) = eligible.first() else {
        return ScaleName::Ionian;
    };
    match strategy {
        ScaleStrategy::Default => conventional,
        ScaleStrategy::Varied => *rng.pick(eligible).unwrap_or(&conventional),
        ScaleStrategy::Exotic => {
            let tail = &eligible[eligible.len() / 2..];
            *rng.pick(tail).unwrap_or(&conventional)
        }
        ScaleStrategy::PerFamilyVaried => {
            let members = family.scales();
            if members.is_empty() {
                *rng.pick(eligible).unwrap_or(&conventional)
            } else {
                *rng.pick(&members).unwrap_or(&conventional)
            }
        }
    }
}

/// A scale rooted on a concrete pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleInstance {
    pub name: ScaleName,
    pub root_pc: u8,
}

impl ScaleInstance {
    pub fn new(name: ScaleName, root_pc: u8) -> Self {
        ScaleInstance {
            name,
            root_pc: root_pc % 12,
        }
    }

    pub fn contains(&self, pitch: u8) -> bool {
        let rel = (pitch % 12 + 12 - self.root_pc) % 12;
        self.name.interval_mask()[rel as usize]
    }

    /// Nearest in-scale pitch strictly above `pitch`, searching one octave.
    pub fn step_above(&self, pitch: u8) -> Option<u8> {
        (1..=12u8)
            .map(|d| pitch.saturating_add(d))
            .find(|&p| p > pitch && self.contains(p))
    }

    /// Nearest in-scale pitch strictly below `pitch`, searching one octave.
    pub fn step_below(&self, pitch: u8) -> Option<u8> {
        (1..=12u8)
            .filter(|&d| d <= pitch)
            .map(|d| pitch - d)
            .find(|&p| self.contains(p))
    }

    /// Pitch of scale degree `degree` (0-based) above `anchor`, where `anchor`
    /// is a pitch of the scale root. Degrees past the scale length continue
    /// into the next octave.
    pub fn degree_pitch(&self, anchor: u8, degree: usize) -> u8 {
        let intervals = self.name.intervals();
        let n = intervals.len().max(1);
        let octave = (degree / n).min(10) as u8;
        anchor
            .saturating_add(intervals[degree % n])
            .saturating_add(octave * 12)
    }
}
