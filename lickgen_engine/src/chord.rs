// Chord symbol parsing and chord-tone tables.
//
// A chord symbol such as "Bb7#9" or "F#m7b5/C" is split into a root pitch
// class and a quality tag from a closed set of eighteen qualities. Quality
// detection walks a priority-ordered pattern table: minor forms before major,
// major before dominant, dominant before sus, and within each group the more
// specific alterations before the bare form. Nothing here fails: an
// unreadable root falls back to C, an unrecognized quality to maj7.
//
// Each quality owns a fixed table of chord tones. A chord tone is an interval
// above the root together with its degree label, so the pitch-class set and
// the degree names can never drift apart.
//
// Used by measure.rs (resolving chord spans), target.rs (downbeat pitches),
// devices.rs (arpeggios, cadences) and harmony.rs (classification).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of chord qualities the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    #[serde(rename = "maj7")]
    Maj7,
    #[serde(rename = "maj7#11")]
    Maj7Sharp11,
    #[serde(rename = "maj7#5")]
    Maj7Sharp5,
    #[serde(rename = "7")]
    Dom7,
    #[serde(rename = "7#11")]
    Dom7Sharp11,
    #[serde(rename = "7b13")]
    Dom7Flat13,
    #[serde(rename = "7#5")]
    Dom7Sharp5,
    #[serde(rename = "7b9")]
    Dom7Flat9,
    #[serde(rename = "7#9")]
    Dom7Sharp9,
    #[serde(rename = "7#9b13")]
    Dom7Sharp9Flat13,
    #[serde(rename = "7alt")]
    Dom7Alt,
    #[serde(rename = "7sus4b9")]
    Dom7Sus4Flat9,
    #[serde(rename = "m7")]
    Min7,
    #[serde(rename = "m7b6")]
    Min7Flat6,
    #[serde(rename = "mMaj7")]
    MinMaj7,
    #[serde(rename = "m7b5")]
    Min7Flat5,
    #[serde(rename = "dim7")]
    Dim7,
    #[serde(rename = "sus4b9")]
    Sus4Flat9,
}

/// Label for a chord tone relative to the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Degree {
    #[serde(rename = "1")]
    Root,
    #[serde(rename = "b9")]
    Flat9,
    #[serde(rename = "#9")]
    Sharp9,
    #[serde(rename = "b3")]
    Flat3,
    #[serde(rename = "3")]
    Third,
    #[serde(rename = "4")]
    Fourth,
    #[serde(rename = "#11")]
    Sharp11,
    #[serde(rename = "b5")]
    Flat5,
    #[serde(rename = "5")]
    Fifth,
    #[serde(rename = "#5")]
    Sharp5,
    #[serde(rename = "b13")]
    Flat13,
    #[serde(rename = "b6")]
    Flat6,
    #[serde(rename = "bb7")]
    DoubleFlat7,
    #[serde(rename = "b7")]
    Flat7,
    #[serde(rename = "7")]
    Seventh,
}

impl Degree {
    pub fn label(self) -> &'static str {
        match self {
            Degree::Root => "1",
            Degree::Flat9 => "b9",
            Degree::Sharp9 => "#9",
            Degree::Flat3 => "b3",
            Degree::Third => "3",
            Degree::Fourth => "4",
            Degree::Sharp11 => "#11",
            Degree::Flat5 => "b5",
            Degree::Fifth => "5",
            Degree::Sharp5 => "#5",
            Degree::Flat13 => "b13",
            Degree::Flat6 => "b6",
            Degree::DoubleFlat7 => "bb7",
            Degree::Flat7 => "b7",
            Degree::Seventh => "7",
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One chord tone: semitones above the root plus its degree label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordTone {
    pub interval: u8,
    pub degree: Degree,
}

const fn tone(interval: u8, degree: Degree) -> ChordTone {
    ChordTone { interval, degree }
}

use Degree::*;

const MAJ7: &[ChordTone] = &[tone(0, Root), tone(4, Third), tone(7, Fifth), tone(11, Seventh)];
const MAJ7_SHARP11: &[ChordTone] = &[
    tone(0, Root),
    tone(4, Third),
    tone(6, Sharp11),
    tone(7, Fifth),
    tone(11, Seventh),
];
const MAJ7_SHARP5: &[ChordTone] = &[tone(0, Root), tone(4, Third), tone(8, Sharp5), tone(11, Seventh)];
const DOM7: &[ChordTone] = &[tone(0, Root), tone(4, Third), tone(7, Fifth), tone(10, Flat7)];
const DOM7_SHARP11: &[ChordTone] = &[
    tone(0, Root),
    tone(4, Third),
    tone(6, Sharp11),
    tone(7, Fifth),
    tone(10, Flat7),
];
const DOM7_FLAT13: &[ChordTone] = &[
    tone(0, Root),
    tone(4, Third),
    tone(7, Fifth),
    tone(8, Flat13),
    tone(10, Flat7),
];
const DOM7_SHARP5: &[ChordTone] = &[tone(0, Root), tone(4, Third), tone(8, Sharp5), tone(10, Flat7)];
const DOM7_FLAT9: &[ChordTone] = &[
    tone(0, Root),
    tone(1, Flat9),
    tone(4, Third),
    tone(7, Fifth),
    tone(10, Flat7),
];
const DOM7_SHARP9: &[ChordTone] = &[
    tone(0, Root),
    tone(3, Sharp9),
    tone(4, Third),
    tone(7, Fifth),
    tone(10, Flat7),
];
const DOM7_SHARP9_FLAT13: &[ChordTone] = &[
    tone(0, Root),
    tone(3, Sharp9),
    tone(4, Third),
    tone(8, Flat13),
    tone(10, Flat7),
];
const DOM7_ALT: &[ChordTone] = &[
    tone(0, Root),
    tone(1, Flat9),
    tone(3, Sharp9),
    tone(4, Third),
    tone(6, Flat5),
    tone(8, Sharp5),
    tone(10, Flat7),
];
const DOM7_SUS4_FLAT9: &[ChordTone] = &[
    tone(0, Root),
    tone(1, Flat9),
    tone(5, Fourth),
    tone(7, Fifth),
    tone(10, Flat7),
];
const MIN7: &[ChordTone] = &[tone(0, Root), tone(3, Flat3), tone(7, Fifth), tone(10, Flat7)];
const MIN7_FLAT6: &[ChordTone] = &[
    tone(0, Root),
    tone(3, Flat3),
    tone(7, Fifth),
    tone(8, Flat6),
    tone(10, Flat7),
];
const MIN_MAJ7: &[ChordTone] = &[tone(0, Root), tone(3, Flat3), tone(7, Fifth), tone(11, Seventh)];
const MIN7_FLAT5: &[ChordTone] = &[tone(0, Root), tone(3, Flat3), tone(6, Flat5), tone(10, Flat7)];
const DIM7: &[ChordTone] = &[tone(0, Root), tone(3, Flat3), tone(6, Flat5), tone(9, DoubleFlat7)];
const SUS4_FLAT9: &[ChordTone] = &[tone(0, Root), tone(1, Flat9), tone(5, Fourth), tone(7, Fifth)];

impl ChordQuality {
    pub const ALL: [ChordQuality; 18] = [
        ChordQuality::Maj7,
        ChordQuality::Maj7Sharp11,
        ChordQuality::Maj7Sharp5,
        ChordQuality::Dom7,
        ChordQuality::Dom7Sharp11,
        ChordQuality::Dom7Flat13,
        ChordQuality::Dom7Sharp5,
        ChordQuality::Dom7Flat9,
        ChordQuality::Dom7Sharp9,
        ChordQuality::Dom7Sharp9Flat13,
        ChordQuality::Dom7Alt,
        ChordQuality::Dom7Sus4Flat9,
        ChordQuality::Min7,
        ChordQuality::Min7Flat6,
        ChordQuality::MinMaj7,
        ChordQuality::Min7Flat5,
        ChordQuality::Dim7,
        ChordQuality::Sus4Flat9,
    ];

    /// Tag as written in chord symbols and in JSON output.
    pub fn tag(self) -> &'static str {
        match self {
            ChordQuality::Maj7 => "maj7",
            ChordQuality::Maj7Sharp11 => "maj7#11",
            ChordQuality::Maj7Sharp5 => "maj7#5",
            ChordQuality::Dom7 => "7",
            ChordQuality::Dom7Sharp11 => "7#11",
            ChordQuality::Dom7Flat13 => "7b13",
            ChordQuality::Dom7Sharp5 => "7#5",
            ChordQuality::Dom7Flat9 => "7b9",
            ChordQuality::Dom7Sharp9 => "7#9",
            ChordQuality::Dom7Sharp9Flat13 => "7#9b13",
            ChordQuality::Dom7Alt => "7alt",
            ChordQuality::Dom7Sus4Flat9 => "7sus4b9",
            ChordQuality::Min7 => "m7",
            ChordQuality::Min7Flat6 => "m7b6",
            ChordQuality::MinMaj7 => "mMaj7",
            ChordQuality::Min7Flat5 => "m7b5",
            ChordQuality::Dim7 => "dim7",
            ChordQuality::Sus4Flat9 => "sus4b9",
        }
    }

    /// Chord tones (interval above root + degree), ascending by interval.
    pub fn tones(self) -> &'static [ChordTone] {
        match self {
            ChordQuality::Maj7 => MAJ7,
            ChordQuality::Maj7Sharp11 => MAJ7_SHARP11,
            ChordQuality::Maj7Sharp5 => MAJ7_SHARP5,
            ChordQuality::Dom7 => DOM7,
            ChordQuality::Dom7Sharp11 => DOM7_SHARP11,
            ChordQuality::Dom7Flat13 => DOM7_FLAT13,
            ChordQuality::Dom7Sharp5 => DOM7_SHARP5,
            ChordQuality::Dom7Flat9 => DOM7_FLAT9,
            ChordQuality::Dom7Sharp9 => DOM7_SHARP9,
            ChordQuality::Dom7Sharp9Flat13 => DOM7_SHARP9_FLAT13,
            ChordQuality::Dom7Alt => DOM7_ALT,
            ChordQuality::Dom7Sus4Flat9 => DOM7_SUS4_FLAT9,
            ChordQuality::Min7 => MIN7,
            ChordQuality::Min7Flat6 => MIN7_FLAT6,
            ChordQuality::MinMaj7 => MIN_MAJ7,
            ChordQuality::Min7Flat5 => MIN7_FLAT5,
            ChordQuality::Dim7 => DIM7,
            ChordQuality::Sus4Flat9 => SUS4_FLAT9,
        }
    }

    /// Chord-tone pitch classes relative to the root, as a membership mask.
    pub fn interval_mask(self) -> [bool; 12] {
        let mut mask = [false; 12];
        for t in self.tones() {
            mask[t.interval as usize] = true;
        }
        mask
    }

    /// Degree label for an interval above the root, `None` if the interval
    /// is not a chord tone of this quality.
    pub fn degree_of(self, interval: u8) -> Option<Degree> {
        let interval = interval % 12;
        self.tones()
            .iter()
            .find(|t| t.interval == interval)
            .map(|t| t.degree)
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ChordQuality {
    type Err = String;

    /// Exact tag lookup (the JSON / CLI boundary). Symbol parsing with
    /// fallbacks is `parse_quality`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChordQuality::ALL
            .into_iter()
            .find(|q| q.tag() == s)
            .ok_or_else(|| format!("unknown chord quality '{s}'"))
    }
}

/// Absolute chord-tone pitch classes for a chord on `root_pc`.
///
/// This is the plain pitch-class view used by the target planner and the
/// arpeggio device; the same table drives `ChordQuality::degree_of`.
pub fn chord_pitch_classes(root_pc: u8, quality: ChordQuality) -> Vec<u8> {
    let mut pcs: Vec<u8> = quality
        .tones()
        .iter()
        .map(|t| (root_pc % 12 + t.interval) % 12)
        .collect();
    pcs.sort_unstable();
    pcs
}

/// A parsed chord symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub symbol: String,
    pub root_pc: u8,
    pub quality: ChordQuality,
}

impl Chord {
    pub fn parse(symbol: &str) -> Self {
        Chord {
            symbol: symbol.to_string(),
            root_pc: parse_root(symbol),
            quality: parse_quality(symbol),
        }
    }
}

/// Split a symbol into its root pitch class and the number of bytes the root
/// occupies, or `None` if it does not start with a note letter.
fn split_root(symbol: &str) -> Option<(u8, usize)> {
    let mut chars = symbol.char_indices();
    let (_, letter) = chars.next()?;
    let natural = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let mut consumed = letter.len_utf8();
    let mut pc = natural as i16;
    if let Some((idx, acc)) = chars.next() {
        match acc {
            '#' | '♯' => {
                pc += 1;
                consumed = idx + acc.len_utf8();
            }
            'b' | '♭' => {
                pc -= 1;
                consumed = idx + acc.len_utf8();
            }
            _ => {}
        }
    }
    Some((pc.rem_euclid(12) as u8, consumed))
}

/// Root pitch class of a chord symbol; 0 (C) when unreadable.
pub fn parse_root(symbol: &str) -> u8 {
    match split_root(symbol.trim()) {
        Some((pc, _)) => pc,
        None => {
            log::warn!("unreadable chord root in '{symbol}', using C");
            0
        }
    }
}

#[derive(Clone, Copy)]
enum Pattern {
    /// The whole (normalized) remainder must equal the text.
    Exact(&'static str),
    /// The remainder must start with the text.
    Prefix(&'static str),
}

impl Pattern {
    fn matches(self, rest: &str) -> bool {
        match self {
            Pattern::Exact(p) => rest == p,
            Pattern::Prefix(p) => rest.starts_with(p),
        }
    }
}

use Pattern::{Exact, Prefix};

/// Priority-ordered quality patterns. Order matters: the first match wins.
const QUALITY_PATTERNS: &[(Pattern, ChordQuality)] = &[
    // Minor family (and diminished), most specific first.
    (Prefix("m7b5"), ChordQuality::Min7Flat5),
    (Prefix("min7b5"), ChordQuality::Min7Flat5),
    (Prefix("-7b5"), ChordQuality::Min7Flat5),
    (Prefix("ø"), ChordQuality::Min7Flat5),
    (Prefix("mMaj7"), ChordQuality::MinMaj7),
    (Prefix("mmaj7"), ChordQuality::MinMaj7),
    (Prefix("mM7"), ChordQuality::MinMaj7),
    (Prefix("minmaj7"), ChordQuality::MinMaj7),
    (Prefix("-maj7"), ChordQuality::MinMaj7),
    (Prefix("-Δ"), ChordQuality::MinMaj7),
    (Prefix("m7b6"), ChordQuality::Min7Flat6),
    (Prefix("-7b6"), ChordQuality::Min7Flat6),
    (Prefix("mb6"), ChordQuality::Min7Flat6),
    (Prefix("dim7"), ChordQuality::Dim7),
    (Prefix("dim"), ChordQuality::Dim7),
    (Prefix("°"), ChordQuality::Dim7),
    (Prefix("o7"), ChordQuality::Dim7),
    (Exact("o"), ChordQuality::Dim7),
    (Prefix("min"), ChordQuality::Min7),
    (Prefix("m7"), ChordQuality::Min7),
    (Prefix("m9"), ChordQuality::Min7),
    (Prefix("m11"), ChordQuality::Min7),
    (Prefix("m6"), ChordQuality::Min7),
    (Prefix("-"), ChordQuality::Min7),
    (Exact("m"), ChordQuality::Min7),
    // Major family.
    (Prefix("maj7#11"), ChordQuality::Maj7Sharp11),
    (Prefix("maj9#11"), ChordQuality::Maj7Sharp11),
    (Prefix("Δ#11"), ChordQuality::Maj7Sharp11),
    (Prefix("M7#11"), ChordQuality::Maj7Sharp11),
    (Prefix("maj7#5"), ChordQuality::Maj7Sharp5),
    (Prefix("maj7+5"), ChordQuality::Maj7Sharp5),
    (Prefix("Δ#5"), ChordQuality::Maj7Sharp5),
    (Prefix("M7#5"), ChordQuality::Maj7Sharp5),
    (Prefix("+maj7"), ChordQuality::Maj7Sharp5),
    (Exact("+"), ChordQuality::Maj7Sharp5),
    (Exact("aug"), ChordQuality::Maj7Sharp5),
    (Prefix("maj"), ChordQuality::Maj7),
    (Prefix("Δ"), ChordQuality::Maj7),
    (Prefix("M7"), ChordQuality::Maj7),
    (Prefix("M9"), ChordQuality::Maj7),
    (Prefix("6"), ChordQuality::Maj7),
    (Exact("M"), ChordQuality::Maj7),
    (Exact(""), ChordQuality::Maj7),
    // Dominant family.
    (Prefix("7alt"), ChordQuality::Dom7Alt),
    (Prefix("alt"), ChordQuality::Dom7Alt),
    (Prefix("7#9b13"), ChordQuality::Dom7Sharp9Flat13),
    (Prefix("7b13#9"), ChordQuality::Dom7Sharp9Flat13),
    (Prefix("7sus4b9"), ChordQuality::Dom7Sus4Flat9),
    (Prefix("7susb9"), ChordQuality::Dom7Sus4Flat9),
    (Prefix("7sus"), ChordQuality::Dom7Sus4Flat9),
    (Prefix("9sus"), ChordQuality::Dom7Sus4Flat9),
    (Prefix("7#11"), ChordQuality::Dom7Sharp11),
    (Prefix("9#11"), ChordQuality::Dom7Sharp11),
    (Prefix("13#11"), ChordQuality::Dom7Sharp11),
    (Prefix("7b13"), ChordQuality::Dom7Flat13),
    (Prefix("7#5"), ChordQuality::Dom7Sharp5),
    (Prefix("7+5"), ChordQuality::Dom7Sharp5),
    (Prefix("+7"), ChordQuality::Dom7Sharp5),
    (Prefix("aug7"), ChordQuality::Dom7Sharp5),
    (Prefix("7+"), ChordQuality::Dom7Sharp5),
    (Prefix("7b9"), ChordQuality::Dom7Flat9),
    (Prefix("13b9"), ChordQuality::Dom7Flat9),
    (Prefix("7#9"), ChordQuality::Dom7Sharp9),
    (Prefix("7"), ChordQuality::Dom7),
    (Prefix("9"), ChordQuality::Dom7),
    (Prefix("13"), ChordQuality::Dom7),
    (Prefix("11"), ChordQuality::Dom7),
    // Sus.
    (Prefix("sus4b9"), ChordQuality::Sus4Flat9),
    (Prefix("susb9"), ChordQuality::Sus4Flat9),
    (Prefix("sus"), ChordQuality::Sus4Flat9),
];

/// Strip the root, any slash bass, parentheses and commas, and fold unicode
/// accidentals to ASCII.
fn normalized_remainder(symbol: &str) -> String {
    let symbol = symbol.trim();
    let rest = match split_root(symbol) {
        Some((_, consumed)) => &symbol[consumed..],
        None => symbol,
    };
    let rest = rest.split('/').next().unwrap_or("");
    rest.chars()
        .filter(|c| !matches!(c, '(' | ')' | ',' | ' '))
        .map(|c| match c {
            '♭' => 'b',
            '♯' => '#',
            other => other,
        })
        .collect()
}

/// Quality tag of a chord symbol; maj7 when nothing matches.
pub fn parse_quality(symbol: &str) -> ChordQuality {
    let rest = normalized_remainder(symbol);
    for &(pattern, quality) in QUALITY_PATTERNS {
        if pattern.matches(&rest) {
            return quality;
        }
    }
    log::warn!("unrecognized chord quality '{rest}' in '{symbol}', using maj7");
    ChordQuality::Maj7
}
