// Measures: one harmonic region of the progression on a half-beat slot grid.
//
// The progression arrives as `ChordSpan`s (bar, start beat, duration, chord
// symbol). Each span becomes a `Measure` with its chord parsed once and its
// scale resolved once under the configured scale strategy. After target
// planning (target.rs) attaches a downbeat, the measure is read-only for the
// rest of the generation call.
//
// Time is stored in beats (quarter notes). The engine works in slots of
// `SLOT_BEATS` and converts back to beats when it emits notes, so per-measure
// durations add up exactly; a span whose length is not a whole number of
// slots has the remainder absorbed by its last note.

use crate::chord::{Chord, ChordQuality, Degree};
use crate::scale::{ScaleInstance, ScaleName, ScaleStrategy, select_scale};
use lickgen_prng::LickRng;
use serde::{Deserialize, Serialize};

/// Length of one slot in beats (an eighth note).
pub const SLOT_BEATS: f64 = 0.5;

/// Tolerance for beat arithmetic.
pub const BEAT_EPSILON: f64 = 1e-9;

/// One harmonic region of the input progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordSpan {
    pub bar: u32,
    pub start_beat: f64,
    pub duration_beats: f64,
    pub symbol: String,
}

impl ChordSpan {
    pub fn new(bar: u32, start_beat: f64, duration_beats: f64, symbol: &str) -> Self {
        ChordSpan {
            bar,
            start_beat,
            duration_beats,
            symbol: symbol.to_string(),
        }
    }
}

/// The chord-tone pitch chosen for a measure's downbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetNote {
    pub midi: u8,
    pub degree: Option<Degree>,
}

/// A measure of the lick: chord, scale, slot grid and (after planning) target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub index: usize,
    pub bar: u32,
    pub measure_start: f64,
    pub duration_beats: f64,
    pub chord_span: ChordSpan,
    pub root_pc: u8,
    pub quality: ChordQuality,
    pub scale_name: ScaleName,
    pub target_note: Option<TargetNote>,
}

impl Measure {
    pub fn end(&self) -> f64 {
        self.measure_start + self.duration_beats
    }

    pub fn midpoint(&self) -> f64 {
        self.measure_start + self.duration_beats / 2.0
    }

    /// Number of whole slots in the measure (at least one).
    pub fn slot_count(&self) -> usize {
        ((self.duration_beats + BEAT_EPSILON) / SLOT_BEATS).floor().max(1.0) as usize
    }

    /// Beat position of a slot index.
    pub fn slot_beat(&self, slot: usize) -> f64 {
        self.measure_start + slot as f64 * SLOT_BEATS
    }

    pub fn contains_beat(&self, beat: f64) -> bool {
        beat >= self.measure_start - BEAT_EPSILON && beat < self.end() - BEAT_EPSILON
    }

    pub fn scale(&self) -> ScaleInstance {
        ScaleInstance::new(self.scale_name, self.root_pc)
    }

    pub fn chord_pitch_classes(&self) -> Vec<u8> {
        crate::chord::chord_pitch_classes(self.root_pc, self.quality)
    }
}

/// Resolve every chord span into a measure: parse the chord and choose its
/// scale. Spans with a non-positive duration are dropped.
pub fn build_measures(spans: &[ChordSpan], strategy: ScaleStrategy, rng: &mut LickRng) -> Vec<Measure> {
    let mut measures = Vec::with_capacity(spans.len());
    for span in spans {
        if span.duration_beats.is_nan() || span.duration_beats <= BEAT_EPSILON {
            log::warn!(
                "skipping chord span '{}' at bar {} with duration {}",
                span.symbol,
                span.bar,
                span.duration_beats
            );
            continue;
        }
        let chord = Chord::parse(&span.symbol);
        let scale_name = select_scale(chord.quality, strategy, rng);
        log::debug!(
            "bar {}: {} -> root {} quality {} scale {}",
            span.bar,
            span.symbol,
            chord.root_pc,
            chord.quality,
            scale_name
        );
        measures.push(Measure {
            index: measures.len(),
            bar: span.bar,
            measure_start: span.start_beat,
            duration_beats: span.duration_beats,
            chord_span: span.clone(),
            root_pc: chord.root_pc,
            quality: chord.quality,
            scale_name,
            target_note: None,
        });
    }
    measures
}
