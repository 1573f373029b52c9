// Invariant audit for generated licks.
//
// `audit_lick` re-checks a finished lick from the outside and reports every
// violation it finds instead of stopping at the first. It backs the CLI's
// `--check` flag and the integration tests. A lick straight from the
// generator should always come back clean; the checks are:
//
// - every note's harmonic function and degree match `classify`, and a degree
//   is present exactly on chord tones
// - every pitch is playable
// - each measure starts with a sounding chord tone on its downbeat, its notes
//   are contiguous and their durations sum to the measure length
// - no rest straddles a measure's midpoint
// - each enclosure is one chromatic and one scale-step note, immediately
//   followed by the target it encloses, the lower note a half step below it

use crate::harmony::classify_note;
use crate::measure::BEAT_EPSILON;
use crate::note::{HarmonicFunction, Lick, Note, Rule};
use crate::pitch::{PLAYABLE_HIGH, PLAYABLE_LOW};
use std::fmt;

/// Tolerance for sums of swung durations.
const SUM_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub enum AuditIssue {
    Classification { beat: f64, midi: u8 },
    DegreeMismatch { beat: f64, midi: u8 },
    OutOfRange { beat: f64, midi: u8 },
    EmptyMeasure { bar: u32 },
    Downbeat { bar: u32, reason: &'static str },
    Discontiguous { bar: u32, beat: f64 },
    MeasureSum { bar: u32, expected: f64, actual: f64 },
    RestAcrossMidpoint { bar: u32, beat: f64 },
    Enclosure { beat: f64, reason: &'static str },
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditIssue::Classification { beat, midi } => {
                write!(f, "beat {beat:.2}: note {midi} disagrees with its classification")
            }
            AuditIssue::DegreeMismatch { beat, midi } => {
                write!(f, "beat {beat:.2}: note {midi} has a degree iff-chord-tone mismatch")
            }
            AuditIssue::OutOfRange { beat, midi } => write!(
                f,
                "beat {beat:.2}: note {midi} outside {PLAYABLE_LOW}-{PLAYABLE_HIGH}"
            ),
            AuditIssue::EmptyMeasure { bar } => write!(f, "bar {bar}: no notes"),
            AuditIssue::Downbeat { bar, reason } => write!(f, "bar {bar}: downbeat {reason}"),
            AuditIssue::Discontiguous { bar, beat } => {
                write!(f, "bar {bar}: gap or overlap at beat {beat:.2}")
            }
            AuditIssue::MeasureSum {
                bar,
                expected,
                actual,
            } => write!(f, "bar {bar}: durations sum to {actual:.4}, expected {expected:.4}"),
            AuditIssue::RestAcrossMidpoint { bar, beat } => {
                write!(f, "bar {bar}: rest at beat {beat:.2} crosses the midpoint")
            }
            AuditIssue::Enclosure { beat, reason } => {
                write!(f, "beat {beat:.2}: enclosure {reason}")
            }
        }
    }
}

/// Check a lick against the generator's invariants.
pub fn audit_lick(lick: &Lick) -> Vec<AuditIssue> {
    let mut issues = Vec::new();
    for note in &lick.notes {
        audit_note(note, &mut issues);
    }
    audit_measures(lick, &mut issues);
    audit_enclosures(&lick.notes, &mut issues);
    if !issues.is_empty() {
        log::warn!("audit found {} issues", issues.len());
    }
    issues
}

fn audit_note(note: &Note, issues: &mut Vec<AuditIssue>) {
    let (beat, midi) = (note.start_beat, note.midi);
    let c = classify_note(note);
    if c.function != note.harmonic_function || c.degree != note.degree {
        issues.push(AuditIssue::Classification { beat, midi });
    }
    if note.degree.is_some() != (note.harmonic_function == HarmonicFunction::ChordTone) {
        issues.push(AuditIssue::DegreeMismatch { beat, midi });
    }
    if !(PLAYABLE_LOW..=PLAYABLE_HIGH).contains(&midi) {
        issues.push(AuditIssue::OutOfRange { beat, midi });
    }
}

fn audit_measures(lick: &Lick, issues: &mut Vec<AuditIssue>) {
    for m in &lick.measures {
        let notes: Vec<&Note> = lick.notes_in(m).collect();
        let Some(first) = notes.first() else {
            issues.push(AuditIssue::EmptyMeasure { bar: m.bar });
            continue;
        };
        if (first.start_beat - m.measure_start).abs() > BEAT_EPSILON {
            issues.push(AuditIssue::Downbeat {
                bar: m.bar,
                reason: "does not start the measure",
            });
        }
        if first.is_rest {
            issues.push(AuditIssue::Downbeat {
                bar: m.bar,
                reason: "is a rest",
            });
        }
        if first.harmonic_function != HarmonicFunction::ChordTone {
            issues.push(AuditIssue::Downbeat {
                bar: m.bar,
                reason: "is not a chord tone",
            });
        }
        for w in notes.windows(2) {
            if (w[0].end_beat() - w[1].start_beat).abs() > SUM_EPSILON {
                issues.push(AuditIssue::Discontiguous {
                    bar: m.bar,
                    beat: w[1].start_beat,
                });
            }
        }
        let actual: f64 = notes.iter().map(|n| n.duration_beats).sum();
        if (actual - m.duration_beats).abs() > SUM_EPSILON {
            issues.push(AuditIssue::MeasureSum {
                bar: m.bar,
                expected: m.duration_beats,
                actual,
            });
        }
        let mid = m.midpoint();
        for rest in notes.iter().filter(|n| n.is_rest) {
            if rest.start_beat < mid - BEAT_EPSILON && rest.end_beat() > mid + BEAT_EPSILON {
                issues.push(AuditIssue::RestAcrossMidpoint {
                    bar: m.bar,
                    beat: rest.start_beat,
                });
            }
        }
    }
}

fn audit_enclosures(notes: &[Note], issues: &mut Vec<AuditIssue>) {
    let mut i = 0;
    while i < notes.len() {
        if !notes[i].rule_id.is_enclosure() {
            i += 1;
            continue;
        }
        let beat = notes[i].start_beat;
        let (Some(second), Some(target)) = (notes.get(i + 1), notes.get(i + 2)) else {
            issues.push(AuditIssue::Enclosure {
                beat,
                reason: "is not followed by a partner and a target",
            });
            break;
        };
        let pair = [&notes[i], second];
        if !second.rule_id.is_enclosure() || pair[0].rule_id == pair[1].rule_id {
            issues.push(AuditIssue::Enclosure {
                beat,
                reason: "is not an upper/lower pair",
            });
            i += 1;
            continue;
        }
        if target.rule_id != Rule::Target {
            issues.push(AuditIssue::Enclosure {
                beat,
                reason: "does not resolve to a target",
            });
        }
        for n in pair {
            let ok = match n.rule_id {
                Rule::EnclosureLower => {
                    n.harmonic_function == HarmonicFunction::Chromatic && n.midi + 1 == target.midi
                }
                _ => n.harmonic_function == HarmonicFunction::ScaleStep && n.midi > target.midi,
            };
            if !ok {
                issues.push(AuditIssue::Enclosure {
                    beat: n.start_beat,
                    reason: "note has the wrong pitch or function",
                });
            }
        }
        i += 2;
    }
}
