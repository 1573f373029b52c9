// Post-processing: swing feel and rest insertion.
//
// Both passes only transform notes that already exist. Swing moves the
// boundary inside each on-beat pair of eighths; rests replace a run of notes
// with silence. Neither changes a note's pitch or its harmonic fields, and
// both keep every measure's durations summing to the measure length.
//
// Rest insertion works on a copy. Keeping the rest-free lick around and
// calling `insert_rests` again with a different rng gives a different rest
// pattern over the same line.

use crate::config::Tuning;
use crate::measure::{BEAT_EPSILON, Measure, SLOT_BEATS};
use crate::note::{Lick, Note};
use lickgen_prng::LickRng;

fn is_eighth(note: &Note) -> bool {
    (note.duration_beats - SLOT_BEATS).abs() < BEAT_EPSILON
}

fn on_whole_beat(beat: f64) -> bool {
    (beat - beat.round()).abs() < BEAT_EPSILON
}

/// Lengthen the first and shorten the second note of every on-beat pair of
/// eighths: `0.5 + r/6` and `0.5 - r/6`. A ratio of 0 (or NaN) leaves the
/// lick as is.
pub fn apply_swing(lick: &mut Lick, ratio: f64) {
    if ratio.is_nan() || ratio <= 0.0 {
        return;
    }
    let shift = ratio.min(1.0) / 6.0;
    let mut swung = 0;
    let mut i = 0;
    while i + 1 < lick.notes.len() {
        let (a, b) = (&lick.notes[i], &lick.notes[i + 1]);
        let same_measure = lick
            .measures
            .iter()
            .any(|m| m.contains_beat(a.start_beat) && m.contains_beat(b.start_beat));
        if on_whole_beat(a.start_beat)
            && is_eighth(a)
            && is_eighth(b)
            && (a.end_beat() - b.start_beat).abs() < BEAT_EPSILON
            && same_measure
        {
            lick.notes[i].duration_beats = SLOT_BEATS + shift;
            lick.notes[i + 1].start_beat += shift;
            lick.notes[i + 1].duration_beats = SLOT_BEATS - shift;
            swung += 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    log::debug!("swing {ratio:.2}: {swung} pairs adjusted");
}

/// Return a copy of `base` with rests inserted. `base` is left untouched.
pub fn insert_rests(base: &Lick, tuning: &Tuning, rng: &mut LickRng) -> Lick {
    let notes = &base.notes;
    let mut out = Vec::with_capacity(notes.len());
    let mut i = 0;
    while i < notes.len() {
        let Some(measure) = base
            .measures
            .iter()
            .find(|m| m.contains_beat(notes[i].start_beat))
        else {
            out.push(notes[i].clone());
            i += 1;
            continue;
        };
        let end = i + notes[i..]
            .iter()
            .take_while(|n| measure.contains_beat(n.start_beat))
            .count();
        out.extend(rest_measure(measure, &notes[i..end], tuning, rng));
        i = end;
    }
    Lick {
        tempo_bpm: base.tempo_bpm,
        measures: base.measures.clone(),
        notes: out,
    }
}

/// A note may become a rest if it is not the first of its measure, not a
/// target, enclosure or cadence, and not already silent.
fn rest_eligible(notes: &[Note], k: usize) -> bool {
    k > 0 && !notes[k].is_rest && !notes[k].rule_id.is_protected()
}

/// At most one rest region per measure: a run of eligible notes merged into
/// a single rest, split at the midpoint if it crosses it. A measure that
/// already holds a rest is left alone, so a second pass changes nothing.
fn rest_measure(measure: &Measure, notes: &[Note], tuning: &Tuning, rng: &mut LickRng) -> Vec<Note> {
    if notes.len() < 2 || notes.iter().any(|n| n.is_rest) {
        return notes.to_vec();
    }
    if !rng.random_bool(tuning.rest_probability) {
        return notes.to_vec();
    }
    let eligible: Vec<usize> = (0..notes.len()).filter(|&k| rest_eligible(notes, k)).collect();
    let Some(&first) = rng.pick(&eligible) else {
        return notes.to_vec();
    };
    let want = rng.range_usize_inclusive(1, tuning.max_rest_notes.max(1));
    let mut last = first;
    while last + 1 < notes.len() && last + 1 - first < want && rest_eligible(notes, last + 1) {
        last += 1;
    }

    let start = notes[first].start_beat;
    let end = notes[last].end_beat().min(measure.end());
    let mid = measure.midpoint();
    let mut rests = Vec::with_capacity(2);
    if start < mid - BEAT_EPSILON && end > mid + BEAT_EPSILON {
        let second = notes[first..=last]
            .iter()
            .rev()
            .find(|n| n.start_beat <= mid + BEAT_EPSILON)
            .unwrap_or(&notes[first]);
        rests.push(Note {
            duration_beats: mid - start,
            ..notes[first].to_rest()
        });
        rests.push(Note {
            start_beat: mid,
            duration_beats: end - mid,
            ..second.to_rest()
        });
    } else {
        rests.push(Note {
            duration_beats: end - start,
            ..notes[first].to_rest()
        });
    }
    log::trace!(
        "bar {}: rest over notes {first}..={last} ({:.2}-{:.2})",
        measure.bar,
        start,
        end
    );

    let mut out = Vec::with_capacity(notes.len());
    out.extend_from_slice(&notes[..first]);
    out.extend(rests);
    out.extend_from_slice(&notes[last + 1..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::ChordQuality;
    use crate::measure::ChordSpan;
    use crate::note::{DeviceKind, HarmonicFunction, Rule};
    use crate::scale::ScaleName;

    fn measure(start: f64) -> Measure {
        Measure {
            index: 0,
            bar: 0,
            measure_start: start,
            duration_beats: 4.0,
            chord_span: ChordSpan::new(0, start, 4.0, "Cmaj7"),
            root_pc: 0,
            quality: ChordQuality::Maj7,
            scale_name: ScaleName::Ionian,
            target_note: None,
        }
    }

    /// Eight eighth notes: a target then scale steps.
    fn eighths() -> Lick {
        let notes = (0..8)
            .map(|k| Note {
                start_beat: k as f64 * 0.5,
                duration_beats: 0.5,
                midi: 60 + k as u8,
                velocity: 80,
                is_rest: false,
                device: DeviceKind::ScaleRun,
                rule_id: if k == 0 { Rule::Target } else { Rule::ScaleStep },
                harmonic_function: HarmonicFunction::ScaleStep,
                degree: None,
                chord_symbol: "Cmaj7".to_string(),
                root_pc: 0,
                quality: ChordQuality::Maj7,
                scale_name: ScaleName::Ionian,
            })
            .collect();
        Lick {
            tempo_bpm: 120,
            measures: vec![measure(0.0)],
            notes,
        }
    }

    #[test]
    fn swing_pairs_sum_to_one_beat() {
        let mut lick = eighths();
        apply_swing(&mut lick, 1.0);
        for pair in lick.notes.chunks(2) {
            assert!((pair[0].duration_beats - (0.5 + 1.0 / 6.0)).abs() < 1e-12);
            assert!((pair[0].duration_beats + pair[1].duration_beats - 1.0).abs() < 1e-12);
            assert!((pair[0].end_beat() - pair[1].start_beat).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_swing_is_a_no_op() {
        let mut lick = eighths();
        apply_swing(&mut lick, 0.0);
        assert_eq!(lick.notes, eighths().notes);
    }

    #[test]
    fn nan_swing_is_a_no_op() {
        let mut lick = eighths();
        apply_swing(&mut lick, f64::NAN);
        assert_eq!(lick.notes, eighths().notes);
    }

    #[test]
    fn offbeat_pairs_are_not_swung() {
        let mut lick = eighths();
        lick.notes.remove(0);
        lick.notes[0].start_beat = 0.0;
        lick.notes[0].duration_beats = 1.0;
        apply_swing(&mut lick, 0.6);
        // 1.0-beat note, then three pairs on beats 1, 2, 3.
        assert_eq!(lick.notes[0].duration_beats, 1.0);
        assert!(lick.notes[1].duration_beats > 0.5);
        assert!(lick.notes[2].duration_beats < 0.5);
    }

    #[test]
    fn rests_respect_measure_rules() {
        let tuning = Tuning {
            rest_probability: 1.0,
            max_rest_notes: 4,
            ..Tuning::default()
        };
        let base = eighths();
        for seed in 0..200 {
            let mut rng = LickRng::new(seed);
            let lick = insert_rests(&base, &tuning, &mut rng);
            let m = &lick.measures[0];
            assert!(!lick.notes[0].is_rest);
            let sum: f64 = lick.notes.iter().map(|n| n.duration_beats).sum();
            assert!((sum - 4.0).abs() < BEAT_EPSILON);
            assert!(lick.notes.iter().any(|n| n.is_rest));
            for n in lick.notes.iter().filter(|n| n.is_rest) {
                assert!(
                    !(n.start_beat < m.midpoint() - BEAT_EPSILON && n.end_beat() > m.midpoint() + BEAT_EPSILON),
                    "seed {seed}: rest {:.2}-{:.2} crosses the midpoint",
                    n.start_beat,
                    n.end_beat()
                );
            }
        }
        // The base is never touched.
        assert!(base.notes.iter().all(|n| !n.is_rest));
    }

    #[test]
    fn protected_notes_never_rest() {
        let tuning = Tuning {
            rest_probability: 1.0,
            ..Tuning::default()
        };
        let mut base = eighths();
        for n in base.notes.iter_mut().skip(1) {
            n.rule_id = Rule::EnclosureLower;
        }
        let mut rng = LickRng::new(1);
        let lick = insert_rests(&base, &tuning, &mut rng);
        assert_eq!(lick.notes, base.notes);
    }

    #[test]
    fn same_seed_same_rests() {
        let base = eighths();
        let tuning = Tuning {
            rest_probability: 1.0,
            ..Tuning::default()
        };
        let a = insert_rests(&base, &tuning, &mut LickRng::new(77));
        let b = insert_rests(&base, &tuning, &mut LickRng::new(77));
        assert_eq!(a.notes, b.notes);
    }

    /// Two measures of eighths, so a pass can rest in both.
    fn two_bars() -> Lick {
        let mut lick = eighths();
        let second: Vec<Note> = lick
            .notes
            .iter()
            .map(|n| Note {
                start_beat: n.start_beat + 4.0,
                ..n.clone()
            })
            .collect();
        lick.notes.extend(second);
        lick.measures.push(Measure {
            index: 1,
            bar: 1,
            ..measure(4.0)
        });
        lick
    }

    #[test]
    fn second_rest_pass_changes_nothing() {
        let tuning = Tuning {
            rest_probability: 1.0,
            max_rest_notes: 1,
            ..Tuning::default()
        };
        let base = two_bars();
        for seed in 0..50 {
            let once = insert_rests(&base, &tuning, &mut LickRng::new(seed));
            let twice = insert_rests(&once, &tuning, &mut LickRng::new(seed + 1000));
            assert_eq!(once.notes, twice.notes, "seed {seed}");
            for m in &twice.measures {
                let notes: Vec<&Note> = twice.notes.iter().filter(|n| m.contains_beat(n.start_beat)).collect();
                let regions = notes
                    .windows(2)
                    .filter(|w| w[1].is_rest && !w[0].is_rest)
                    .count();
                assert!(regions <= 1, "seed {seed}: bar {} has {regions} rest regions", m.bar);
            }
        }
    }
}
