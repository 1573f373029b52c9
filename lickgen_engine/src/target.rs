// Target planning: the chord tone each measure lands on at its downbeat.
//
// Measures are planned left to right. For each one, every playable pitch that
// is a chord tone becomes a candidate; candidates are ordered by distance
// from the previous downbeat and one is drawn with a three-tier policy:
//
//   50%            one of the two closest candidates
//   30% (if >= 4)  one of the next two
//   remainder      any candidate, uniformly
//
// This keeps downbeats melodically connected while still allowing the odd
// leap. All targets are planned before any measure is filled, so the device
// engine can aim an enclosure at the next measure's target.

use crate::chord::ChordQuality;
use crate::measure::{Measure, TargetNote};
use crate::pitch::{nearest_with_pc, pc, playable_pitches};
use lickgen_prng::LickRng;

/// Probability of drawing from the two closest candidates.
const NEAREST_TIER: f64 = 0.5;
/// Probability (cumulative with the first tier) of the next two.
const SECOND_TIER: f64 = 0.8;

/// Chord-tone pitches in the playable range, nearest to `last_midi` first.
/// Equal distances keep ascending pitch order.
pub fn ranked_candidates(root_pc: u8, quality: ChordQuality, last_midi: u8) -> Vec<u8> {
    let pcs = crate::chord::chord_pitch_classes(root_pc, quality);
    let mut candidates = playable_pitches(&pcs);
    candidates.sort_by_key(|&p| (p as i16 - last_midi as i16).unsigned_abs());
    candidates
}

/// Draw one candidate with the tiered proximity policy.
pub fn pick_tiered(candidates: &[u8], rng: &mut LickRng) -> Option<u8> {
    if candidates.is_empty() {
        return None;
    }
    let roll = rng.next_f64();
    let pool = if roll < NEAREST_TIER {
        &candidates[..candidates.len().min(2)]
    } else if roll < SECOND_TIER && candidates.len() >= 4 {
        &candidates[2..4]
    } else {
        candidates
    };
    rng.pick(pool).copied()
}

/// Choose and attach a target note to every measure.
///
/// `start_pitch` seeds the proximity ranking for the first measure.
pub fn plan_targets(measures: &mut [Measure], start_pitch: u8, rng: &mut LickRng) {
    let mut last_midi = start_pitch;
    for measure in measures.iter_mut() {
        let candidates = ranked_candidates(measure.root_pc, measure.quality, last_midi);
        // Every quality contains its root, so the candidate list is never
        // empty in practice.
        let midi = pick_tiered(&candidates, rng)
            .unwrap_or_else(|| nearest_with_pc(last_midi, measure.root_pc));
        let rel = (pc(midi) + 12 - measure.root_pc) % 12;
        let degree = measure.quality.degree_of(rel);
        if degree.is_none() {
            log::error!(
                "target {} over bar {} ({}) is not a chord tone",
                midi,
                measure.bar,
                measure.chord_span.symbol
            );
        }
        log::debug!(
            "bar {} target {} (degree {})",
            measure.bar,
            crate::pitch::pitch_name(midi),
            degree.map(|d| d.label()).unwrap_or("?")
        );
        measure.target_note = Some(TargetNote { midi, degree });
        last_midi = midi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{ChordSpan, build_measures};
    use crate::pitch::{PLAYABLE_HIGH, PLAYABLE_LOW};
    use crate::scale::ScaleStrategy;

    #[test]
    fn candidates_are_chord_tones_sorted_by_distance() {
        let c = ranked_candidates(0, ChordQuality::Maj7, 66);
        assert_eq!(&c[..3], &[67, 64, 71]);
        let mut last = 0;
        for &p in &c {
            assert!([0, 4, 7, 11].contains(&(p % 12)));
            assert!((PLAYABLE_LOW..=PLAYABLE_HIGH).contains(&p));
            let d = (p as i16 - 66).unsigned_abs();
            assert!(d >= last);
            last = d;
        }
    }

    #[test]
    fn tiered_pick_favors_the_nearest() {
        let candidates = ranked_candidates(0, ChordQuality::Maj7, 64);
        let mut rng = LickRng::new(8);
        let n = 10_000;
        let near = (0..n)
            .filter(|_| {
                let p = pick_tiered(&candidates, &mut rng).unwrap();
                candidates[..2].contains(&p)
            })
            .count();
        // 50% tier plus the uniform tier's share of the first two.
        let pct = near as f64 / n as f64;
        assert!((0.50..0.62).contains(&pct), "nearest share was {:.1}%", pct * 100.0);
    }

    #[test]
    fn tiered_pick_small_lists() {
        let mut rng = LickRng::new(9);
        assert_eq!(pick_tiered(&[], &mut rng), None);
        for _ in 0..100 {
            let p = pick_tiered(&[60, 64, 67], &mut rng).unwrap();
            assert!([60, 64, 67].contains(&p));
        }
    }

    #[test]
    fn every_measure_gets_a_chord_tone_target() {
        let spans = vec![
            ChordSpan::new(0, 0.0, 4.0, "Dm7"),
            ChordSpan::new(1, 4.0, 4.0, "G7alt"),
            ChordSpan::new(2, 8.0, 4.0, "Cmaj7"),
            ChordSpan::new(3, 12.0, 4.0, "Bdim7"),
        ];
        let mut rng = LickRng::new(10);
        let mut measures = build_measures(&spans, ScaleStrategy::Default, &mut rng);
        plan_targets(&mut measures, 67, &mut rng);
        for m in &measures {
            let t = m.target_note.expect("target planned");
            assert!(t.degree.is_some(), "bar {} target {} has no degree", m.bar, t.midi);
            assert!(m.chord_pitch_classes().contains(&(t.midi % 12)));
        }
    }
}
