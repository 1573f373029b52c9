// The generation pipeline and the per-measure slot filler.
//
// `generate_base_lick` runs the deterministic core:
//
//   spans -> measures (chord + scale) -> targets -> fill each measure
//         -> classification check
//
// and `generate_lick` adds the post-processing pass (swing, then optional
// rests) on top. All randomness comes from the caller's `LickRng`; the rest
// pass draws from a fork so the base lick does not depend on whether rests
// are requested.
//
// Filling a measure is a small state machine over its slot grid:
//
//   slot 0            target note (chord tone, accented)
//   1 .. fill_limit   devices, one note per slot; current_pitch follows the
//                     last emitted note
//   fill_limit ..     either a reserved cross-measure enclosure (2 slots) or,
//                     in the last measure, a cadence note on the nearest chord
//                     tone (2 slots, one beat)
//
// A device that produces nothing holds the previous note for one slot, so
// every iteration advances and the loop is bounded by the slot count. The
// last note of the measure absorbs any part of the measure that is not a
// whole slot, so note durations always sum to the measure duration.

use crate::config::{LickMeta, LickOptions, Tuning};
use crate::devices::{DeviceContext, DeviceRegistry, DraftNote, enclosure};
use crate::harmony::{annotate, classify_note};
use crate::measure::{ChordSpan, Measure, SLOT_BEATS, build_measures};
use crate::note::{DeviceKind, HarmonicFunction, Lick, Note, Rule};
use crate::pitch::{fold_into_range, nearest_with_pc};
use crate::post::{apply_swing, insert_rests};
use crate::selector::DeviceSelector;
use crate::target::{plan_targets, ranked_candidates};
use lickgen_prng::LickRng;

/// Slots taken by an enclosure or a cadence at the end of a measure.
const TAIL_SLOTS: usize = 2;

/// A draft note placed on the slot grid.
#[derive(Debug, Clone, Copy)]
struct Placed {
    draft: DraftNote,
    start_slot: usize,
    slots: usize,
}

/// What closes a measure after its device fill.
enum Tail {
    None,
    Enclosure([DraftNote; 2]),
    Cadence,
}

/// Generate a lick with swing and (if enabled) rests applied.
pub fn generate_lick(
    spans: &[ChordSpan],
    meta: &LickMeta,
    options: &LickOptions,
    registry: &DeviceRegistry,
    rng: &mut LickRng,
) -> Lick {
    let mut rest_rng = rng.fork();
    let mut lick = generate_base_lick(spans, meta, options, registry, rng);
    apply_swing(&mut lick, options.swing);
    if options.insert_rests {
        lick = insert_rests(&lick, &options.tuning, &mut rest_rng);
    }
    lick
}

/// Generate the rest-free, straight-eighth lick.
pub fn generate_base_lick(
    spans: &[ChordSpan],
    meta: &LickMeta,
    options: &LickOptions,
    registry: &DeviceRegistry,
    rng: &mut LickRng,
) -> Lick {
    let mut measures = build_measures(spans, options.scale_strategy, rng);
    plan_targets(&mut measures, options.start_pitch, rng);

    let selector = DeviceSelector::new(options.device_strategy, &options.tuning);
    let mut notes = Vec::new();
    for (i, measure) in measures.iter().enumerate() {
        let next = measures.get(i + 1);
        notes.extend(fill_measure(measure, next, &selector, registry, &options.tuning, rng));
    }

    let mismatched = notes
        .iter()
        .filter(|n| {
            let c = classify_note(n);
            c.function != n.harmonic_function || c.degree != n.degree
        })
        .count();
    if mismatched > 0 {
        log::error!("{mismatched} notes disagree with their harmonic classification");
    }

    log::debug!(
        "generated {} notes over {} measures ({} strategy)",
        notes.len(),
        measures.len(),
        selector.strategy()
    );
    Lick {
        tempo_bpm: meta.tempo,
        measures,
        notes,
    }
}

/// Fill one measure's slot grid, starting from its planned target.
pub fn fill_measure(
    measure: &Measure,
    next: Option<&Measure>,
    selector: &DeviceSelector,
    registry: &DeviceRegistry,
    tuning: &Tuning,
    rng: &mut LickRng,
) -> Vec<Note> {
    let slots = measure.slot_count();
    let target = match measure.target_note {
        Some(t) => t.midi,
        None => {
            log::warn!("bar {} has no planned target; using its root", measure.bar);
            fold_into_range(60 + measure.root_pc as i16)
        }
    };

    let tail = choose_tail(measure, next, selector, tuning, slots, rng);
    let fill_limit = match tail {
        Tail::None => slots,
        Tail::Enclosure(_) | Tail::Cadence => slots - TAIL_SLOTS,
    };

    // The target carries the tag of the first device to play in the measure.
    let mut kind = registry.resolve(selector.pick(rng)).kind();
    let mut placed = vec![Placed {
        draft: DraftNote {
            midi: target,
            rule: Rule::Target,
            device: kind,
            hint: Some(HarmonicFunction::ChordTone),
        },
        start_slot: 0,
        slots: 1,
    }];

    let mut current_slot = 1;
    let mut current_pitch = target;
    let mut iterations = 0;
    while current_slot < fill_limit && iterations < slots {
        if iterations > 0 {
            kind = selector.pick(rng);
        }
        iterations += 1;
        let device = registry.resolve(kind);
        let budget = fill_limit - current_slot;
        let ctx = DeviceContext::new(measure, current_pitch, budget);
        let drafts = device.generate(&ctx, rng);
        if drafts.is_empty() {
            log::trace!("{} produced nothing at slot {current_slot}; holding", device.kind());
            if let Some(last) = placed.last_mut() {
                last.slots += 1;
            }
            current_slot += 1;
            continue;
        }
        for draft in drafts.into_iter().take(budget) {
            placed.push(Placed {
                draft,
                start_slot: current_slot,
                slots: 1,
            });
            current_slot += 1;
            current_pitch = draft.midi;
        }
    }
    if current_slot < fill_limit {
        log::warn!(
            "bar {}: fill stopped at slot {current_slot} of {fill_limit}; holding",
            measure.bar
        );
        if let Some(last) = placed.last_mut() {
            last.slots += fill_limit - current_slot;
        }
    }

    match tail {
        Tail::None => {}
        Tail::Enclosure(pair) => {
            for (k, draft) in pair.into_iter().enumerate() {
                placed.push(Placed {
                    draft,
                    start_slot: fill_limit + k,
                    slots: 1,
                });
            }
        }
        Tail::Cadence => {
            let midi = ranked_candidates(measure.root_pc, measure.quality, current_pitch)
                .first()
                .copied()
                .unwrap_or_else(|| nearest_with_pc(current_pitch, measure.root_pc));
            let device = placed.last().map(|p| p.draft.device).unwrap_or(DeviceKind::Arpeggio);
            placed.push(Placed {
                draft: DraftNote {
                    midi,
                    rule: Rule::Cadence,
                    device,
                    hint: Some(HarmonicFunction::ChordTone),
                },
                start_slot: fill_limit,
                slots: TAIL_SLOTS,
            });
        }
    }

    let count = placed.len();
    let mut overridden = 0;
    let notes: Vec<Note> = placed
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let start_beat = measure.slot_beat(p.start_slot);
            let duration_beats = if i + 1 == count {
                measure.end() - start_beat
            } else {
                p.slots as f64 * SLOT_BEATS
            };
            // Enclosure notes anticipate the next chord and are heard against it.
            let harmony = match (p.draft.rule.is_enclosure(), next) {
                (true, Some(n)) => n,
                _ => measure,
            };
            let mut note = Note {
                start_beat,
                duration_beats,
                midi: p.draft.midi,
                velocity: velocity_for(p.draft.rule, tuning),
                is_rest: false,
                device: p.draft.device,
                rule_id: p.draft.rule,
                harmonic_function: HarmonicFunction::Chromatic,
                degree: None,
                chord_symbol: harmony.chord_span.symbol.clone(),
                root_pc: harmony.root_pc,
                quality: harmony.quality,
                scale_name: harmony.scale_name,
            };
            if annotate(&mut note, p.draft.hint) {
                overridden += 1;
            }
            note
        })
        .collect();

    log::debug!(
        "bar {} ({}): {} notes, {} device hints overridden",
        measure.bar,
        measure.chord_span.symbol,
        notes.len(),
        overridden
    );
    notes
}

/// Decide how the measure ends. The enclosure roll is only taken when the
/// strategy can play neighbor tones and the measure has room.
fn choose_tail(
    measure: &Measure,
    next: Option<&Measure>,
    selector: &DeviceSelector,
    tuning: &Tuning,
    slots: usize,
    rng: &mut LickRng,
) -> Tail {
    if slots <= TAIL_SLOTS {
        return Tail::None;
    }
    let Some(next) = next else {
        return Tail::Cadence;
    };
    if !selector.allows(DeviceKind::Neighbor) || !rng.random_bool(tuning.enclosure_probability) {
        return Tail::None;
    }
    let Some(target) = next.target_note else {
        return Tail::None;
    };
    match enclosure(next, target.midi, rng) {
        Some(pair) => {
            log::debug!(
                "bar {}: enclosing next target {} with {}/{}",
                measure.bar,
                target.midi,
                pair[0].midi,
                pair[1].midi
            );
            Tail::Enclosure(pair)
        }
        None => Tail::None,
    }
}

fn velocity_for(rule: Rule, tuning: &Tuning) -> u8 {
    match rule {
        Rule::Target | Rule::Cadence => tuning.accent_velocity,
        _ => tuning.base_velocity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::BEAT_EPSILON;
    use crate::selector::DeviceStrategy;

    fn ii_v_i() -> Vec<ChordSpan> {
        vec![
            ChordSpan::new(0, 0.0, 4.0, "Dm7"),
            ChordSpan::new(1, 4.0, 4.0, "G7"),
            ChordSpan::new(2, 8.0, 4.0, "Cmaj7"),
            ChordSpan::new(3, 12.0, 4.0, "Cmaj7"),
        ]
    }

    fn base(options: &LickOptions, seed: u64) -> Lick {
        let mut rng = LickRng::new(seed);
        generate_base_lick(
            &ii_v_i(),
            &LickMeta::default(),
            options,
            &DeviceRegistry::default(),
            &mut rng,
        )
    }

    #[test]
    fn measures_are_contiguous_and_exact() {
        for strategy in DeviceStrategy::ALL {
            let options = LickOptions {
                device_strategy: strategy,
                ..Default::default()
            };
            for seed in 0..30 {
                let lick = base(&options, seed);
                for m in &lick.measures {
                    let notes: Vec<&Note> = lick.notes_in(m).collect();
                    assert_eq!(notes[0].start_beat, m.measure_start);
                    assert_eq!(notes[0].rule_id, Rule::Target);
                    assert_eq!(notes[0].harmonic_function, HarmonicFunction::ChordTone);
                    for w in notes.windows(2) {
                        assert!((w[0].end_beat() - w[1].start_beat).abs() < BEAT_EPSILON);
                    }
                    let sum: f64 = notes.iter().map(|n| n.duration_beats).sum();
                    assert!((sum - m.duration_beats).abs() < BEAT_EPSILON, "{strategy} seed {seed}");
                }
            }
        }
    }

    #[test]
    fn last_measure_ends_with_a_one_beat_cadence() {
        for seed in 0..20 {
            let lick = base(&LickOptions::default(), seed);
            let last = lick.notes.last().unwrap();
            assert_eq!(last.rule_id, Rule::Cadence);
            assert_eq!(last.duration_beats, 1.0);
            assert_eq!(last.start_beat, 15.0);
            assert_eq!(last.harmonic_function, HarmonicFunction::ChordTone);
            assert_eq!(last.velocity, Tuning::default().accent_velocity);
        }
    }

    #[test]
    fn enclosures_land_on_the_next_target() {
        let options = LickOptions {
            device_strategy: DeviceStrategy::NeighborEnclosure,
            tuning: Tuning {
                enclosure_probability: 1.0,
                ..Tuning::default()
            },
            ..Default::default()
        };
        let mut seen = 0;
        for seed in 0..40 {
            let lick = base(&options, seed);
            for (i, pair) in lick.notes.windows(3).enumerate() {
                if !(pair[0].rule_id.is_enclosure() && pair[1].rule_id.is_enclosure()) {
                    continue;
                }
                seen += 1;
                let target = &pair[2];
                assert_eq!(target.rule_id, Rule::Target, "note {i}");
                let functions = [pair[0].harmonic_function, pair[1].harmonic_function];
                assert!(functions.contains(&HarmonicFunction::Chromatic));
                assert!(functions.contains(&HarmonicFunction::ScaleStep));
                let lower = pair.iter().take(2).find(|n| n.rule_id == Rule::EnclosureLower).unwrap();
                assert_eq!(lower.midi + 1, target.midi);
                assert_eq!(lower.chord_symbol, target.chord_symbol);
            }
        }
        assert!(seen > 0, "no enclosure was ever eligible");
    }

    #[test]
    fn tiny_measures_hold_their_target() {
        // A half-beat measure holds only its target.
        let spans = vec![ChordSpan::new(0, 0.0, 0.5, "C7"), ChordSpan::new(0, 0.5, 1.0, "F7")];
        let mut rng = LickRng::new(4);
        let lick = generate_base_lick(
            &spans,
            &LickMeta::default(),
            &LickOptions::default(),
            &DeviceRegistry::default(),
            &mut rng,
        );
        let first: Vec<&Note> = lick.notes_in(&lick.measures[0]).collect();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].duration_beats, 0.5);
        let total: f64 = lick.notes.iter().map(|n| n.duration_beats).sum();
        assert!((total - 1.5).abs() < BEAT_EPSILON);
    }

    #[test]
    fn odd_length_measure_absorbs_remainder() {
        let spans = vec![ChordSpan::new(0, 0.0, 2.75, "Dm7"), ChordSpan::new(1, 2.75, 4.0, "G7")];
        let mut rng = LickRng::new(5);
        let lick = generate_base_lick(
            &spans,
            &LickMeta::default(),
            &LickOptions::default(),
            &DeviceRegistry::default(),
            &mut rng,
        );
        let first: Vec<&Note> = lick.notes_in(&lick.measures[0]).collect();
        let sum: f64 = first.iter().map(|n| n.duration_beats).sum();
        assert!((sum - 2.75).abs() < BEAT_EPSILON);
    }

    #[test]
    fn rests_do_not_change_the_base() {
        let options = LickOptions {
            insert_rests: true,
            ..Default::default()
        };
        let straight = LickOptions::default();
        let a = generate_lick(
            &ii_v_i(),
            &LickMeta::default(),
            &options,
            &DeviceRegistry::default(),
            &mut LickRng::new(21),
        );
        let b = generate_lick(
            &ii_v_i(),
            &LickMeta::default(),
            &straight,
            &DeviceRegistry::default(),
            &mut LickRng::new(21),
        );
        let sounding = |l: &Lick| -> Vec<(u64, u8)> {
            l.notes
                .iter()
                .filter(|n| !n.is_rest)
                .map(|n| ((n.start_beat * 1000.0) as u64, n.midi))
                .collect()
        };
        // Every sounding note of the rested lick is a note of the base lick.
        let base_notes = sounding(&b);
        for n in sounding(&a) {
            assert!(base_notes.contains(&n));
        }
    }
}
