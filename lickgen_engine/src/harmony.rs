// Harmonic classification: chord tone, scale step, or chromatic.
//
// `classify` is the single definition of a note's harmonic role. It looks only
// at the pitch class, the chord root, the chord quality and the scale. Devices
// may carry a hint about what they meant to play (an enclosure's lower
// neighbor is "meant" to be chromatic), but `annotate` always overwrites the
// note's harmonic fields with `classify`'s answer and logs any disagreement.

use crate::chord::{ChordQuality, Degree};
use crate::note::{HarmonicFunction, Note};
use crate::scale::ScaleName;

/// Result of classifying one pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub function: HarmonicFunction,
    /// Present exactly when `function` is `ChordTone`.
    pub degree: Option<Degree>,
}

/// Classify a MIDI pitch against a chord and scale rooted on `root_pc`.
pub fn classify(midi: u8, root_pc: u8, quality: ChordQuality, scale: ScaleName) -> Classification {
    let pc = midi % 12;
    let rel = (pc + 12 - root_pc % 12) % 12;

    if quality.interval_mask()[rel as usize] {
        let degree = quality.degree_of(rel);
        if degree.is_none() {
            // Chord masks and degree tables come from the same tone list.
            log::error!("chord tone {rel} of {quality} has no degree label");
        }
        return Classification {
            function: HarmonicFunction::ChordTone,
            degree,
        };
    }

    // The scale is rooted on the chord root, so membership of the absolute
    // pitch class is membership of `rel` in the scale's interval set.
    if scale.interval_mask()[rel as usize] {
        return Classification {
            function: HarmonicFunction::ScaleStep,
            degree: None,
        };
    }

    Classification {
        function: HarmonicFunction::Chromatic,
        degree: None,
    }
}

/// Classify a note from its own fields.
pub fn classify_note(note: &Note) -> Classification {
    classify(note.midi, note.root_pc, note.quality, note.scale_name)
}

/// Attach the harmonic function and degree to a note, replacing whatever a
/// device suggested. Returns `true` when the suggestion was overridden.
pub fn annotate(note: &mut Note, hint: Option<HarmonicFunction>) -> bool {
    let c = classify_note(note);
    note.harmonic_function = c.function;
    note.degree = c.degree;
    match hint {
        Some(h) if h != c.function => {
            log::debug!(
                "{} at beat {:.2}: device hinted {h}, classified {} over {}{}",
                note.midi,
                note.start_beat,
                c.function,
                crate::pitch::pc_name(note.root_pc),
                note.quality
            );
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmaj7_ionian_functions() {
        let c = |m| classify(m, 0, ChordQuality::Maj7, ScaleName::Ionian);
        assert_eq!(c(60).function, HarmonicFunction::ChordTone);
        assert_eq!(c(60).degree, Some(Degree::Root));
        assert_eq!(c(64).degree, Some(Degree::Third));
        assert_eq!(c(67).degree, Some(Degree::Fifth));
        assert_eq!(c(71).degree, Some(Degree::Seventh));
        assert_eq!(c(62).function, HarmonicFunction::ScaleStep);
        assert_eq!(c(77).function, HarmonicFunction::ScaleStep);
        assert_eq!(c(75).function, HarmonicFunction::Chromatic);
        assert_eq!(c(61).function, HarmonicFunction::Chromatic);
    }

    #[test]
    fn root_offset_is_applied() {
        // G7 mixolydian: F is the b7, Ab is chromatic, A is a scale step.
        let g = |m| classify(m, 7, ChordQuality::Dom7, ScaleName::Mixolydian);
        assert_eq!(g(65).degree, Some(Degree::Flat7));
        assert_eq!(g(68).function, HarmonicFunction::Chromatic);
        assert_eq!(g(69).function, HarmonicFunction::ScaleStep);
    }

    #[test]
    fn degree_present_iff_chord_tone() {
        for q in ChordQuality::ALL {
            for s in ScaleName::ALL {
                for midi in 55..=81u8 {
                    let c = classify(midi, 5, q, s);
                    assert_eq!(
                        c.degree.is_some(),
                        c.function == HarmonicFunction::ChordTone,
                        "{midi} over F{q} {s}"
                    );
                }
            }
        }
    }

    #[test]
    fn classification_ignores_octave() {
        for midi in 55..=69u8 {
            assert_eq!(
                classify(midi, 2, ChordQuality::Min7, ScaleName::Dorian),
                classify(midi + 12, 2, ChordQuality::Min7, ScaleName::Dorian)
            );
        }
    }
}
