// MIDI output for licks.
//
// Writes a Standard MIDI File (format 1): a tempo track and one melody track.
// Note times come straight from the lick's beats, so swing survives the
// export. Rests are silence: they emit no events, and the next sounding note
// picks up the accumulated delta.
//
// Uses the `midly` crate for MIDI writing.

use crate::config::LickError;
use crate::note::Lick;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Electric piano; reads clearly for single-line bebop.
const PROGRAM: u8 = 4;

const CHANNEL: u8 = 0;

fn beat_to_tick(beat: f64) -> u32 {
    (beat.max(0.0) * TICKS_PER_QUARTER as f64).round() as u32
}

/// Convert a lick to MIDI and write it to `path`.
pub fn write_midi(lick: &Lick, path: &Path) -> Result<(), LickError> {
    let smf = lick_to_smf(lick);
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| LickError::Encode(e.to_string()))?;
    std::fs::write(path, &buf).map_err(|source| LickError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("wrote {} bytes of MIDI to {}", buf.len(), path.display());
    Ok(())
}

/// Convert a lick to an in-memory SMF.
pub fn lick_to_smf(lick: &Lick) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo
    let tempo = lick.tempo_bpm.max(1) as u32;
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(60_000_000 / tempo))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    let channel = u4::new(CHANNEL);
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(b"Lick")),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(PROGRAM),
                },
            },
        },
    ];

    let mut last_tick: u32 = 0;
    for note in lick.notes.iter().filter(|n| !n.is_rest) {
        let on = beat_to_tick(note.start_beat).max(last_tick);
        let off = beat_to_tick(note.end_beat()).max(on);
        let key = u7::new(note.midi.min(127));
        track.push(TrackEvent {
            delta: u28::new(on - last_tick),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(note.velocity.clamp(1, 127)),
                },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(off - on),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        });
        last_tick = off;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    smf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LickMeta, LickOptions};
    use crate::devices::DeviceRegistry;
    use crate::engine::generate_lick;
    use crate::measure::ChordSpan;
    use lickgen_prng::LickRng;

    fn lick(insert_rests: bool) -> Lick {
        let spans = vec![
            ChordSpan::new(0, 0.0, 4.0, "Cm7"),
            ChordSpan::new(1, 4.0, 4.0, "F7"),
        ];
        let options = LickOptions {
            insert_rests,
            swing: 0.3,
            ..Default::default()
        };
        generate_lick(
            &spans,
            &LickMeta { tempo: 160 },
            &options,
            &DeviceRegistry::default(),
            &mut LickRng::new(2),
        )
    }

    #[test]
    fn one_note_on_per_sounding_note() {
        let l = lick(true);
        let smf = lick_to_smf(&l);
        assert_eq!(smf.tracks.len(), 2);
        let ons = smf.tracks[1]
            .iter()
            .filter(|e| matches!(e.kind, TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. }))
            .count();
        assert_eq!(ons, l.notes.iter().filter(|n| !n.is_rest).count());
    }

    #[test]
    fn track_length_matches_lick() {
        let l = lick(false);
        let smf = lick_to_smf(&l);
        let ticks: u32 = smf.tracks[1].iter().map(|e| e.delta.as_int()).sum();
        assert_eq!(ticks, beat_to_tick(8.0));
    }

    #[test]
    fn writes_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lick.mid");
        write_midi(&lick(true), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
    }
}
