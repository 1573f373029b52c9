// Lickgen: procedural jazz lick generator
//
// Generates short single-line bebop phrases ("licks") over a chord
// progression and annotates every note with its harmonic role, so renderers
// can color-code chord tones, scale steps and chromatic approach notes.
//
// Architecture:
// - chord.rs: Chord symbol parsing (root + quality) and chord-tone tables
// - scale.rs: Scale definitions, tonal families, per-quality eligible scales,
//   scale-selection strategies
// - pitch.rs: Playable range, octave folding, note names
// - measure.rs: Chord spans -> measures on a half-beat slot grid
// - target.rs: Downbeat target planning with proximity-weighted draws
// - selector.rs: Device strategies and per-invocation device choice
// - cells.rs: Melodic cell library (JSON-loadable, built-in default)
// - devices.rs: Arpeggio / scale-run / melodic-cell / neighbor generators,
//   cross-measure enclosures, device registry with arpeggio fallback
// - engine.rs: Slot-filling state machine, cadence, generation pipeline
// - harmony.rs: Harmonic classification (chord tone / scale step / chromatic)
// - post.rs: Swing and rest insertion
// - audit.rs: Invariant checks over finished licks
// - progression.rs: "Dm7 | G7 | Cmaj7" text -> chord spans
// - midi.rs: MIDI file output
// - config.rs: Options, tuning, boundary errors
//
// Generation is deterministic given a seed: every random draw goes through
// the caller's `LickRng`.

pub mod audit;
pub mod cells;
pub mod chord;
pub mod config;
pub mod devices;
pub mod engine;
pub mod harmony;
pub mod measure;
pub mod midi;
pub mod note;
pub mod pitch;
pub mod post;
pub mod progression;
pub mod scale;
pub mod selector;
pub mod target;

pub use config::{LickError, LickMeta, LickOptions, Tuning};
pub use engine::{generate_base_lick, generate_lick};
pub use lickgen_prng::LickRng;
pub use measure::ChordSpan;
pub use note::{Lick, Note};
