// Melodic devices: the generators that fill a measure after its target.
//
// Every device implements `Device`: given the measure, the pitch the line is
// currently on and a slot budget, it proposes a short run of `DraftNote`s, one
// per slot, never more than the budget. Devices only choose pitches and rule
// ids. Timing is assigned by the engine and harmonic function by harmony.rs;
// the `hint` a device attaches is what it intended, and is checked (and
// overridden if wrong) when the note is annotated.
//
// `DeviceRegistry` is the lookup table from `DeviceKind` to implementation.
// A kind whose supporting data is missing (an empty cell library) has no
// entry, and `resolve` hands back the arpeggio device in its place.
//
// The cross-measure enclosure is not a registry device: the engine reserves
// two slots for it at the end of a measure, and `enclosure` builds the pair
// from the next measure's target and scale.

use crate::cells::CellLibrary;
use crate::harmony::classify;
use crate::measure::Measure;
use crate::note::{DeviceKind, HarmonicFunction, Rule};
use crate::pitch::{
    PLAYABLE_HIGH, PLAYABLE_LOW, fold_into_range, in_range, nearest_with_pc, next_above, next_below,
};
use crate::scale::ScaleInstance;
use lickgen_prng::LickRng;

/// A pitch proposed by a device, before timing and annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftNote {
    pub midi: u8,
    pub rule: Rule,
    pub device: DeviceKind,
    pub hint: Option<HarmonicFunction>,
}

/// What a device sees when it is invoked.
#[derive(Debug, Clone)]
pub struct DeviceContext<'a> {
    pub measure: &'a Measure,
    pub chord_pcs: Vec<u8>,
    pub scale: ScaleInstance,
    pub current_pitch: u8,
    /// Slots still free before the fill limit.
    pub budget: usize,
}

impl<'a> DeviceContext<'a> {
    pub fn new(measure: &'a Measure, current_pitch: u8, budget: usize) -> Self {
        DeviceContext {
            measure,
            chord_pcs: measure.chord_pitch_classes(),
            scale: measure.scale(),
            current_pitch,
            budget,
        }
    }
}

pub trait Device {
    fn kind(&self) -> DeviceKind;

    /// Propose at most `ctx.budget` notes. An empty result is allowed; the
    /// engine then holds the previous note.
    fn generate(&self, ctx: &DeviceContext<'_>, rng: &mut LickRng) -> Vec<DraftNote>;
}

fn draft(midi: u8, rule: Rule, device: DeviceKind, hint: Option<HarmonicFunction>) -> DraftNote {
    DraftNote {
        midi,
        rule,
        device,
        hint,
    }
}

/// Pick a direction, preferring a random one but turning around when the
/// first step would leave the playable range.
fn choose_direction(
    current: u8,
    rng: &mut LickRng,
    step: impl Fn(u8, bool) -> Option<u8>,
) -> bool {
    let ascending = rng.coin();
    let fits = |up: bool| step(current, up).is_some_and(|p| in_range(p as i16));
    if fits(ascending) { ascending } else { !ascending }
}

/// Walk `count` steps from `start`, stopping early at the range edge.
fn walk(start: u8, count: usize, ascending: bool, step: impl Fn(u8, bool) -> Option<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(count);
    let mut p = start;
    for _ in 0..count {
        match step(p, ascending) {
            Some(next) if in_range(next as i16) => {
                out.push(next);
                p = next;
            }
            _ => break,
        }
    }
    out
}

/// Chord tones in one direction: 3 to 7 notes.
#[derive(Debug, Default)]
pub struct Arpeggio;

impl Device for Arpeggio {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Arpeggio
    }

    fn generate(&self, ctx: &DeviceContext<'_>, rng: &mut LickRng) -> Vec<DraftNote> {
        if ctx.budget == 0 {
            return Vec::new();
        }
        let count = rng.range_usize_inclusive(3, 7).min(ctx.budget);
        let pcs = &ctx.chord_pcs;
        let step = |p: u8, up: bool| if up { next_above(p, pcs) } else { next_below(p, pcs) };
        let ascending = choose_direction(ctx.current_pitch, rng, step);
        let notes: Vec<DraftNote> = walk(ctx.current_pitch, count, ascending, step)
            .into_iter()
            .map(|midi| {
                draft(
                    midi,
                    Rule::ArpeggioStep,
                    DeviceKind::Arpeggio,
                    Some(HarmonicFunction::ChordTone),
                )
            })
            .collect();
        log::trace!(
            "arpeggio {} from {}: {:?}",
            if ascending { "up" } else { "down" },
            ctx.current_pitch,
            notes.iter().map(|n| n.midi).collect::<Vec<_>>()
        );
        notes
    }
}

/// Stepwise scale walk in one direction: 3 to 6 notes.
#[derive(Debug, Default)]
pub struct ScaleRun;

impl Device for ScaleRun {
    fn kind(&self) -> DeviceKind {
        DeviceKind::ScaleRun
    }

    fn generate(&self, ctx: &DeviceContext<'_>, rng: &mut LickRng) -> Vec<DraftNote> {
        if ctx.budget == 0 {
            return Vec::new();
        }
        let count = rng.range_usize_inclusive(3, 6).min(ctx.budget);
        let scale = ctx.scale;
        let step = |p: u8, up: bool| if up { scale.step_above(p) } else { scale.step_below(p) };
        let ascending = choose_direction(ctx.current_pitch, rng, step);
        let notes: Vec<DraftNote> = walk(ctx.current_pitch, count, ascending, step)
            .into_iter()
            .map(|midi| draft(midi, Rule::ScaleStep, DeviceKind::ScaleRun, None))
            .collect();
        log::trace!(
            "scale run {} from {}: {:?}",
            if ascending { "up" } else { "down" },
            ctx.current_pitch,
            notes.iter().map(|n| n.midi).collect::<Vec<_>>()
        );
        notes
    }
}

/// A scale-degree pattern from the cell library. Each degree lands on the
/// octave nearest the note before it, starting from the current pitch.
#[derive(Debug)]
pub struct MelodicCell {
    library: CellLibrary,
}

impl MelodicCell {
    /// `None` when the library has nothing to play.
    pub fn new(library: CellLibrary) -> Option<Self> {
        if library.is_empty() {
            None
        } else {
            Some(MelodicCell { library })
        }
    }
}

impl Device for MelodicCell {
    fn kind(&self) -> DeviceKind {
        DeviceKind::MelodicCell
    }

    fn generate(&self, ctx: &DeviceContext<'_>, rng: &mut LickRng) -> Vec<DraftNote> {
        let Some(cell) = rng.pick(&self.library.cells) else {
            return Vec::new();
        };
        let mut prev = ctx.current_pitch;
        let mut notes = Vec::with_capacity(cell.degrees.len().min(ctx.budget));
        for &degree in cell.degrees.iter().take(ctx.budget) {
            let degree_pc = ctx.scale.degree_pitch(ctx.measure.root_pc, degree) % 12;
            let midi = fold_into_range(nearest_with_pc(prev, degree_pc) as i16);
            notes.push(draft(midi, Rule::CellDegree, DeviceKind::MelodicCell, None));
            prev = midi;
        }
        log::trace!(
            "cell '{}' from {}: {:?}",
            cell.name,
            ctx.current_pitch,
            notes.iter().map(|n| n.midi).collect::<Vec<_>>()
        );
        notes
    }
}

/// Upper (next scale tone) or lower (half step) neighbor, returning to the
/// current pitch when there is room.
#[derive(Debug, Default)]
pub struct Neighbor;

impl Device for Neighbor {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Neighbor
    }

    fn generate(&self, ctx: &DeviceContext<'_>, rng: &mut LickRng) -> Vec<DraftNote> {
        if ctx.budget == 0 {
            return Vec::new();
        }
        let current = ctx.current_pitch;
        let upper = ctx.scale.step_above(current).filter(|&p| p <= PLAYABLE_HIGH);
        let lower = (current > PLAYABLE_LOW).then(|| current - 1);
        let want_upper = rng.coin();
        let (midi, rule, hint) = match (want_upper, upper, lower) {
            (true, Some(u), _) | (false, Some(u), None) => {
                (u, Rule::NeighborUpper, HarmonicFunction::ScaleStep)
            }
            (_, _, Some(l)) => (l, Rule::NeighborLower, HarmonicFunction::Chromatic),
            (_, None, None) => return Vec::new(),
        };
        let mut notes = vec![draft(midi, rule, DeviceKind::Neighbor, Some(hint))];
        if ctx.budget >= 3 {
            notes.push(draft(current, Rule::NeighborReturn, DeviceKind::Neighbor, None));
        }
        log::trace!("neighbor {rule:?} around {current}: {midi}");
        notes
    }
}

/// The two enclosure pitches around `target` under the next measure's
/// harmony: `(upper, lower)`. `None` unless the lower half step classifies
/// as chromatic, the upper scale tone as a scale step, and both are playable.
pub fn enclosure_pitches(next: &Measure, target: u8) -> Option<(u8, u8)> {
    let scale = next.scale();
    let upper = scale.step_above(target)?;
    let lower = target.checked_sub(1)?;
    if !in_range(upper as i16) || !in_range(lower as i16) {
        return None;
    }
    let c = |midi| classify(midi, next.root_pc, next.quality, next.scale_name).function;
    if c(upper) != HarmonicFunction::ScaleStep || c(lower) != HarmonicFunction::Chromatic {
        return None;
    }
    Some((upper, lower))
}

/// Build the cross-measure enclosure onto `target`, in random order.
pub fn enclosure(next: &Measure, target: u8, rng: &mut LickRng) -> Option<[DraftNote; 2]> {
    let (upper, lower) = enclosure_pitches(next, target)?;
    let up = draft(
        upper,
        Rule::EnclosureUpper,
        DeviceKind::Neighbor,
        Some(HarmonicFunction::ScaleStep),
    );
    let down = draft(
        lower,
        Rule::EnclosureLower,
        DeviceKind::Neighbor,
        Some(HarmonicFunction::Chromatic),
    );
    Some(if rng.coin() { [up, down] } else { [down, up] })
}

/// Lookup table from device kind to implementation.
pub struct DeviceRegistry {
    devices: [Option<Box<dyn Device>>; 4],
    fallback: Arpeggio,
}

impl DeviceRegistry {
    pub fn new(cells: CellLibrary) -> Self {
        let cell: Option<Box<dyn Device>> = match MelodicCell::new(cells) {
            Some(device) => Some(Box::new(device)),
            None => {
                log::warn!("cell library is empty; melodic-cell falls back to arpeggio");
                None
            }
        };
        DeviceRegistry {
            devices: [
                Some(Box::new(Arpeggio)),
                Some(Box::new(ScaleRun)),
                cell,
                Some(Box::new(Neighbor)),
            ],
            fallback: Arpeggio,
        }
    }

    /// The implementation for `kind`, or the arpeggio fallback.
    pub fn resolve(&self, kind: DeviceKind) -> &dyn Device {
        match &self.devices[kind.index()] {
            Some(device) => device.as_ref(),
            None => {
                log::debug!("no {kind} device registered, using arpeggio");
                &self.fallback
            }
        }
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new(CellLibrary::default_library())
    }
}
