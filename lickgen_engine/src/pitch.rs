// Pitch helpers: the playable range, octave folding, and note names.
//
// Every pitch the generator emits lies in `PLAYABLE_LOW..=PLAYABLE_HIGH`.
// Pitches that wander outside are moved by whole octaves, never snapped to a
// different pitch class, so a device's harmonic intent survives the fold.

/// Lowest playable MIDI pitch (G3).
pub const PLAYABLE_LOW: u8 = 55;
/// Highest playable MIDI pitch (A5).
pub const PLAYABLE_HIGH: u8 = 81;

pub fn in_range(pitch: i16) -> bool {
    (PLAYABLE_LOW as i16..=PLAYABLE_HIGH as i16).contains(&pitch)
}

/// Move a pitch by octaves until it lies in the playable range.
///
/// The range spans more than an octave, so this always terminates with the
/// same pitch class.
pub fn fold_into_range(pitch: i16) -> u8 {
    let mut p = pitch;
    while p < PLAYABLE_LOW as i16 {
        p += 12;
    }
    while p > PLAYABLE_HIGH as i16 {
        p -= 12;
    }
    p as u8
}

/// Pitch class of a MIDI pitch.
pub fn pc(pitch: u8) -> u8 {
    pitch % 12
}

/// All playable pitches whose pitch class is in `pcs`, ascending.
pub fn playable_pitches(pcs: &[u8]) -> Vec<u8> {
    (PLAYABLE_LOW..=PLAYABLE_HIGH)
        .filter(|&p| pcs.contains(&pc(p)))
        .collect()
}

/// Nearest pitch strictly above `pitch` whose class is in `pcs`.
pub fn next_above(pitch: u8, pcs: &[u8]) -> Option<u8> {
    (1..=12u8)
        .map(|d| pitch.saturating_add(d))
        .find(|&p| pcs.contains(&pc(p)))
}

/// Nearest pitch strictly below `pitch` whose class is in `pcs`.
pub fn next_below(pitch: u8, pcs: &[u8]) -> Option<u8> {
    (1..=12u8)
        .filter(|&d| d <= pitch)
        .map(|d| pitch - d)
        .find(|&p| pcs.contains(&pc(p)))
}

/// Nearest pitch (either direction, ties go down) with pitch class `target_pc`.
pub fn nearest_with_pc(pitch: u8, target_pc: u8) -> u8 {
    let up = (target_pc as i16 - pc(pitch) as i16).rem_euclid(12);
    let down = 12 - up;
    if up == 0 {
        pitch
    } else if down <= up {
        (pitch as i16 - down).max(0) as u8
    } else {
        (pitch as i16 + up).min(127) as u8
    }
}

/// Compact note name for a MIDI pitch, e.g. "C4", "F#3", "Bb5".
pub fn pitch_name(pitch: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
    ];
    let octave = pitch as i16 / 12 - 1;
    format!("{}{}", NAMES[pc(pitch) as usize], octave)
}

/// Name of a bare pitch class, e.g. for chord roots.
pub fn pc_name(pitch_class: u8) -> &'static str {
    match pitch_class % 12 {
        0 => "C",
        1 => "C#",
        2 => "D",
        3 => "Eb",
        4 => "E",
        5 => "F",
        6 => "F#",
        7 => "G",
        8 => "Ab",
        9 => "A",
        10 => "Bb",
        _ => "B",
    }
}
