// Progression text: "Dm7 | G7 | Cmaj7 Am7 | D7" -> chord spans.
//
// Bars are separated by `|`, chords inside a bar by whitespace, and several
// chords in one bar share it evenly. A bar written as `%` repeats the bar
// before it. Leading and trailing bar lines are allowed.

use crate::config::LickError;
use crate::measure::ChordSpan;

/// Parse progression text into chord spans laid end to end from beat 0.
pub fn parse_progression(text: &str, beats_per_bar: f64) -> Result<Vec<ChordSpan>, LickError> {
    if !(beats_per_bar.is_finite() && beats_per_bar > 0.0) {
        return Err(LickError::InvalidProgression {
            bar: 0,
            reason: format!("beats per bar must be positive, got {beats_per_bar}"),
        });
    }
    let mut bars: Vec<&str> = text.split('|').map(str::trim).collect();
    while bars.first().is_some_and(|b| b.is_empty()) {
        bars.remove(0);
    }
    while bars.last().is_some_and(|b| b.is_empty()) {
        bars.pop();
    }
    if bars.is_empty() {
        return Err(LickError::EmptyProgression);
    }

    let mut spans = Vec::new();
    let mut previous: Vec<&str> = Vec::new();
    for (bar, content) in bars.iter().enumerate() {
        let chords: Vec<&str> = match content.split_whitespace().collect::<Vec<_>>() {
            c if c.is_empty() => {
                return Err(LickError::InvalidProgression {
                    bar,
                    reason: "empty bar".to_string(),
                });
            }
            c if c == ["%"] => {
                if previous.is_empty() {
                    return Err(LickError::InvalidProgression {
                        bar,
                        reason: "'%' with no bar to repeat".to_string(),
                    });
                }
                previous.clone()
            }
            c => c,
        };
        for symbol in &chords {
            if !symbol.starts_with(['A', 'B', 'C', 'D', 'E', 'F', 'G']) {
                return Err(LickError::InvalidProgression {
                    bar,
                    reason: format!("'{symbol}' does not start with a note letter"),
                });
            }
        }
        let share = beats_per_bar / chords.len() as f64;
        let bar_start = bar as f64 * beats_per_bar;
        for (k, symbol) in chords.iter().enumerate() {
            spans.push(ChordSpan::new(bar as u32, bar_start + k as f64 * share, share, symbol));
        }
        previous = chords;
    }
    log::debug!("parsed {} bars into {} chord spans", bars.len(), spans.len());
    Ok(spans)
}
