//! WPM and accuracy arithmetic shared by the live readout and the final result.
//!
//! All ratios fall back to a fixed value instead of producing NaN or infinity:
//! WPM is 0 when no time has elapsed, accuracy is 100 when nothing was typed.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::corpus::{Difficulty, ReferenceText};

/// Standard typing-test convention: five characters make one word
pub const CHARS_PER_WORD: f64 = 5.0;

/// Round half toward positive infinity
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn to_count(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        round_half_up(value).min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Positions in `[0, min(typed, reference))` whose characters differ.
/// Characters typed past the end of the reference are not scored.
pub fn count_errors(typed: &str, reference: &ReferenceText) -> usize {
    typed
        .chars()
        .zip(reference.chars().iter().copied())
        .filter(|(t, r)| t != r)
        .count()
}

/// WPM over wall-clock time since start, measured in minutes
pub fn live_wpm(typed_len: usize, elapsed: Duration) -> u32 {
    let elapsed_minutes = elapsed.as_millis() as f64 / 60_000.0;
    if elapsed_minutes == 0.0 {
        return 0;
    }
    let words_typed = typed_len as f64 / CHARS_PER_WORD;
    to_count(words_typed / elapsed_minutes)
}

/// WPM over the start..end span of a finished session, measured in seconds
pub fn final_wpm(typed_len: usize, elapsed_secs: f64) -> u32 {
    if elapsed_secs == 0.0 {
        return 0;
    }
    let words_typed = typed_len as f64 / CHARS_PER_WORD;
    to_count(words_typed / elapsed_secs * 60.0)
}

/// Percentage of scored characters that match. Only the first
/// `reference_len` typed characters are scored.
pub fn accuracy(typed_len: usize, error_count: usize, reference_len: usize) -> u32 {
    let scored = typed_len.min(reference_len);
    if typed_len == 0 || scored == 0 {
        return 100;
    }
    let correct = scored.saturating_sub(error_count) as f64;
    to_count(correct / scored as f64 * 100.0).min(100)
}

/// Readout pushed to the presenter after every tick and accepted input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub time_remaining: u32,
}

/// Frozen snapshot of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub wpm: u32,
    pub accuracy: u32,
    pub elapsed_secs: f64,
    pub total_chars: usize,
    pub difficulty: Difficulty,
    pub duration_secs: u32,
    pub recorded_at: DateTime<Local>,
}

impl SessionResult {
    /// Elapsed time rounded to whole seconds, as shown on the results screen
    pub fn elapsed_display_secs(&self) -> u64 {
        round_half_up(self.elapsed_secs).max(0.0) as u64
    }
}
