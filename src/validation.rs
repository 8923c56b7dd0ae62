use itertools::Itertools;

/// Longest run of one character accepted before the input is treated as automated
pub const MAX_REPEAT_RUN: usize = 10;

/// Input may be at most this many times the reference length
pub const MAX_LENGTH_FACTOR: usize = 2;

/// Why a submitted input was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RejectReason {
    #[strum(to_string = "input is more than twice the length of the passage")]
    TooLong,
    #[strum(to_string = "suspicious input: one character repeated too many times")]
    RepeatedCharacter,
    #[strum(to_string = "pasting is not allowed during the test")]
    Paste,
}

/// Check a raw input against the bot heuristics. `reference_len` is in characters.
pub fn validate_input(raw: &str, reference_len: usize) -> Result<(), RejectReason> {
    if raw.chars().count() > reference_len.saturating_mul(MAX_LENGTH_FACTOR) {
        return Err(RejectReason::TooLong);
    }

    if raw
        .chars()
        .dedup_with_count()
        .any(|(run, _)| run > MAX_REPEAT_RUN)
    {
        return Err(RejectReason::RepeatedCharacter);
    }

    Ok(())
}
