use crate::stats::SessionResult;

/// Qualitative rating bucket for a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PerformanceTier {
    Expert,
    Advanced,
    Intermediate,
    Beginner,
    #[strum(to_string = "Practice More")]
    NeedsPractice,
}

// (min wpm, min accuracy, tier), checked top to bottom
const THRESHOLDS: [(u32, u32, PerformanceTier); 4] = [
    (60, 98, PerformanceTier::Expert),
    (40, 95, PerformanceTier::Advanced),
    (25, 90, PerformanceTier::Intermediate),
    (15, 85, PerformanceTier::Beginner),
];

pub fn classify(wpm: u32, accuracy: u32) -> PerformanceTier {
    THRESHOLDS
        .iter()
        .find(|(min_wpm, min_acc, _)| wpm >= *min_wpm && accuracy >= *min_acc)
        .map(|(_, _, tier)| *tier)
        .unwrap_or(PerformanceTier::NeedsPractice)
}

/// Results good enough to get the highlighted banner
pub fn celebrates(result: &SessionResult) -> bool {
    result.wpm >= 40 && result.accuracy >= 95
}
