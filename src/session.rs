use chrono::{DateTime, Local};
use std::time::SystemTime;

use crate::clock::{time_diff_ms, Clock, SystemClock};
use crate::corpus::{Difficulty, ReferenceText};
use crate::presenter::Presenter;
use crate::stats::{self, LiveStats, SessionResult};
use crate::validation::{validate_input, RejectReason};

/// Length and passage tier of a test. Fixed for the lifetime of a session.
/// Only built through `new`, so the duration is always at least one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    duration_secs: u32,
    difficulty: Difficulty,
}

impl SessionConfig {
    /// A zero duration is bumped to one second
    pub fn new(duration_secs: u32, difficulty: Difficulty) -> Self {
        Self {
            duration_secs: duration_secs.max(1),
            difficulty,
        }
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(60, Difficulty::Easy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// Whether a state-guarded call took effect
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Ignored,
}

impl Transition {
    pub fn applied(self) -> bool {
        self == Transition::Applied
    }
}

#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Not running; nothing changed
    Ignored,
    /// Failed validation; nothing changed
    Rejected(RejectReason),
    Accepted(LiveStats),
    /// Input reached the end of the passage and finished the session
    Completed(SessionResult),
}

#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Ignored,
    Counted(LiveStats),
    /// The countdown hit zero and finished the session
    Expired(SessionResult),
}

/// How a reference position should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharState {
    Correct,
    Incorrect,
    Current,
    Pending,
}

/// A single typing test: Idle -> Running -> Finished
#[derive(Debug)]
pub struct TypingSession<C: Clock = SystemClock> {
    config: SessionConfig,
    reference: ReferenceText,
    clock: C,
    state: SessionState,
    typed: Vec<char>,
    error_count: usize,
    started_at: Option<SystemTime>,
    ended_at: Option<SystemTime>,
    time_remaining: u32,
    result: Option<SessionResult>,
}

impl TypingSession<SystemClock> {
    pub fn new(reference: ReferenceText, config: SessionConfig) -> Self {
        Self::with_clock(reference, config, SystemClock)
    }
}

impl<C: Clock> TypingSession<C> {
    pub fn with_clock(reference: ReferenceText, config: SessionConfig, clock: C) -> Self {
        Self {
            time_remaining: config.duration_secs,
            config,
            reference,
            clock,
            state: SessionState::Idle,
            typed: Vec::new(),
            error_count: 0,
            started_at: None,
            ended_at: None,
            result: None,
        }
    }

    /// Bind a new passage and config and return to Idle. Refused while running;
    /// the host must `reset` first so the countdown is stopped.
    pub fn arm(&mut self, reference: ReferenceText, config: SessionConfig) -> Transition {
        if self.state == SessionState::Running {
            tracing::debug!("arm ignored while running");
            return Transition::Ignored;
        }
        self.reference = reference;
        self.config = config;
        self.clear();
        tracing::debug!(
            len = self.reference.len(),
            duration = config.duration_secs,
            difficulty = %config.difficulty,
            "session armed"
        );
        Transition::Applied
    }

    pub fn start(&mut self) -> Transition {
        if self.state != SessionState::Idle {
            return Transition::Ignored;
        }
        self.state = SessionState::Running;
        self.started_at = Some(self.clock.now());
        self.time_remaining = self.config.duration_secs;
        tracing::debug!(duration = self.config.duration_secs, "session started");
        Transition::Applied
    }

    /// Replace the typed text with `raw`. Only the first `N` characters are scored.
    pub fn submit_input<P: Presenter + ?Sized>(
        &mut self,
        raw: &str,
        presenter: &mut P,
    ) -> InputOutcome {
        if self.state != SessionState::Running {
            return InputOutcome::Ignored;
        }

        if let Err(reason) = validate_input(raw, self.reference.len()) {
            tracing::warn!(%reason, len = raw.chars().count(), "input rejected");
            presenter.on_input_rejected(reason);
            return InputOutcome::Rejected(reason);
        }

        self.typed = raw.chars().collect();
        self.error_count = stats::count_errors(raw, &self.reference);

        let live = self.live_stats();
        presenter.on_stats_updated(live);

        if self.typed.len() >= self.reference.len() {
            if let Some(result) = self.finish(presenter) {
                return InputOutcome::Completed(result);
            }
        }
        InputOutcome::Accepted(live)
    }

    /// One second of countdown
    pub fn tick<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> TickOutcome {
        if self.state != SessionState::Running {
            return TickOutcome::Ignored;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        let live = self.live_stats();
        presenter.on_stats_updated(live);

        if self.time_remaining == 0 {
            if let Some(result) = self.finish(presenter) {
                return TickOutcome::Expired(result);
            }
        }
        TickOutcome::Counted(live)
    }

    /// Freeze the result. Returns `None` unless the session was running.
    pub fn finish<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> Option<SessionResult> {
        if self.state != SessionState::Running {
            return None;
        }

        let ended_at = self.clock.now();
        let started_at = self.started_at.unwrap_or(ended_at);
        let elapsed_secs = time_diff_ms(started_at, ended_at) as f64 / 1000.0;
        let typed_len = self.typed.len();

        let result = SessionResult {
            wpm: stats::final_wpm(typed_len, elapsed_secs),
            accuracy: stats::accuracy(typed_len, self.error_count, self.reference.len()),
            elapsed_secs,
            total_chars: typed_len,
            difficulty: self.config.difficulty,
            duration_secs: self.config.duration_secs,
            recorded_at: DateTime::<Local>::from(ended_at),
        };

        self.state = SessionState::Finished;
        self.ended_at = Some(ended_at);
        self.result = Some(result.clone());

        tracing::info!(
            wpm = result.wpm,
            accuracy = result.accuracy,
            elapsed_secs = result.elapsed_secs,
            chars = result.total_chars,
            "session finished"
        );
        presenter.on_finished(&result);
        Some(result)
    }

    /// Back to Idle from any state, keeping the armed passage
    pub fn reset(&mut self) {
        self.clear();
        tracing::debug!("session reset");
    }

    fn clear(&mut self) {
        self.state = SessionState::Idle;
        self.typed.clear();
        self.error_count = 0;
        self.started_at = None;
        self.ended_at = None;
        self.time_remaining = self.config.duration_secs;
        self.result = None;
    }

    /// Readout measured against wall-clock time since start
    pub fn live_stats(&self) -> LiveStats {
        let elapsed = match self.started_at {
            Some(started_at) => {
                let until = self.ended_at.unwrap_or_else(|| self.clock.now());
                until.duration_since(started_at).unwrap_or_default()
            }
            None => Default::default(),
        };

        LiveStats {
            wpm: stats::live_wpm(self.typed.len(), elapsed),
            accuracy: stats::accuracy(self.typed.len(), self.error_count, self.reference.len()),
            time_remaining: self.time_remaining,
        }
    }

    pub fn char_state(&self, idx: usize) -> CharState {
        match (self.typed.get(idx), self.reference.char_at(idx)) {
            (Some(typed), Some(expected)) if *typed == expected => CharState::Correct,
            (Some(_), Some(_)) => CharState::Incorrect,
            _ if idx == self.typed.len() => CharState::Current,
            _ => CharState::Pending,
        }
    }

    /// Fraction of the countdown used, 0.0..=1.0
    pub fn progress(&self) -> f64 {
        if self.config.duration_secs == 0 {
            return 0.0;
        }
        let duration = self.config.duration_secs as f64;
        ((duration - self.time_remaining as f64) / duration).clamp(0.0, 1.0)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn reference(&self) -> &ReferenceText {
        &self.reference
    }

    pub fn typed(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn typed_len(&self) -> usize {
        self.typed.len()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<SystemTime> {
        self.ended_at
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }
}
