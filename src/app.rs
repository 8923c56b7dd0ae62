use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::classify::{classify, PerformanceTier};
use crate::clock::{Clock, SessionClock, SystemClock};
use crate::config::{Config, ConfigStore};
use crate::corpus::{CorpusError, ReferenceText, TextCorpus};
use crate::history::{HistoryLog, ResultsRecorder};
use crate::presenter::Presenter;
use crate::runtime::{forward_ticks, TypingEvent};
use crate::session::{InputOutcome, SessionState, TickOutcome, TypingSession};
use crate::share::{BrowserSharer, ResultSharer};
use crate::stats::{LiveStats, SessionResult};
use crate::validation::RejectReason;

/// How long a warning stays on screen
pub const WARNING_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Typing,
    Results,
    History,
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub message: String,
    pub shown_at: Instant,
}

/// What the terminal shows; fed by the session through `Presenter`
#[derive(Debug, Clone)]
pub struct ViewState {
    pub live: LiveStats,
    pub warning: Option<Warning>,
    pub last_result: Option<SessionResult>,
}

impl ViewState {
    fn new(live: LiveStats) -> Self {
        Self {
            live,
            warning: None,
            last_result: None,
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warning = Some(Warning {
            message: message.into(),
            shown_at: Instant::now(),
        });
    }

    pub fn active_warning(&self) -> Option<&str> {
        self.warning
            .as_ref()
            .filter(|w| w.shown_at.elapsed() < WARNING_TTL)
            .map(|w| w.message.as_str())
    }
}

impl Presenter for ViewState {
    fn on_stats_updated(&mut self, stats: LiveStats) {
        self.live = stats;
    }

    fn on_finished(&mut self, result: &SessionResult) {
        self.last_result = Some(result.clone());
    }

    fn on_input_rejected(&mut self, reason: RejectReason) {
        self.warn(reason.to_string());
    }
}

/// Wires corpus, session, clock, recorder and classifier together and maps
/// terminal events onto session calls
pub struct App<C: Clock = SystemClock> {
    pub config: Config,
    pub view: ViewState,
    corpus: TextCorpus,
    custom_passage: Option<ReferenceText>,
    session: TypingSession<C>,
    clock: SessionClock,
    tick_interval: Duration,
    tick_tx: Sender<TypingEvent>,
    recorder: Box<dyn ResultsRecorder>,
    store: Box<dyn ConfigStore>,
    sharer: Box<dyn ResultSharer>,
    input: String,
    screen: Screen,
    history: HistoryLog,
    rating: Option<PerformanceTier>,
    should_quit: bool,
}

impl<C: Clock> App<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        corpus: TextCorpus,
        config: Config,
        custom_passage: Option<ReferenceText>,
        recorder: Box<dyn ResultsRecorder>,
        store: Box<dyn ConfigStore>,
        session_clock: C,
        tick_tx: Sender<TypingEvent>,
    ) -> Result<Self, CorpusError> {
        let reference = match &custom_passage {
            Some(passage) => passage.clone(),
            None => corpus.select_passage(config.difficulty)?,
        };
        let session = TypingSession::with_clock(reference, config.session_config(), session_clock);

        let history = match recorder.history() {
            Ok(results) => results.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not load history");
                HistoryLog::new()
            }
        };

        Ok(Self {
            view: ViewState::new(session.live_stats()),
            config,
            corpus,
            custom_passage,
            session,
            clock: SessionClock::new(),
            tick_interval: SessionClock::DEFAULT_INTERVAL,
            tick_tx,
            recorder,
            store,
            sharer: Box::new(BrowserSharer),
            input: String::new(),
            screen: Screen::Typing,
            history,
            rating: None,
            should_quit: false,
        })
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_sharer(mut self, sharer: Box<dyn ResultSharer>) -> Self {
        self.sharer = sharer;
        self
    }

    pub fn handle_event(&mut self, event: TypingEvent) {
        match event {
            TypingEvent::Key(key) => self.handle_key(key),
            TypingEvent::Paste(_) => self.paste(),
            TypingEvent::Tick(epoch) => self.on_tick(epoch),
            TypingEvent::Resize | TypingEvent::Redraw => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        match self.screen {
            Screen::History => match key.code {
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('q') => self.close_history(),
                _ => {}
            },
            Screen::Results => match key.code {
                KeyCode::Char('r') | KeyCode::Esc => self.reset(),
                KeyCode::Char('n') => self.new_passage(),
                KeyCode::Char('s') => self.share(),
                KeyCode::Char('h') => self.screen = Screen::History,
                KeyCode::Char('q') => self.quit(),
                _ => {}
            },
            Screen::Typing => match self.session.state() {
                SessionState::Running => match key.code {
                    KeyCode::Esc => self.reset(),
                    KeyCode::Backspace => self.backspace(),
                    KeyCode::Char(c) => self.type_char(c),
                    _ => {}
                },
                SessionState::Idle | SessionState::Finished => match key.code {
                    KeyCode::Enter => self.start(),
                    KeyCode::Tab => self.new_passage(),
                    KeyCode::Char('d') => self.cycle_difficulty(),
                    KeyCode::Char('t') => self.cycle_duration(),
                    KeyCode::Char('h') => self.screen = Screen::History,
                    KeyCode::Char('q') | KeyCode::Esc => self.quit(),
                    _ => {}
                },
            },
        }
    }

    pub fn start(&mut self) {
        if self.session.start().applied() {
            self.input.clear();
            self.view.live = self.session.live_stats();
            self.clock
                .start(self.tick_interval, forward_ticks(self.tick_tx.clone()));
        }
    }

    /// Apply a countdown tick, dropping ticks from a clock run that has since been stopped
    pub fn on_tick(&mut self, epoch: u64) {
        if !self.clock.is_current(epoch) {
            tracing::debug!(epoch, current = self.clock.epoch(), "stale tick dropped");
            return;
        }
        if let TickOutcome::Expired(result) = self.session.tick(&mut self.view) {
            self.complete(result);
        }
    }

    pub fn type_char(&mut self, c: char) {
        let mut next = self.input.clone();
        next.push(c);
        self.submit(next);
    }

    pub fn backspace(&mut self) {
        if self.input.is_empty() {
            return;
        }
        let mut next = self.input.clone();
        next.pop();
        self.submit(next);
    }

    fn submit(&mut self, next: String) {
        match self.session.submit_input(&next, &mut self.view) {
            InputOutcome::Accepted(_) => self.input = next,
            InputOutcome::Completed(result) => {
                self.input = next;
                self.complete(result);
            }
            InputOutcome::Rejected(_) | InputOutcome::Ignored => {}
        }
    }

    pub fn paste(&mut self) {
        if self.session.is_running() {
            self.view.on_input_rejected(RejectReason::Paste);
        }
    }

    fn complete(&mut self, result: SessionResult) {
        self.clock.stop();

        if let Err(e) = self.recorder.record(&result) {
            tracing::warn!(error = %e, "could not record result");
            self.view.warn(format!("result not saved: {e}"));
        }
        match self.recorder.history() {
            Ok(history) => self.history = history.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not reload history");
                self.history.push(result.clone());
            }
        }

        self.rating = Some(classify(result.wpm, result.accuracy));
        self.screen = Screen::Results;
    }

    /// Stop the countdown, then clear the session. Keeps the passage.
    pub fn reset(&mut self) {
        self.clock.stop();
        self.session.reset();
        self.input.clear();
        self.rating = None;
        self.view.live = self.session.live_stats();
        self.screen = Screen::Typing;
    }

    /// Stop the countdown and arm a freshly selected passage
    pub fn new_passage(&mut self) {
        self.reset();
        let reference = match &self.custom_passage {
            Some(passage) => passage.clone(),
            None => match self.corpus.select_passage(self.config.difficulty) {
                Ok(reference) => reference,
                Err(e) => {
                    tracing::error!(error = %e, "passage selection failed");
                    self.view.warn(e.to_string());
                    return;
                }
            },
        };
        self.rearm(reference);
    }

    pub fn cycle_difficulty(&mut self) {
        self.config.cycle_difficulty();
        self.save_config();
        self.new_passage();
    }

    pub fn cycle_duration(&mut self) {
        self.config.cycle_duration();
        self.save_config();
        self.reset();
        let reference = self.session.reference().clone();
        self.rearm(reference);
    }

    /// Bind `reference` with the current config. Callers reset first, so a
    /// refusal here means the session was still running.
    fn rearm(&mut self, reference: ReferenceText) {
        if !self
            .session
            .arm(reference, self.config.session_config())
            .applied()
        {
            tracing::debug!(state = ?self.session.state(), "arm ignored");
        }
        self.view.live = self.session.live_stats();
    }

    /// Hand the last result to the sharer; failures only warn
    pub fn share(&mut self) {
        let Some(result) = self.view.last_result.as_ref() else {
            return;
        };
        match self.sharer.share(result) {
            Ok(()) => tracing::info!(wpm = result.wpm, "result shared"),
            Err(e) => {
                tracing::warn!(error = %e, "could not share result");
                self.view.warn(e.to_string());
            }
        }
    }

    fn save_config(&self) {
        if let Err(e) = self.store.save(&self.config) {
            tracing::warn!(error = %e, "could not save config");
        }
    }

    fn close_history(&mut self) {
        self.screen = if self.session.state() == SessionState::Finished {
            Screen::Results
        } else {
            Screen::Typing
        };
    }

    pub fn quit(&mut self) {
        self.clock.stop();
        self.should_quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn session(&self) -> &TypingSession<C> {
        &self.session
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn rating(&self) -> Option<PerformanceTier> {
        self.rating
    }

    pub fn clock_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn clock_epoch(&self) -> u64 {
        self.clock.epoch()
    }
}
