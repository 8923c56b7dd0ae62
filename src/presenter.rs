use crate::stats::{LiveStats, SessionResult};
use crate::validation::RejectReason;

/// Receiver of session notifications. The session calls these synchronously
/// from inside `submit_input`, `tick` and `finish`.
pub trait Presenter {
    /// After every tick and every accepted input while running
    fn on_stats_updated(&mut self, stats: LiveStats);
    /// Exactly once per session, on the transition to finished
    fn on_finished(&mut self, result: &SessionResult);
    /// When validation refuses an input; the session is left untouched
    fn on_input_rejected(&mut self, reason: RejectReason);
}

/// Presenter that drops every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn on_stats_updated(&mut self, _stats: LiveStats) {}
    fn on_finished(&mut self, _result: &SessionResult) {}
    fn on_input_rejected(&mut self, _reason: RejectReason) {}
}

/// One notification, as captured by the `Vec` presenter
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    Stats(LiveStats),
    Finished(SessionResult),
    Rejected(RejectReason),
}

impl Presenter for Vec<PresenterEvent> {
    fn on_stats_updated(&mut self, stats: LiveStats) {
        self.push(PresenterEvent::Stats(stats));
    }

    fn on_finished(&mut self, result: &SessionResult) {
        self.push(PresenterEvent::Finished(result.clone()));
    }

    fn on_input_rejected(&mut self, reason: RejectReason) {
        self.push(PresenterEvent::Rejected(reason));
    }
}
