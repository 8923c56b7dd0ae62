use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app runner. Keyboard input and clock
/// ticks arrive on one channel, so they are applied strictly one at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum TypingEvent {
    Key(KeyEvent),
    Paste(String),
    Resize,
    /// One countdown second from the session clock run with this epoch
    Tick(u64),
    /// Nothing arrived within the redraw interval
    Redraw,
}

/// Source of app events (keyboard, resize, clock ticks)
pub trait TypingEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<TypingEvent, RecvTimeoutError>;

    /// Handle producers (such as the session clock) use to feed this source
    fn sender(&self) -> Sender<TypingEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<TypingEvent>,
    rx: Receiver<TypingEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let reader_tx = tx.clone();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                // Windows reports both press and release
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    Some(TypingEvent::Key(key))
                }
                Ok(CtEvent::Paste(text)) => Some(TypingEvent::Paste(text)),
                Ok(CtEvent::Resize(_, _)) => Some(TypingEvent::Resize),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "terminal event reader stopped");
                    break;
                }
            };

            if let Some(evt) = evt {
                if reader_tx.send(evt).is_err() {
                    break;
                }
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TypingEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TypingEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<TypingEvent> {
        self.tx.clone()
    }
}

/// Test event source for unit tests; feed it through `sender`
pub struct TestEventSource {
    tx: Sender<TypingEvent>,
    rx: Receiver<TypingEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TypingEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TypingEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<TypingEvent> {
        self.tx.clone()
    }
}

/// Configurable redraw interval
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Callback for `SessionClock::start` that forwards ticks into an event
/// channel and stops the clock once the receiving side is gone
pub fn forward_ticks(tx: Sender<TypingEvent>) -> impl FnMut(u64) -> ControlFlow<()> + Send + 'static {
    move |epoch| {
        if tx.send(TypingEvent::Tick(epoch)).is_err() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// Runner that advances the application one event at a time
pub struct Runner<E: TypingEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: TypingEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the redraw interval and returns the next event, or Redraw on timeout
    pub fn step(&self) -> TypingEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                TypingEvent::Redraw
            }
        }
    }

    pub fn sender(&self) -> Sender<TypingEvent> {
        self.event_source.sender()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SessionClock;

    #[test]
    fn step_returns_redraw_on_timeout() {
        let runner = Runner::new(
            TestEventSource::new(),
            FixedTicker::new(Duration::from_millis(1)),
        );

        assert_eq!(runner.step(), TypingEvent::Redraw);
    }

    #[test]
    fn step_passes_through_events() {
        let es = TestEventSource::new();
        es.sender().send(TypingEvent::Resize).unwrap();
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(10)));

        assert_eq!(runner.step(), TypingEvent::Resize);
    }

    #[test]
    fn clock_ticks_arrive_through_runner() {
        let runner = Runner::new(
            TestEventSource::new(),
            FixedTicker::new(Duration::from_millis(200)),
        );
        let mut clock = SessionClock::new();
        let epoch = clock.start(Duration::from_millis(1), forward_ticks(runner.sender()));

        let mut got = None;
        for _ in 0..20 {
            if let TypingEvent::Tick(e) = runner.step() {
                got = Some(e);
                break;
            }
        }
        clock.stop();

        assert_eq!(got, Some(epoch));
    }

    #[test]
    fn forward_ticks_breaks_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel();
        let mut forward = forward_ticks(tx);
        assert_eq!(forward(1), ControlFlow::Continue(()));

        drop(rx);
        assert_eq!(forward(2), ControlFlow::Break(()));
    }
}
