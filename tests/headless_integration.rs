use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use keypace::app::{App, Screen};
use keypace::clock::ManualClock;
use keypace::config::{Config, MemoryConfigStore};
use keypace::corpus::{Difficulty, ReferenceText, TextCorpus};
use keypace::history::MemoryRecorder;
use keypace::runtime::{FixedTicker, Runner, TestEventSource, TypingEvent, TypingEventSource};
use keypace::session::SessionState;

fn key(code: KeyCode) -> TypingEvent {
    TypingEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn headless_app(
    runner: &Runner<TestEventSource, FixedTicker>,
    passage: &str,
    config: Config,
    clock: &ManualClock,
) -> App<ManualClock> {
    App::new(
        TextCorpus::builtin().unwrap(),
        config,
        Some(ReferenceText::new(passage)),
        Box::new(MemoryRecorder::new()),
        Box::new(MemoryConfigStore::default()),
        clock.clone(),
        runner.sender(),
    )
    .unwrap()
}

// Headless integration using the runtime + App without a TTY.
// Verifies that a minimal typing flow completes via Runner/TestEventSource.
#[test]
fn headless_typing_flow_completes() {
    let es = TestEventSource::new();
    let tx = es.sender();
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));
    let clock = ManualClock::default();
    let mut app = headless_app(&runner, "hi", Config::default(), &clock);

    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(key(KeyCode::Char('h'))).unwrap();
    tx.send(key(KeyCode::Char('i'))).unwrap();

    for _ in 0..100u32 {
        let event = runner.step();
        if matches!(event, TypingEvent::Key(_)) {
            // keep wall time moving between keystrokes
            clock.advance(Duration::from_secs(1));
        }
        app.handle_event(event);
        if app.screen() == Screen::Results {
            break;
        }
    }

    assert_eq!(app.screen(), Screen::Results);
    assert_eq!(app.session().state(), SessionState::Finished);
    assert!(!app.clock_running());

    let result = app.view.last_result.clone().unwrap();
    assert_eq!(result.total_chars, 2);
    assert_eq!(result.accuracy, 100);
    // 2 chars in 2 seconds: 0.4 words / (2/60) min
    assert_eq!(result.wpm, 12);
    assert_eq!(app.history().len(), 1);
}

#[test]
fn headless_timed_session_expires_from_clock_ticks() {
    let runner = Runner::new(
        TestEventSource::new(),
        FixedTicker::new(Duration::from_millis(10)),
    );
    let clock = ManualClock::default();
    let config = Config {
        duration_secs: 3,
        difficulty: Difficulty::Easy,
    };
    let mut app = headless_app(&runner, "hello world", config, &clock)
        .with_tick_interval(Duration::from_millis(2));

    app.start();
    app.type_char('h');

    for _ in 0..500u32 {
        let event = runner.step();
        app.handle_event(event);
        if app.session().state() == SessionState::Finished {
            break;
        }
    }

    assert_eq!(app.session().state(), SessionState::Finished);
    assert_eq!(app.session().time_remaining(), 0);
    assert_eq!(app.screen(), Screen::Results);
    assert_eq!(app.history().len(), 1);
    assert_eq!(app.view.last_result.as_ref().unwrap().total_chars, 1);
}

#[test]
fn headless_reset_discards_ticks_from_old_run() {
    let es = TestEventSource::new();
    let tx = es.sender();
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));
    let clock = ManualClock::default();
    let mut app = headless_app(&runner, "hello", Config::default(), &clock)
        .with_tick_interval(Duration::from_secs(3600));

    app.start();
    let old_epoch = app.clock_epoch();
    app.handle_event(key(KeyCode::Esc));
    app.start();

    // A tick from the stopped run that was already queued
    tx.send(TypingEvent::Tick(old_epoch)).unwrap();
    let event = runner.step();
    app.handle_event(event);

    assert_eq!(app.session().time_remaining(), 60);
    assert!(app.session().is_running());
}

#[test]
fn headless_quit_stops_the_clock() {
    let es = TestEventSource::new();
    let tx = es.sender();
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));
    let clock = ManualClock::default();
    let mut app = headless_app(&runner, "hello", Config::default(), &clock);

    tx.send(key(KeyCode::Enter)).unwrap();
    tx.send(TypingEvent::Key(KeyEvent::new(
        KeyCode::Char('c'),
        KeyModifiers::CONTROL,
    )))
    .unwrap();

    while !app.should_quit() {
        let event = runner.step();
        app.handle_event(event);
    }

    assert!(!app.clock_running());
}
