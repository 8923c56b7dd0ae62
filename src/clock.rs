use std::cell::Cell;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

/// Wall-clock source the session reads its timestamps from
pub trait Clock {
    fn now(&self) -> SystemTime;
}

/// Production clock backed by `SystemTime::now`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Hand-driven clock for deterministic tests. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<SystemTime>>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }
}

/// Helper function to calculate time difference in milliseconds
pub fn time_diff_ms(start: SystemTime, end: SystemTime) -> u64 {
    end.duration_since(start).unwrap_or_default().as_millis() as u64
}

/// Periodic countdown driver. Holds no typing state; every tick is handed to
/// the callback tagged with the epoch of the `start` call that produced it.
#[derive(Debug, Default)]
pub struct SessionClock {
    epoch: u64,
    running: Option<Arc<AtomicBool>>,
}

impl SessionClock {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

    pub fn new() -> Self {
        Self::default()
    }

    /// Begin invoking `on_tick` every `interval` until `stop` is called or the
    /// callback breaks. Restarting stops the previous run first. Returns the
    /// epoch of the new run.
    pub fn start<F>(&mut self, interval: Duration, mut on_tick: F) -> u64
    where
        F: FnMut(u64) -> ControlFlow<()> + Send + 'static,
    {
        self.stop();
        self.epoch += 1;

        let epoch = self.epoch;
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        thread::spawn(move || loop {
            thread::sleep(interval);
            if !flag.load(Ordering::Acquire) {
                break;
            }
            if on_tick(epoch).is_break() {
                flag.store(false, Ordering::Release);
                break;
            }
        });

        self.running = Some(running);
        tracing::debug!(epoch, interval_ms = interval.as_millis() as u64, "clock started");
        epoch
    }

    /// Idempotent. A tick already handed off before this call keeps its old
    /// epoch, which `is_current` will reject.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.store(false, Ordering::Release);
            tracing::debug!(epoch = self.epoch, "clock stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| r.load(Ordering::Acquire))
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True only for ticks from the active run
    pub fn is_current(&self, epoch: u64) -> bool {
        self.is_running() && epoch == self.epoch
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.stop();
    }
}
