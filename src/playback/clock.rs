//! Monotonic time, sleeping and cancellation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest uninterrupted slice of a cancellable sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Shared stop flag checked at every suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Loops notice it at their next check.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Cancel this token from the process's Ctrl-C handler.
    ///
    /// Only one handler can be installed per process.
    pub fn cancel_on_interrupt(&self) -> Result<(), ctrlc::Error> {
        let token = self.clone();
        ctrlc::set_handler(move || token.cancel())
    }
}

/// Source of monotonic time and blocking waits.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Block for `duration` (or less, if cancelled).
    fn sleep(&mut self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock backed by [`Instant`], with sleeps that wake early on cancel.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
    cancel: CancelToken,
}

impl SystemClock {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            origin: Instant::now(),
            cancel,
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.cancel.is_cancelled() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            thread::sleep(remaining.min(SLEEP_SLICE));
        }
    }
}

#[derive(Debug, Default)]
struct ManualState {
    now: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
}

/// Virtual clock for tests and offline runs.
///
/// Sleeping records the request and advances virtual time instantly.
/// Clones share the same timeline, so a fake sink can call [`advance`]
/// to simulate render latency.
///
/// [`advance`]: ManualClock::advance
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Rc<ManualState>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move virtual time forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        self.state.now.set(self.state.now.get() + by);
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.sleeps.borrow().clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.state.now.get()
    }

    fn sleep(&mut self, duration: Duration) {
        self.state.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shares_timeline() {
        let mut clock = ManualClock::new();
        let observer = clock.clone();

        clock.sleep(Duration::from_millis(20));
        observer.advance(Duration::from_millis(5));

        assert_eq!(clock.now(), Duration::from_millis(25));
        assert_eq!(observer.sleeps(), vec![Duration::from_millis(20)]);
    }

    #[test]
    fn test_cancelled_system_sleep_returns_early() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut clock = SystemClock::new(cancel);

        let start = Instant::now();
        clock.sleep(Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_cancel_from_another_thread_wakes_sleep() {
        let cancel = CancelToken::new();
        let mut clock = SystemClock::new(cancel.clone());

        let start = Instant::now();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            cancel.cancel();
        });
        clock.sleep(Duration::from_secs(10));
        canceller.join().unwrap();

        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_interrupt_handler_installs_once() {
        let cancel = CancelToken::new();
        assert!(cancel.cancel_on_interrupt().is_ok());
        assert!(cancel.cancel_on_interrupt().is_err());
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let mut clock = SystemClock::new(CancelToken::new());
        let before = clock.now();
        clock.sleep(Duration::from_millis(5));
        assert!(clock.now() >= before + Duration::from_millis(5));
    }
}
