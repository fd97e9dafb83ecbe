#![forbid(unsafe_code)]

//! Stop signal for timer threads.
//!
//! The stream driver and the frame ticker both run a loop of the form
//! "sleep one interval, do work, repeat". [`StopSignal::wait_timeout`] is
//! that sleep: it blocks on a condition variable so teardown wakes the
//! thread immediately instead of waiting out the interval.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// The waiting half, moved into the timer thread.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

/// The triggering half, kept by the owner.
pub struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// Create a connected (signal, trigger) pair.
    #[must_use]
    pub fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        (
            Self {
                inner: inner.clone(),
            },
            StopTrigger { inner },
        )
    }

    /// Whether the trigger has fired.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        lock.lock().map(|stopped| *stopped).unwrap_or(true)
    }

    /// Block until the trigger fires or `duration` elapses.
    ///
    /// Returns `true` if stopped, `false` on timeout. Loops around spurious
    /// wakeups until the full duration has passed.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let Ok(mut stopped) = lock.lock() else {
            return true;
        };
        if *stopped {
            return true;
        }

        let start = Instant::now();
        let mut remaining = duration;
        loop {
            let Ok((guard, result)) = cvar.wait_timeout(stopped, remaining) else {
                return true;
            };
            stopped = guard;
            if *stopped {
                return true;
            }
            let elapsed = start.elapsed();
            if result.timed_out() || elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }
}

impl StopTrigger {
    /// Fire the signal, waking any waiting thread.
    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        if let Ok(mut stopped) = lock.lock() {
            *stopped = true;
        }
        cvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn trigger_wakes_waiter_early() {
        let (signal, trigger) = StopSignal::new();
        let waiter = thread::spawn(move || signal.wait_timeout(Duration::from_secs(30)));
        trigger.stop();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn timeout_reports_not_stopped() {
        let (signal, _trigger) = StopSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(5)));
        assert!(!signal.is_stopped());
    }

    #[test]
    fn stop_before_wait_returns_immediately() {
        let (signal, trigger) = StopSignal::new();
        trigger.stop();
        assert!(signal.wait_timeout(Duration::from_secs(30)));
        assert!(signal.is_stopped());
    }
}
