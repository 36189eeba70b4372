//! # Shutdown token
//!
//! Carries the interrupt signal from the `ctrlc` handler thread into the capture loop, and
//! provides the interruptible sleep used between captures.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// A cloneable, one-shot stop flag.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    inner: Arc<(Mutex<bool>, Condvar)>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token which is triggered by Ctrl-C (SIGINT).
    ///
    /// Only one handler can be installed per process.
    pub fn from_ctrlc() -> Result<Self> {
        let shutdown = Self::new();
        let handle = shutdown.clone();

        ctrlc::set_handler(move || handle.trigger())
            .map_err(|e| Error::SignalHandlerError(e))?;

        Ok(shutdown)
    }

    /// Request a stop, waking any thread blocked in [`Shutdown::sleep`].
    pub fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner()) = true;
        cvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block for `duration` or until triggered, whichever comes first.
    ///
    /// # Returns
    /// - `true` if the token was triggered, `false` if the full duration elapsed
    pub fn sleep(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().unwrap_or_else(|e| e.into_inner());

        // Too far away to represent, only a trigger ends the wait
        let deadline = match Instant::now().checked_add(duration) {
            Some(deadline) => deadline,
            None => {
                while !*triggered {
                    triggered = cvar.wait(triggered).unwrap_or_else(|e| e.into_inner());
                }
                return true;
            }
        };

        while !*triggered {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            // Spurious wakeups loop back round with the remaining time
            triggered = match cvar.wait_timeout(triggered, deadline - now) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0
            };
        }

        *triggered
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use std::thread;

    #[test]
    fn test_sleep_elapses() {
        let shutdown = Shutdown::new();

        assert!(!shutdown.sleep(Duration::from_millis(10)));
        assert!(!shutdown.sleep(Duration::from_secs(0)));
        assert!(!shutdown.is_triggered());
    }

    /// Test that a trigger from another thread cuts a long sleep short
    #[test]
    fn test_trigger_wakes_sleep() {
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();

        let jh = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.trigger();
        });

        let start = Instant::now();
        assert!(shutdown.sleep(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(10));

        jh.join().unwrap();
    }

    /// Test that an interval too long to add to the current instant still waits for a trigger
    #[test]
    fn test_trigger_wakes_unbounded_sleep() {
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();

        let jh = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            handle.trigger();
        });

        assert!(shutdown.sleep(Duration::from_secs(u64::MAX)));

        jh.join().unwrap();
    }

    #[test]
    fn test_already_triggered() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        assert!(shutdown.is_triggered());
        assert!(shutdown.sleep(Duration::from_secs(30)));
    }
}
