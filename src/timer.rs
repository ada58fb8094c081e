//! Delayed and repeating callbacks with external cancellation.
//!
//! Independent of the promise machinery: each timer owns a thread that waits
//! on a cancel channel with a deadline, so cancellation is prompt and no
//! busy-waiting is involved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

/// A one-shot callback scheduled to run after a delay.
///
/// Dropping the handle does *not* cancel the callback; it still fires at the
/// deadline. Only [`cancel`](Timeout::cancel) stops it.
pub struct Timeout {
    cancel_tx: Sender<()>,
    cancelled: Arc<AtomicBool>,
}

impl Timeout {
    /// Runs `f` once, `delay` from now, on its own thread, unless cancelled
    /// first.
    pub fn schedule<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel();
        thread::spawn(move || {
            let deadline = Instant::now() + delay;
            match cancel_rx.recv_timeout(delay) {
                Ok(()) => trace!("timeout cancelled"),
                Err(RecvTimeoutError::Timeout) => f(),
                Err(RecvTimeoutError::Disconnected) => {
                    // Handle dropped without cancelling; honor the deadline.
                    thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    f();
                }
            }
        });
        Timeout {
            cancel_tx,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stops the callback if it has not fired yet. Cancelling twice, or after
    /// the callback ran, is a no-op.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        // A send failure means the timer thread already finished.
        let _ = self.cancel_tx.send(());
    }

    /// True once [`cancel`](Timeout::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A callback scheduled to run repeatedly on a fixed period.
///
/// Unlike [`Timeout`], dropping the handle stops the ticker; otherwise the
/// thread would run forever with nobody left able to cancel it.
pub struct Interval {
    cancel_tx: Sender<()>,
    cancelled: Arc<AtomicBool>,
}

impl Interval {
    /// Runs `f` every `period`, starting one period from now, until
    /// cancelled or the handle is dropped.
    pub fn every<F>(period: Duration, f: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel();
        thread::spawn(move || loop {
            match cancel_rx.recv_timeout(period) {
                Err(RecvTimeoutError::Timeout) => f(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    trace!("interval stopped");
                    return;
                }
            }
        });
        Interval {
            cancel_tx,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stops the ticker. Cancelling twice is a no-op.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.cancel_tx.send(());
    }

    /// True once [`cancel`](Interval::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
