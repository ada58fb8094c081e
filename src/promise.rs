//! The settlement core: a write-once, read-many container whose producer runs
//! on its own thread, plus the chaining operators built on top of it.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex};
use std::task::{Context, Poll, Waker};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::error::Error;

/// What a resolver may be handed: a plain value, or another promise whose
/// eventual outcome this promise should adopt (flattening).
pub enum Resolution<T> {
    Value(T),
    Chained(Promise<T>),
}

impl<T> From<T> for Resolution<T> {
    fn from(value: T) -> Self {
        Resolution::Value(value)
    }
}

impl<T> From<Promise<T>> for Resolution<T> {
    fn from(promise: Promise<T>) -> Self {
        Resolution::Chained(promise)
    }
}

struct Shared<T> {
    // None while pending. Written exactly once; never cleared.
    outcome: Option<Result<T, Error>>,
    // Async observers parked before settlement. Drained and woken once.
    wakers: Vec<Waker>,
    timed: bool,
    elapsed: Option<Duration>,
}

struct Inner<T> {
    shared: Mutex<Shared<T>>,
    settled: Condvar,
}

impl<T> Inner<T> {
    /// The one place state changes. First caller wins; everyone else no-ops.
    fn settle(&self, outcome: Result<T, Error>) {
        let mut shared = self.shared.lock().unwrap();
        if shared.outcome.is_some() {
            return;
        }
        trace!(fulfilled = outcome.is_ok(), "promise settled");
        shared.outcome = Some(outcome);
        for waker in shared.wakers.drain(..) {
            waker.wake();
        }
        drop(shared);
        self.settled.notify_all();
    }

    fn is_settled(&self) -> bool {
        self.shared.lock().unwrap().outcome.is_some()
    }
}

/// A handle to a value that will become available asynchronously.
///
/// Created with an executor that runs immediately on a fresh thread and is
/// handed the [`Resolver`] and [`Rejecter`] for this promise. Handles are
/// cheap to clone; all clones observe the same settlement.
///
/// # Examples
///
/// ```
/// use promise_kept::Promise;
/// use std::thread;
/// use std::time::Duration;
///
/// let p = Promise::new(|resolve, _reject| {
///     thread::sleep(Duration::from_millis(10));
///     resolve.resolve(21);
/// });
/// assert_eq!(p.then(|n| n * 2).wait(), Ok(42));
/// ```
pub struct Promise<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise {
            inner: self.inner.clone(),
        }
    }
}

/// The fulfillment entry point handed to an executor.
pub struct Resolver<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Resolver {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Resolver<T> {
    /// Settles the promise as fulfilled, unless it already settled.
    ///
    /// Accepts either a plain value or another [`Promise`]; handing over a
    /// promise blocks this thread until it settles and adopts its outcome,
    /// turning an inner rejection into a rejection of this promise.
    pub fn resolve(&self, resolution: impl Into<Resolution<T>>) {
        match resolution.into() {
            Resolution::Value(value) => self.inner.settle(Ok(value)),
            Resolution::Chained(promise) => {
                // Skip the (possibly long) inner wait when the race is
                // already lost. The wait happens without any lock held, so a
                // concurrent reject can still win it.
                if self.inner.is_settled() {
                    return;
                }
                self.inner.settle(promise.wait());
            }
        }
    }
}

/// The rejection entry point handed to an executor.
pub struct Rejecter<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Rejecter<T> {
    fn clone(&self) -> Self {
        Rejecter {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Rejecter<T> {
    /// Settles the promise as rejected, unless it already settled. Plain
    /// strings are coerced into [`Error::Rejected`].
    pub fn reject(&self, reason: impl Into<Error>) {
        self.inner.settle(Err(reason.into()));
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Spawns `executor` on its own thread immediately and returns the
    /// pending promise it settles.
    ///
    /// A panic inside the executor is intercepted at the thread boundary and
    /// delivered as [`Error::Panicked`]; an executor that returns without
    /// settling and without panicking leaves the promise pending forever.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T>, Rejecter<T>) + Send + 'static,
    {
        let inner = Arc::new(Inner {
            shared: Mutex::new(Shared {
                outcome: None,
                wakers: Vec::new(),
                timed: false,
                elapsed: None,
            }),
            settled: Condvar::new(),
        });
        let resolver = Resolver {
            inner: inner.clone(),
        };
        let rejecter = Rejecter {
            inner: inner.clone(),
        };
        let promise = Promise {
            inner: inner.clone(),
        };
        thread::spawn(move || {
            trace!("executor thread started");
            let panic_guard = rejecter.clone();
            if let Err(payload) =
                catch_unwind(AssertUnwindSafe(move || executor(resolver, rejecter)))
            {
                warn!("executor panicked, converting to rejection");
                panic_guard.reject(Error::from_panic(payload));
            }
        });
        promise
    }

    /// A promise already on its way to fulfillment with `value` (which may
    /// itself be a promise, and is then flattened).
    pub fn resolve(value: impl Into<Resolution<T>> + Send + 'static) -> Self {
        Promise::new(move |resolve, _reject| resolve.resolve(value))
    }

    /// A promise already on its way to rejection with `reason`.
    pub fn reject(reason: impl Into<Error> + Send + 'static) -> Self {
        Promise::new(move |_resolve, reject| reject.reject(reason))
    }

    /// Blocks the calling thread until settlement and returns the outcome.
    ///
    /// Any number of threads may wait, before or after settlement; every one
    /// of them gets the same final outcome.
    pub fn wait(&self) -> Result<T, Error> {
        let mut shared = self.inner.shared.lock().unwrap();
        let started = shared.timed.then(Instant::now);
        loop {
            if let Some(outcome) = &shared.outcome {
                let outcome = outcome.clone();
                if let Some(started) = started {
                    shared.elapsed = Some(started.elapsed());
                }
                return outcome;
            }
            shared = self.inner.settled.wait(shared).unwrap();
        }
    }

    /// Runs `f` with the outcome on its own thread once settlement occurs.
    /// Never blocks the caller.
    pub fn as_callback<F>(&self, f: F)
    where
        F: FnOnce(Result<T, Error>) + Send + 'static,
    {
        let promise = self.clone();
        thread::spawn(move || f(promise.wait()));
    }

    /// Returns a new promise that waits this one, applies `on_fulfilled` to
    /// its value and resolves with the result (itself flattened if the
    /// handler returns a promise). A rejection passes through unchanged and
    /// `on_fulfilled` is never invoked.
    pub fn then<U, R, F>(&self, on_fulfilled: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        R: Into<Resolution<U>>,
        F: FnOnce(T) -> R + Send + 'static,
    {
        let parent = self.clone();
        Promise::new(move |resolve, reject| match parent.wait() {
            Ok(value) => resolve.resolve(on_fulfilled(value)),
            Err(err) => reject.reject(err),
        })
    }

    /// Returns a new promise that waits this one and, on rejection, rejects
    /// with `on_rejected(error)`: the handler rewrites the reason, it does
    /// not recover to success. A fulfillment passes through unchanged.
    pub fn catch<R, F>(&self, on_rejected: F) -> Promise<T>
    where
        R: Into<Error>,
        F: FnOnce(Error) -> R + Send + 'static,
    {
        let parent = self.clone();
        Promise::new(move |resolve, reject| match parent.wait() {
            Ok(value) => resolve.resolve(value),
            Err(err) => reject.reject(on_rejected(err)),
        })
    }
}

impl<T> Promise<T> {
    /// Non-blocking probe: has this promise settled yet?
    pub fn is_settled(&self) -> bool {
        self.inner.is_settled()
    }

    /// Arms the elapsed-time instrumentation: each later [`wait`] on this
    /// promise records how long that particular call blocked.
    ///
    /// Waiters that arrive after settlement record a near-zero duration; the
    /// measurement covers the wait, not the time since creation.
    ///
    /// [`wait`]: Promise::wait
    pub fn timed(self) -> Self {
        self.inner.shared.lock().unwrap().timed = true;
        self
    }

    /// The duration recorded by the most recent instrumented [`wait`], if
    /// any.
    ///
    /// [`wait`]: Promise::wait
    pub fn elapsed(&self) -> Option<Duration> {
        self.inner.shared.lock().unwrap().elapsed
    }
}

impl<T: Clone> Future for Promise<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.inner.shared.lock().unwrap();
        match &shared.outcome {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => {
                shared.wakers.push(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
