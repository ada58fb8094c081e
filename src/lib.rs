//! JS-style promises backed by native threads.
//!
//! A [`Promise`] is a write-once, read-many container for a value produced
//! asynchronously. The executor handed to [`Promise::new`] runs immediately
//! on its own thread and settles the promise through the [`Resolver`] and
//! [`Rejecter`] it receives, exactly once; later attempts are silent no-ops.
//! Any number of observers may then block on [`Promise::wait`], poll the
//! promise as a [`std::future::Future`], or get notified through
//! [`Promise::as_callback`], and all of them see the same outcome.
//!
//! Chaining ([`Promise::then`], [`Promise::catch`]) and the aggregate
//! combinators ([`Promise::all`], [`Promise::race`],
//! [`Promise::all_settled`], [`Promise::each`]) follow the JavaScript promise
//! contract, including flattening: resolving with another promise adopts that
//! promise's eventual outcome. A panicking executor rejects instead of
//! tearing anything down.
//!
//! # Examples
//!
//! ```
//! use promise_kept::{Error, Promise};
//! use std::thread;
//! use std::time::Duration;
//!
//! let fast = Promise::resolve(1);
//! let slow = Promise::new(|resolve, _reject| {
//!     thread::sleep(Duration::from_millis(10));
//!     resolve.resolve(2);
//! });
//! assert_eq!(Promise::all([fast, slow]).wait(), Ok(vec![1, 2]));
//!
//! let failing: Promise<i32> = Promise::reject("out of cheese");
//! assert_eq!(
//!     failing.catch(|err| format!("recovered reason: {err}")).wait(),
//!     Err(Error::Rejected("recovered reason: out of cheese".into()))
//! );
//! ```

pub mod combine;
pub mod error;
pub mod promise;
pub mod timer;

pub use error::Error;
pub use promise::{Promise, Rejecter, Resolution, Resolver};
pub use timer::{Interval, Timeout};
