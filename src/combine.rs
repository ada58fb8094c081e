//! Aggregate combinators: compose many promises into one.
//!
//! Every combinator is an ordinary derived promise whose executor orchestrates
//! the children. Children report back over an mpsc channel attached with
//! [`Promise::as_callback`], so the orchestrating thread only ever blocks on
//! its own receiver.

use std::sync::mpsc;

use crate::error::Error;
use crate::promise::Promise;

impl<T: Clone + Send + 'static> Promise<T> {
    /// Waits the children strictly in argument order and fulfills with their
    /// values in that order. Rejects with the first rejection found by
    /// position, without waiting on anything after it.
    ///
    /// The children are all running concurrently regardless; only the
    /// *examination* order is sequential.
    pub fn each(promises: impl IntoIterator<Item = Promise<T>>) -> Promise<Vec<T>> {
        let promises: Vec<_> = promises.into_iter().collect();
        Promise::new(move |resolve, reject| {
            let mut values = Vec::with_capacity(promises.len());
            for promise in &promises {
                match promise.wait() {
                    Ok(value) => values.push(value),
                    Err(err) => {
                        reject.reject(err);
                        return;
                    }
                }
            }
            resolve.resolve(values);
        })
    }

    /// Fulfills with every child's value, ordered by input index, once all of
    /// them have fulfilled. Rejects as soon as any child rejects, with the
    /// first rejection *in completion order* (which under near-simultaneous
    /// rejections need not be the first by index).
    ///
    /// An empty input fulfills immediately with an empty vec.
    pub fn all(promises: impl IntoIterator<Item = Promise<T>>) -> Promise<Vec<T>> {
        let promises: Vec<_> = promises.into_iter().collect();
        if promises.is_empty() {
            return Promise::resolve(Vec::new());
        }
        Promise::new(move |resolve, reject| {
            let (tx, rx) = mpsc::channel();
            for (index, promise) in promises.iter().enumerate() {
                let tx = tx.clone();
                promise.as_callback(move |outcome| {
                    let _ = tx.send((index, outcome));
                });
            }
            drop(tx);

            let mut slots: Vec<Option<T>> = promises.iter().map(|_| None).collect();
            let mut remaining = slots.len();
            while remaining > 0 {
                let Ok((index, outcome)) = rx.recv() else {
                    break;
                };
                match outcome {
                    Ok(value) => {
                        slots[index] = Some(value);
                        remaining -= 1;
                    }
                    Err(err) => {
                        reject.reject(err);
                        return;
                    }
                }
            }
            resolve.resolve(slots.into_iter().flatten().collect::<Vec<_>>());
        })
    }

    /// Adopts the outcome of whichever child settles first, fulfilled or
    /// rejected. Returns `None` for an empty input: there is no settlement
    /// to wait for, which the caller learns immediately without blocking.
    pub fn race(promises: impl IntoIterator<Item = Promise<T>>) -> Option<Promise<T>> {
        let promises: Vec<_> = promises.into_iter().collect();
        if promises.is_empty() {
            return None;
        }
        Some(Promise::new(move |resolve, reject| {
            let (tx, rx) = mpsc::channel();
            for promise in &promises {
                let tx = tx.clone();
                promise.as_callback(move |outcome| {
                    let _ = tx.send(outcome);
                });
            }
            drop(tx);

            match rx.recv() {
                Ok(Ok(value)) => resolve.resolve(value),
                Ok(Err(err)) => reject.reject(err),
                Err(_) => {}
            }
        }))
    }

    /// Waits for every child to settle, success or failure, and fulfills with
    /// one slot per child ordered by input index. Never rejects; the caller
    /// inspects each slot to tell the outcomes apart.
    ///
    /// An empty input fulfills immediately with an empty vec.
    pub fn all_settled(
        promises: impl IntoIterator<Item = Promise<T>>,
    ) -> Promise<Vec<Result<T, Error>>> {
        let promises: Vec<_> = promises.into_iter().collect();
        if promises.is_empty() {
            return Promise::resolve(Vec::new());
        }
        Promise::new(move |resolve, _reject| {
            let (tx, rx) = mpsc::channel();
            for (index, promise) in promises.iter().enumerate() {
                let tx = tx.clone();
                promise.as_callback(move |outcome| {
                    let _ = tx.send((index, outcome));
                });
            }
            drop(tx);

            let mut slots: Vec<Option<Result<T, Error>>> = promises.iter().map(|_| None).collect();
            for _ in 0..slots.len() {
                let Ok((index, outcome)) = rx.recv() else {
                    break;
                };
                slots[index] = Some(outcome);
            }
            resolve.resolve(slots.into_iter().flatten().collect::<Vec<_>>());
        })
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use crate::error::Error;
    use crate::promise::Promise;

    fn slow(value: i32, millis: u64) -> Promise<i32> {
        Promise::new(move |resolve, _reject| {
            thread::sleep(Duration::from_millis(millis));
            resolve.resolve(value);
        })
    }

    fn slow_reject(reason: &'static str, millis: u64) -> Promise<i32> {
        Promise::new(move |_resolve, reject| {
            thread::sleep(Duration::from_millis(millis));
            reject.reject(reason);
        })
    }

    #[test]
    fn all_preserves_input_order() {
        // Settles out of order on purpose; the result stays index-ordered.
        let p = Promise::all([slow(1, 60), slow(2, 10), slow(3, 30)]);
        assert_eq!(p.wait(), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn all_rejects_on_first_arriving_failure() {
        let p = Promise::all([slow(1, 10), slow_reject("broken", 30), slow(3, 10)]);
        assert_eq!(p.wait(), Err(Error::Rejected("broken".into())));
    }

    #[test]
    fn all_of_nothing_resolves_immediately() {
        let p = Promise::<i32>::all([]);
        assert_eq!(p.wait(), Ok(Vec::new()));
    }

    #[test]
    fn race_adopts_the_first_settlement() {
        let p = Promise::race([slow(1, 200), slow(2, 10), slow(3, 200)]).unwrap();
        assert_eq!(p.wait(), Ok(2));
    }

    #[test]
    fn race_can_lose_to_a_rejection() {
        let p = Promise::race([slow(1, 200), slow_reject("fastest", 10)]).unwrap();
        assert_eq!(p.wait(), Err(Error::Rejected("fastest".into())));
    }

    #[test]
    fn race_of_nothing_yields_no_promise() {
        assert!(Promise::<i32>::race([]).is_none());
    }

    #[test]
    fn all_settled_reports_every_outcome_in_order() {
        let p = Promise::all_settled([slow(1, 40), slow_reject("second", 10)]);
        assert_eq!(
            p.wait(),
            Ok(vec![Ok(1), Err(Error::Rejected("second".into()))])
        );
    }

    #[test]
    fn all_settled_of_nothing_resolves_immediately() {
        let p = Promise::<i32>::all_settled([]);
        assert_eq!(p.wait(), Ok(Vec::new()));
    }

    #[test]
    fn each_collects_in_argument_order() {
        let p = Promise::each([slow(1, 50), slow(2, 10), slow(3, 30)]);
        assert_eq!(p.wait(), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn each_rejects_with_first_position_failure() {
        // The first child rejects immediately; the second child's outcome is
        // never needed.
        let p = Promise::each([slow_reject("first", 10), slow(2, 300)]);
        assert_eq!(p.wait(), Err(Error::Rejected("first".into())));
    }

    #[test]
    fn each_of_nothing_resolves_immediately() {
        let p = Promise::<i32>::each([]);
        assert_eq!(p.wait(), Ok(Vec::new()));
    }
}
