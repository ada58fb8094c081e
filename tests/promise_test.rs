use std::thread;
use std::time::Duration;

use futures::executor::block_on;
use promise_kept::{Error, Promise};

#[test]
fn polling_matches_blocking_wait() {
    let promise = Promise::new(|resolve, _reject| {
        thread::sleep(Duration::from_millis(20));
        resolve.resolve(String::from("🍓"));
    });

    // One async waiter parked before settlement, one blocking waiter, and a
    // late async arrival after settlement all see the same outcome.
    let early = promise.clone();
    let poller = thread::spawn(move || block_on(early));
    assert_eq!(promise.wait(), Ok(String::from("🍓")));
    assert_eq!(poller.join().unwrap(), Ok(String::from("🍓")));
    assert_eq!(block_on(promise.clone()), Ok(String::from("🍓")));
}

#[test]
fn polling_observes_rejections_too() {
    let promise: Promise<i32> = Promise::new(|_resolve, reject| {
        thread::sleep(Duration::from_millis(10));
        reject.reject("went sideways");
    });
    assert_eq!(
        block_on(promise),
        Err(Error::Rejected("went sideways".into()))
    );
}

#[test]
fn a_chain_across_the_whole_surface() {
    let doubled = Promise::resolve(4).then(|n| n * 2);
    let flattened: Promise<i32> = Promise::new(|resolve, _reject| {
        let nested = Promise::new(|resolve, _reject| {
            thread::sleep(Duration::from_millis(15));
            resolve.resolve(3);
        });
        resolve.resolve(nested);
    });
    let combined = Promise::all([doubled, flattened]).then(|values| values.iter().sum::<i32>());
    assert_eq!(combined.wait(), Ok(11));
}

#[test]
fn rejection_skips_then_and_reaches_catch() {
    let chained = Promise::<i32>::reject("root cause")
        .then(|n| n + 1)
        .then(|n| n * 2)
        .catch(|err| format!("handled: {err}"));
    assert_eq!(
        chained.wait(),
        Err(Error::Rejected("handled: root cause".into()))
    );
}

#[test]
fn panicking_then_handler_rejects_the_link() {
    let chained = Promise::resolve(1).then(|_n: i32| -> i32 { panic!("handler blew up") });
    match chained.wait() {
        Err(Error::Panicked(message)) => assert_eq!(message, "handler blew up"),
        other => panic!("expected panic rejection, got {other:?}"),
    }
}
