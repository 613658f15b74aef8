use std::str::FromStr;
use std::sync::{Arc, Mutex};

use relay_signals::{Listener, Signal, SignalValue};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

/// Returns an accumulating closure and a closure that drains everything accumulated so far
#[allow(unused)]
pub fn watcher<T: Send + 'static>() -> (Arc<dyn Fn(T) + Send + Sync>, Box<dyn Fn() -> Vec<T> + Send + Sync>) {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let accumulate = {
        let changes = changes.clone();
        Arc::new(move |value: T| {
            changes.lock().unwrap().push(value);
        })
    };

    let check = Box::new(move || {
        let changes: Vec<T> = changes.lock().unwrap().drain(..).collect();
        changes
    });

    (accumulate, check)
}

/// A listener recording `(new, old)` pairs, plus a closure draining them
#[allow(unused)]
pub fn recorder<T: SignalValue>() -> (Listener<T>, Box<dyn Fn() -> Vec<(T, Option<T>)> + Send + Sync>) {
    let (accumulate, check) = watcher();
    let listener = Listener::callback(move |new: &T, old: Option<&T>, _: &Signal<T>| accumulate((new.clone(), old.cloned())));
    (listener, check)
}
