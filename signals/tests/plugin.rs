use relay_signals::*;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
mod common;
use common::recorder;

/// Notifies on every write, like `ChangeDetection::Always`
struct AlwaysNotify;

impl<T: SignalValue> Plugin<T> for AlwaysNotify {
    type Config = ();
    fn apply(&self, operations: &mut Operations<T>, _: Option<&()>) { operations.set_gate(|_, _| false); }
}

/// Counts its applications and changes nothing
struct Counted(AtomicUsize);

impl Plugin<u16> for Counted {
    type Config = ();
    fn apply(&self, _: &mut Operations<u16>, _: Option<&()>) { self.0.fetch_add(1, Ordering::SeqCst); }
}

/// Fails while being applied
struct Broken;

impl Plugin<u32> for Broken {
    type Config = ();
    fn apply(&self, _: &mut Operations<u32>, _: Option<&()>) { panic!("plugin failed"); }
}

/// Treats numbers within a configurable distance as unchanged
struct Tolerance;

impl Plugin<i64> for Tolerance {
    type Config = i64;
    fn apply(&self, operations: &mut Operations<i64>, config: Option<&i64>) {
        let tolerance = config.copied().unwrap_or(0);
        operations.set_gate(move |new, previous| (new - previous).abs() <= tolerance);
    }
}

/// Records each delivery before handing it to the default delivery
struct Journal(Arc<Mutex<Vec<String>>>);

impl Plugin<String> for Journal {
    type Config = ();
    fn apply(&self, operations: &mut Operations<String>, _: Option<&()>) {
        let journal = self.0.clone();
        let deliver = operations.delivery();
        operations.set_delivery(move |listener, value, previous, source| {
            journal.lock().unwrap().push(format!("{previous:?} -> {value}"));
            deliver(listener, value, previous, source);
        });
    }
}

#[test]
fn test_plugin_replaces_the_gate() {
    let (listener, check) = recorder();
    let signal = Signal::new(1u8);
    signal.use_plugin(&Arc::new(AlwaysNotify), None);
    signal.notify(listener).unwrap();

    signal.write(1);
    signal.write(1);
    assert_eq!(check().len(), 2);

    // other signals keep the default gate
    let (listener, check) = recorder();
    let untouched = Signal::new(1u8);
    untouched.notify(listener).unwrap();
    untouched.write(1);
    assert!(check().is_empty());
}

#[test]
fn test_plugin_is_applied_once_per_signal() {
    let plugin = Arc::new(Counted(AtomicUsize::new(0)));
    let signal = Signal::new(1u16);
    signal.use_plugin(&plugin, None).use_plugin(&plugin.clone(), None);
    assert_eq!(plugin.0.load(Ordering::SeqCst), 1);

    // each signal keeps its own record
    Signal::new(2u16).use_plugin(&plugin, None);
    assert_eq!(plugin.0.load(Ordering::SeqCst), 2);
}

#[test]
fn test_distinct_instances_of_a_plugin_are_each_applied() {
    let first = Arc::new(Counted(AtomicUsize::new(0)));
    let second = Arc::new(Counted(AtomicUsize::new(0)));
    let signal = Signal::new(1u16);
    signal.use_plugin(&first, None).use_plugin(&second, None).use_plugin(&first, None);
    assert_eq!(first.0.load(Ordering::SeqCst), 1);
    assert_eq!(second.0.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panicking_plugin_leaves_the_signal_usable() {
    let (listener, check) = recorder();
    let signal = Signal::new(1u32);
    signal.notify(listener).unwrap();

    let broken = Arc::new(Broken);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        signal.use_plugin(&broken, None);
    }));
    assert!(result.is_err());

    // default gate and delivery are intact
    signal.write(1);
    signal.write(2);
    assert_eq!(check(), [(2, Some(1))]);

    // later plugins still apply
    signal.use_plugin(&Arc::new(AlwaysNotify), None);
    signal.write(2);
    assert_eq!(check(), [(2, Some(2))]);
}

#[test]
fn test_plugin_config() {
    let (listener, check) = recorder();
    let signal = Signal::new(100i64);
    let tolerance = Arc::new(Tolerance);
    signal.use_plugin(&tolerance, Some(&5));
    signal.notify(listener).unwrap();

    signal.write(104);
    assert_eq!(signal.read(), Some(100));
    signal.write(106);
    assert_eq!(check(), [(106, Some(100))]);

    // applying the same instance again, even with another config, is ignored
    signal.use_plugin(&tolerance, Some(&50));
    signal.write(120);
    assert_eq!(signal.read(), Some(120));
}

#[test]
fn test_plugin_wraps_delivery() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let (listener, check) = recorder();
    let signal = Signal::empty();
    signal.use_plugin(&Arc::new(Journal(journal.clone())), None);
    signal.notify(&listener).unwrap().notify(&listener).unwrap();

    signal.write("Ahoy!".to_string());
    assert_eq!(*journal.lock().unwrap(), ["None -> Ahoy!", "None -> Ahoy!"]);
    assert_eq!(check().len(), 2);
}
