use relay_signals::*;
mod common;
use common::{recorder, watcher};

#[test]
fn test_pipe_into_read_only_signal() {
    let a = Signal::new(0);
    let b = Signal::builder().value(0).read_only(true).build();

    a.pipe(&b).unwrap();
    a.write(5);
    assert_eq!(b.read(), Some(5));

    // direct writes are still rejected
    assert_eq!(b.write(6), None);
    assert_eq!(b.read(), Some(5));
}

#[test]
fn test_pipe_chain() {
    let a = Signal::new("".to_string());
    let b = Signal::new("".to_string());
    let (listener, check) = recorder();

    a.pipe(&b).unwrap().pipe(&listener).unwrap();
    a.write("Ahoy!".to_string());
    assert_eq!(b.read().as_deref(), Some("Ahoy!"));
    assert_eq!(check(), [("Ahoy!".to_string(), Some("".to_string()))]);
}

#[test]
fn test_pipe_returns_the_listener() {
    let a = Signal::new(0);
    let b = Signal::new(0);
    let returned = a.pipe(b.clone()).unwrap();
    assert!(returned.ptr_eq(&b));
}

#[test]
fn test_downstream_rules_apply() {
    let (listener, check) = recorder();
    let celsius = Signal::new(0.0);
    let clamped = Signal::builder().value(0.0).transform(|value: f64, _: Option<&f64>| value.clamp(-50.0, 50.0)).build();
    celsius.pipe(&clamped).unwrap().pipe(&listener).unwrap();

    celsius.write(80.0);
    assert_eq!(clamped.read(), Some(50.0));
    // clamps to the same stored value, so the downstream gate suppresses it
    celsius.write(90.0);
    assert_eq!(check(), [(50.0, Some(0.0))]);
    assert_eq!(celsius.read(), Some(90.0));
}

#[test]
fn test_pipe_only_fires_on_upstream_change() {
    let (accumulate, check) = watcher();
    let a = Signal::new(1);
    let b = Signal::new(0);
    a.pipe(&b).unwrap();
    let _subscription = b.subscribe(move |value: i32| accumulate(value));

    a.write(1); // unchanged upstream, nothing flows
    assert!(check().is_empty());
    a.write(2);
    assert_eq!(check(), [2]);
}

#[test]
fn test_unpipe() {
    let a = Signal::new(0);
    let b = Signal::new(0);
    a.pipe(&b).unwrap();
    a.pipe(&b).unwrap();
    assert_eq!(a.listener_count(), 2);

    a.unpipe(&b);
    assert_eq!(a.listener_count(), 0);
    a.write(3);
    assert_eq!(b.read(), Some(0));
}

#[test]
fn test_pipe_into_self_is_rejected() {
    let a = Signal::new(0);
    assert_eq!(a.pipe(&a).err(), Some(SignalError::InvalidListener(InvalidListener::SelfReference)));
}

#[test]
fn test_pipe_into_disposed_signal_is_rejected() {
    let a = Signal::new(0);
    let b = Signal::new(0);
    b.dispose();
    let error = a.pipe(&b).unwrap_err();
    assert_eq!(error, SignalError::InvalidListener(InvalidListener::Disposed));
    assert_eq!(error.to_string(), "Invalid listener: target signal is disposed");
    assert_eq!(a.listener_count(), 0);
}

#[test]
fn test_downstream_disposed_after_piping() {
    let a = Signal::new(0);
    let b = Signal::new(0);
    a.pipe(&b).unwrap();
    b.dispose();

    // delivery to a disposed signal is a no-op
    a.write(1);
    assert_eq!(b.read(), None);
}

#[test]
fn test_channel_listener() {
    let (tx, rx) = std::sync::mpsc::channel();
    let a = Signal::new(0);
    a.notify(tx).unwrap();
    a.write(1);
    a.write(2);
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), [1, 2]);
}

#[test]
fn test_tokio_channel_listener() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let a = Signal::new(0);
    a.notify(tx).unwrap();
    a.write(7);
    assert_eq!(rx.try_recv().ok(), Some(7));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_unpipe_what_pipe_returned() {
    let (accumulate, check) = watcher();
    let a = Signal::new(0);
    let piped = a.pipe(move |value: &i32, _: Option<&i32>, _: &Signal<i32>| accumulate(*value)).unwrap();
    a.write(1);
    assert_eq!(check(), [1]);

    a.unpipe(piped);
    assert_eq!(a.listener_count(), 0);
    a.write(2);
    assert!(check().is_empty());

    // channel senders come back as the registered listener too
    let (tx, rx) = std::sync::mpsc::channel();
    let b = Signal::new(0);
    let piped = b.pipe(tx).unwrap();
    b.write(3);
    b.unnotify(&piped);
    b.write(4);
    assert_eq!(b.listener_count(), 0);
    assert_eq!(rx.try_iter().collect::<Vec<_>>(), [3]);
}
