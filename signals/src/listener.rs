use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::{Signal, SignalValue};

static TOTAL_LISTENERS: AtomicUsize = AtomicUsize::new(0);

/// Number of listener registrations currently live across every signal in the process.
///
/// Diagnostic only: use it to track down listeners that were never removed. It never affects
/// how signals behave.
pub fn total_listeners() -> usize { TOTAL_LISTENERS.load(Ordering::Relaxed) }

fn release(count: usize) {
    if count > 0 {
        TOTAL_LISTENERS.fetch_sub(count, Ordering::Relaxed);
    }
}

/// Callback invoked with `(new value, previous value, source signal)`.
/// The previous value is `None` when the signal was empty before the write.
pub type Callback<T> = Arc<dyn Fn(&T, Option<&T>, &Signal<T>) + Send + Sync + 'static>;

/// Something that can be notified when a signal changes.
pub enum Listener<T> {
    /// A plain callback receiving `(new, previous, source)`
    Callback(Callback<T>),
    /// A downstream signal. It receives the new value as a write (bypassing its read-only flag),
    /// so its own transform and equality gate apply.
    Signal(Signal<T>),
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        match self {
            Listener::Callback(callback) => Listener::Callback(callback.clone()),
            Listener::Signal(signal) => Listener::Signal(signal.clone()),
        }
    }
}

impl<T> std::fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Listener::Callback(callback) => write!(f, "Listener::Callback({:p})", Arc::as_ptr(callback) as *const ()),
            Listener::Signal(signal) => write!(f, "Listener::Signal({:p})", signal.as_ptr()),
        }
    }
}

impl<T> Listener<T> {
    /// Wraps a closure. Keep a clone of the returned listener to remove it later.
    pub fn callback<F>(callback: F) -> Self
    where F: Fn(&T, Option<&T>, &Signal<T>) + Send + Sync + 'static {
        Listener::Callback(Arc::new(callback))
    }

    /// Whether both listeners refer to the same callback or the same signal
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Listener::Callback(a), Listener::Callback(b)) => Arc::ptr_eq(a, b),
            (Listener::Signal(a), Listener::Signal(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl<T: SignalValue> Listener<T> {
    /// Hands a change to this listener
    pub fn deliver(&self, value: &T, previous: Option<&T>, source: &Signal<T>) {
        match self {
            Listener::Callback(callback) => callback(value, previous, source),
            Listener::Signal(target) => {
                target.receive(value.clone());
            }
        }
    }
}

/// Trait for types that can be converted into listeners.
///
/// `Piped` is what [`Signal::pipe`] hands back. It can always be passed to
/// [`Signal::unpipe`]: closures and channel senders come back as the [`Listener`] that was
/// actually registered, signals come back as themselves so pipes chain.
pub trait IntoListener<T> {
    type Piped;

    fn into_listener(self) -> Listener<T>;

    /// Converts, also returning the handle that identifies the registration
    fn into_piped(self) -> (Listener<T>, Self::Piped);
}

/// Trait for values that identify an existing registration, accepted by
/// [`Signal::unnotify`] and [`Signal::unpipe`].
///
/// Only identity-bearing types implement it. A closure or channel sender gets a fresh identity
/// each time it is converted, so it could never match what was registered.
pub trait RemoveListener<T> {
    fn to_listener(self) -> Listener<T>;
}

impl<F, T> IntoListener<T> for F
where F: Fn(&T, Option<&T>, &Signal<T>) + Send + Sync + 'static
{
    type Piped = Listener<T>;
    fn into_listener(self) -> Listener<T> { Listener::Callback(Arc::new(self)) }
    fn into_piped(self) -> (Listener<T>, Listener<T>) { registered(self.into_listener()) }
}

impl<T> IntoListener<T> for Listener<T> {
    type Piped = Listener<T>;
    fn into_listener(self) -> Listener<T> { self }
    fn into_piped(self) -> (Listener<T>, Listener<T>) { registered(self) }
}

impl<'a, T> IntoListener<T> for &'a Listener<T> {
    type Piped = &'a Listener<T>;
    fn into_listener(self) -> Listener<T> { self.clone() }
    fn into_piped(self) -> (Listener<T>, Self::Piped) { (self.clone(), self) }
}

impl<T> IntoListener<T> for Callback<T> {
    type Piped = Callback<T>;
    fn into_listener(self) -> Listener<T> { Listener::Callback(self) }
    fn into_piped(self) -> (Listener<T>, Callback<T>) { (Listener::Callback(self.clone()), self) }
}

impl<T> IntoListener<T> for Signal<T> {
    type Piped = Signal<T>;
    fn into_listener(self) -> Listener<T> { Listener::Signal(self) }
    fn into_piped(self) -> (Listener<T>, Signal<T>) { (Listener::Signal(self.clone()), self) }
}

impl<'a, T> IntoListener<T> for &'a Signal<T> {
    type Piped = &'a Signal<T>;
    fn into_listener(self) -> Listener<T> { Listener::Signal(self.clone()) }
    fn into_piped(self) -> (Listener<T>, Self::Piped) { (Listener::Signal(self.clone()), self) }
}

// Channel senders forward the new value and ignore send errors
impl<T> IntoListener<T> for std::sync::mpsc::Sender<T>
where T: SignalValue
{
    type Piped = Listener<T>;
    fn into_listener(self) -> Listener<T> {
        forward(move |value| {
            let _ = self.send(value);
        })
    }
    fn into_piped(self) -> (Listener<T>, Listener<T>) { registered(self.into_listener()) }
}

#[cfg(feature = "tokio")]
impl<T> IntoListener<T> for tokio::sync::mpsc::UnboundedSender<T>
where T: SignalValue
{
    type Piped = Listener<T>;
    fn into_listener(self) -> Listener<T> {
        forward(move |value| {
            let _ = self.send(value);
        })
    }
    fn into_piped(self) -> (Listener<T>, Listener<T>) { registered(self.into_listener()) }
}

fn registered<T>(listener: Listener<T>) -> (Listener<T>, Listener<T>) { (listener.clone(), listener) }

fn forward<T, F>(send: F) -> Listener<T>
where
    T: SignalValue,
    F: Fn(T) + Send + Sync + 'static,
{
    Listener::Callback(Arc::new(move |value: &T, _: Option<&T>, _: &Signal<T>| send(value.clone())))
}

impl<T> RemoveListener<T> for Listener<T> {
    fn to_listener(self) -> Listener<T> { self }
}

impl<T> RemoveListener<T> for &Listener<T> {
    fn to_listener(self) -> Listener<T> { self.clone() }
}

impl<T> RemoveListener<T> for Callback<T> {
    fn to_listener(self) -> Listener<T> { Listener::Callback(self) }
}

impl<T> RemoveListener<T> for &Callback<T> {
    fn to_listener(self) -> Listener<T> { Listener::Callback(self.clone()) }
}

impl<T> RemoveListener<T> for Signal<T> {
    fn to_listener(self) -> Listener<T> { Listener::Signal(self) }
}

impl<T> RemoveListener<T> for &Signal<T> {
    fn to_listener(self) -> Listener<T> { Listener::Signal(self.clone()) }
}

/// Ordered listener registrations of one signal. Duplicates are separate slots.
/// `None` once closed by disposal; a closed set ignores further registrations.
pub(crate) struct ListenerSet<T>(RwLock<Option<Vec<Listener<T>>>>);

impl<T> ListenerSet<T> {
    pub fn new() -> Self { Self(RwLock::new(Some(Vec::new()))) }

    /// Appends a registration. Returns false if the set is closed.
    pub fn add(&self, listener: Listener<T>) -> bool {
        let mut listeners = self.0.write().expect("listeners lock is poisoned");
        match listeners.as_mut() {
            Some(listeners) => {
                listeners.push(listener);
                TOTAL_LISTENERS.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Removes every registration matching `listener`, returning how many were removed
    pub fn remove(&self, listener: &Listener<T>) -> usize {
        let mut listeners = self.0.write().expect("listeners lock is poisoned");
        let Some(listeners) = listeners.as_mut() else { return 0 };
        let before = listeners.len();
        listeners.retain(|registered| !registered.same_as(listener));
        let removed = before - listeners.len();
        release(removed);
        removed
    }

    /// Copy of the current registrations, so delivery can run without holding the lock
    pub fn snapshot(&self) -> Vec<Listener<T>> {
        self.0.read().expect("listeners lock is poisoned").as_ref().map(|listeners| listeners.to_vec()).unwrap_or_default()
    }

    pub fn len(&self) -> usize { self.0.read().expect("listeners lock is poisoned").as_ref().map_or(0, Vec::len) }

    /// Drops every registration and refuses new ones.
    /// Returns the number released, or `None` if the set was already closed.
    pub fn close(&self) -> Option<usize> {
        let listeners = self.0.write().expect("listeners lock is poisoned").take()?;
        release(listeners.len());
        Some(listeners.len())
    }

    pub fn is_closed(&self) -> bool { self.0.read().expect("listeners lock is poisoned").is_none() }
}

impl<T> Drop for ListenerSet<T> {
    fn drop(&mut self) {
        // A dropped signal's registrations are no longer live
        if let Ok(listeners) = self.0.get_mut() {
            if let Some(listeners) = listeners.take() {
                release(listeners.len());
            }
        }
    }
}
