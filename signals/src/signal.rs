mod builder;

pub use builder::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};

use tracing::{debug, trace};

use crate::{
    error::{InvalidListener, SignalError},
    listener::{IntoListener, Listener, ListenerSet, RemoveListener},
    plugin::{AppliedPlugins, Operations, Plugin},
    value::{SignalValue, ValueCell},
};

/// Rewrites an incoming value before it is compared and stored: `(incoming, previous) -> stored`
pub type Transform<T> = Arc<dyn Fn(T, Option<&T>) -> T + Send + Sync + 'static>;

struct Inner<T> {
    value: ValueCell<T>,
    listeners: ListenerSet<T>,
    transform: RwLock<Option<Transform<T>>>,
    read_only: AtomicBool,
    operations: RwLock<Operations<T>>,
    plugins: AppliedPlugins,
}

/// A single-value observable cell.
///
/// Holds at most one value (or nothing, before the first write and after disposal) and notifies
/// its listeners, in registration order, every time a write changes it. Delivery is synchronous:
/// every listener has run by the time [`write`](Signal::write) returns.
///
/// Cloning a `Signal` shares the same underlying cell.
///
/// ```rust
/// use relay_signals::{Listener, Signal};
///
/// let greeting = Signal::empty();
/// assert_eq!(greeting.read(), None);
///
/// greeting.notify(Listener::callback(|new: &String, old: Option<&String>, _: &Signal<String>| {
///     println!("{old:?} -> {new}");
/// })).unwrap();
///
/// greeting.write("Ahoy!".to_string());
/// assert_eq!(greeting.read().as_deref(), Some("Ahoy!"));
/// ```
pub struct Signal<T>(Arc<Inner<T>>);

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self { Self(Arc::clone(&self.0)) }
}

/// A non-owning handle to a [`Signal`]
pub struct WeakSignal<T>(Weak<Inner<T>>);

impl<T> Clone for WeakSignal<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> WeakSignal<T> {
    pub fn upgrade(&self) -> Option<Signal<T>> { self.0.upgrade().map(Signal) }
}

impl<T> Signal<T> {
    /// Whether both handles refer to the same cell
    pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }

    pub(crate) fn as_ptr(&self) -> *const () { Arc::as_ptr(&self.0) as *const () }

    pub fn downgrade(&self) -> WeakSignal<T> { WeakSignal(Arc::downgrade(&self.0)) }

    /// Number of live listener registrations across all signals
    pub fn total_listeners() -> usize { crate::listener::total_listeners() }

    /// Number of listener registrations on this signal
    pub fn listener_count(&self) -> usize { self.0.listeners.len() }

    pub fn is_disposed(&self) -> bool { self.0.listeners.is_closed() }

    pub fn is_read_only(&self) -> bool { self.0.read_only.load(Ordering::Acquire) }

    /// Rejects (or accepts again) direct writes. Values arriving through a pipe are always accepted.
    pub fn set_read_only(&self, read_only: bool) -> &Self {
        self.0.read_only.store(read_only, Ordering::Release);
        self
    }

    /// Whether the signal currently holds no value
    pub fn is_empty(&self) -> bool { self.0.value.is_empty() }

    /// Calls a closure with a borrow of the current value, `None` if empty
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R { self.0.value.with(f) }

    /// Installs a transform that rewrites every incoming value before comparison and storage.
    /// The transform receives the previous value (`None` if empty) and must return the value to store.
    pub fn set_transform<F>(&self, transform: F) -> &Self
    where F: Fn(T, Option<&T>) -> T + Send + Sync + 'static {
        *self.0.transform.write().expect("transform lock is poisoned") = Some(Arc::new(transform));
        self
    }

    pub fn clear_transform(&self) -> &Self {
        *self.0.transform.write().expect("transform lock is poisoned") = None;
        self
    }

    pub fn has_transform(&self) -> bool { self.0.transform.read().expect("transform lock is poisoned").is_some() }

    /// Clears the value and every listener registration. The signal stays usable but inert:
    /// writes, triggers and registrations become no-ops. Calling this again does nothing.
    pub fn dispose(&self) {
        if let Some(released) = self.0.listeners.close() {
            self.0.value.take();
            *self.0.transform.write().expect("transform lock is poisoned") = None;
            debug!(signal = ?self.as_ptr(), released, "signal disposed");
        }
    }
}

impl<T: SignalValue> Signal<T> {
    pub fn new(value: T) -> Self { Self::builder().value(value).build() }

    /// A signal that holds no value yet
    pub fn empty() -> Self { Self::builder().build() }

    pub fn builder() -> SignalBuilder<T> { SignalBuilder::new() }

    fn from_builder(value: Option<T>, read_only: bool, operations: Operations<T>, transform: Option<Transform<T>>) -> Self {
        Self(Arc::new(Inner {
            value: ValueCell::new(value),
            listeners: ListenerSet::new(),
            transform: RwLock::new(transform),
            read_only: AtomicBool::new(read_only),
            operations: RwLock::new(operations),
            plugins: AppliedPlugins::default(),
        }))
    }

    /// Returns a clone of the current value, `None` if empty or disposed
    pub fn read(&self) -> Option<T> { self.0.value.value() }

    /// Writes a new value and notifies listeners if it changed.
    ///
    /// Ignored if the signal is read-only or disposed. Returns the value that was replaced, or
    /// `None` if the signal was empty or nothing was stored.
    pub fn write(&self, value: T) -> Option<T> {
        if self.is_read_only() {
            debug!(signal = ?self.as_ptr(), "write to read-only signal ignored");
            return None;
        }
        self.store(value)
    }

    /// Entry point for values arriving from an upstream signal; bypasses the read-only flag
    pub(crate) fn receive(&self, value: T) -> Option<T> { self.store(value) }

    fn store(&self, value: T) -> Option<T> {
        if self.is_disposed() {
            debug!(signal = ?self.as_ptr(), "write to disposed signal ignored");
            return None;
        }

        let transform = self.0.transform.read().expect("transform lock is poisoned").clone();
        let operations = self.operations();

        let value = match transform {
            Some(transform) => {
                let previous = self.read();
                transform(value, previous.as_ref())
            }
            None => value,
        };

        if self.with(|previous| previous.is_some_and(|previous| operations.is_unchanged(&value, previous))) {
            trace!(signal = ?self.as_ptr(), "value unchanged");
            return None;
        }

        // The transform or a nested write may have disposed the signal
        if self.is_disposed() {
            debug!(signal = ?self.as_ptr(), "signal disposed during write");
            return None;
        }

        let previous = self.0.value.replace(value.clone());
        self.deliver(&operations, &value, previous.as_ref());
        previous
    }

    /// Notifies every listener with the current value as both new and previous value, skipping
    /// the equality gate. Use after mutating a composite value in place. No-op while empty.
    pub fn trigger(&self) -> &Self {
        if let Some(current) = self.read() {
            let operations = self.operations();
            self.deliver(&operations, &current, Some(&current));
        }
        self
    }

    fn deliver(&self, operations: &Operations<T>, value: &T, previous: Option<&T>) {
        // Iterate a snapshot: listeners may register, remove or write re-entrantly
        let listeners = self.0.listeners.snapshot();
        trace!(signal = ?self.as_ptr(), listeners = listeners.len(), "notifying listeners");
        for listener in &listeners {
            operations.deliver(listener, value, previous, self);
        }
    }

    fn operations(&self) -> Operations<T> { self.0.operations.read().expect("operations lock is poisoned").clone() }

    /// Registers a listener, notified after every change in registration order.
    /// Registering the same listener again adds another slot, so it is notified once per registration.
    ///
    /// Fails with [`SignalError::InvalidListener`] if the listener is this signal itself or a
    /// disposed signal. Registering on a disposed signal is a no-op.
    pub fn notify<L>(&self, listener: L) -> Result<&Self, SignalError>
    where L: IntoListener<T> {
        let listener = listener.into_listener();
        self.validate(&listener)?;
        self.attach(listener);
        Ok(self)
    }

    fn validate(&self, listener: &Listener<T>) -> Result<(), InvalidListener> {
        if let Listener::Signal(target) = listener {
            if target.ptr_eq(self) {
                return Err(InvalidListener::SelfReference);
            }
            if target.is_disposed() {
                return Err(InvalidListener::Disposed);
            }
        }
        Ok(())
    }

    pub(crate) fn attach(&self, listener: Listener<T>) {
        if !self.0.listeners.add(listener) {
            debug!(signal = ?self.as_ptr(), "listener registration on disposed signal ignored");
        }
    }

    /// Removes every registration of `listener`. Removing something that was never registered is a no-op.
    pub fn unnotify<L>(&self, listener: L) -> &Self
    where L: RemoveListener<T> {
        let removed = self.0.listeners.remove(&listener.to_listener());
        trace!(signal = ?self.as_ptr(), removed, "listener removed");
        self
    }

    /// Registers `listener` like [`notify`](Signal::notify) but hands it back, so chains read left to right:
    ///
    /// ```rust
    /// use relay_signals::Signal;
    ///
    /// let (a, b, c) = (Signal::new(0), Signal::new(0), Signal::new(0));
    /// a.pipe(&b).unwrap().pipe(&c).unwrap();
    /// a.write(3);
    /// assert_eq!(c.read(), Some(3));
    /// ```
    ///
    /// A piped signal accepts the incoming value even if it is read-only. Closures and channel
    /// senders come back as the registered [`Listener`], which `unpipe` accepts.
    pub fn pipe<L>(&self, listener: L) -> Result<L::Piped, SignalError>
    where L: IntoListener<T> {
        let (listener, piped) = listener.into_piped();
        self.notify(listener)?;
        Ok(piped)
    }

    pub fn unpipe<L>(&self, listener: L) -> &Self
    where L: RemoveListener<T> {
        self.unnotify(listener)
    }

    /// Applies a plugin to this signal's operation table, once per plugin instance.
    /// Applying a clone of the same `Arc` again is a no-op; a separate instance is applied.
    pub fn use_plugin<P>(&self, plugin: &Arc<P>, config: Option<&P::Config>) -> &Self
    where P: Plugin<T> + Send + Sync {
        // The plugin works on a copy, so a panicking plugin leaves the table untouched
        let applied = self.0.plugins.apply_once(plugin, || {
            let mut operations = self.operations();
            plugin.apply(&mut operations, config);
            *self.0.operations.write().expect("operations lock is poisoned") = operations;
        });
        if applied {
            debug!(signal = ?self.as_ptr(), plugin = std::any::type_name::<P>(), "plugin applied");
        }
        self
    }
}

impl<T: SignalValue> Default for Signal<T> {
    fn default() -> Self { Self::empty() }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with(|value| {
            f.debug_struct("Signal")
                .field("value", &value)
                .field("listeners", &self.listener_count())
                .field("read_only", &self.is_read_only())
                .field("disposed", &self.is_disposed())
                .finish()
        })
    }
}
