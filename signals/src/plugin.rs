use std::any::Any;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{ChangeDetection, Listener, Signal, SignalValue};

/// Equality gate: returns true when writing `new` over `previous` should be suppressed
pub type ChangeGate<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync + 'static>;

/// Hands one change to one listener: `(listener, new, previous, source)`
pub type Delivery<T> = Arc<dyn Fn(&Listener<T>, &T, Option<&T>, &Signal<T>) + Send + Sync + 'static>;

/// The per-signal table of operations plugins may substitute.
pub struct Operations<T> {
    gate: ChangeGate<T>,
    delivery: Delivery<T>,
}

impl<T> Clone for Operations<T> {
    fn clone(&self) -> Self { Self { gate: self.gate.clone(), delivery: self.delivery.clone() } }
}

impl<T: SignalValue> Operations<T> {
    pub fn new(change_detection: ChangeDetection) -> Self {
        let gate: ChangeGate<T> = match change_detection {
            ChangeDetection::PrimitiveEquality => Arc::new(|new: &T, previous: &T| new.is_unchanged(previous)),
            ChangeDetection::Always => Arc::new(|_: &T, _: &T| false),
        };
        let delivery: Delivery<T> = Arc::new(|listener: &Listener<T>, value: &T, previous: Option<&T>, source: &Signal<T>| {
            listener.deliver(value, previous, source)
        });
        Self { gate, delivery }
    }

    /// The current gate, e.g. for a plugin that wraps rather than replaces it
    pub fn gate(&self) -> ChangeGate<T> { self.gate.clone() }

    pub fn set_gate<F>(&mut self, gate: F)
    where F: Fn(&T, &T) -> bool + Send + Sync + 'static {
        self.gate = Arc::new(gate);
    }

    /// The current delivery, e.g. for a plugin that wraps rather than replaces it
    pub fn delivery(&self) -> Delivery<T> { self.delivery.clone() }

    pub fn set_delivery<F>(&mut self, delivery: F)
    where F: Fn(&Listener<T>, &T, Option<&T>, &Signal<T>) + Send + Sync + 'static {
        self.delivery = Arc::new(delivery);
    }

    pub(crate) fn is_unchanged(&self, new: &T, previous: &T) -> bool { (self.gate)(new, previous) }

    pub(crate) fn deliver(&self, listener: &Listener<T>, value: &T, previous: Option<&T>, source: &Signal<T>) {
        (self.delivery)(listener, value, previous, source)
    }
}

/// An extension applied to a signal's [`Operations`] through [`Signal::use_plugin`].
///
/// A plugin is identified by its `Arc`: applying the same instance to a signal twice runs
/// `apply` only once, while a second instance of the same type is applied on its own.
/// Plugins only ever see the table of the signal they are applied to.
///
/// ```rust
/// use std::sync::Arc;
/// use relay_signals::{Operations, Plugin, Signal};
///
/// /// Treats values within `tolerance` of each other as unchanged
/// struct Tolerance;
///
/// impl Plugin<f64> for Tolerance {
///     type Config = f64;
///     fn apply(&self, operations: &mut Operations<f64>, config: Option<&f64>) {
///         let tolerance = config.copied().unwrap_or(0.0);
///         operations.set_gate(move |new, previous| (new - previous).abs() <= tolerance);
///     }
/// }
///
/// let signal = Signal::new(1.0);
/// signal.use_plugin(&Arc::new(Tolerance), Some(&0.5));
/// signal.write(1.2);
/// assert_eq!(signal.read(), Some(1.0));
/// ```
pub trait Plugin<T>: 'static {
    type Config;

    fn apply(&self, operations: &mut Operations<T>, config: Option<&Self::Config>);
}

/// Plugin instances already applied to one signal. Holding the `Arc`s keeps their addresses
/// from being reused by later instances.
#[derive(Default)]
pub(crate) struct AppliedPlugins(Mutex<Vec<Arc<dyn Any + Send + Sync>>>);

impl AppliedPlugins {
    /// Runs `apply` unless `plugin` was already applied. Returns whether it ran.
    ///
    /// Application is serialized per signal. `plugin` is only recorded once `apply` returns, so
    /// a panicking plugin can be retried; the poisoned lock is recovered since nothing was changed.
    pub fn apply_once<P>(&self, plugin: &Arc<P>, apply: impl FnOnce()) -> bool
    where P: Send + Sync + 'static {
        let mut applied = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let address = Arc::as_ptr(plugin) as *const ();
        if applied.iter().any(|existing| Arc::as_ptr(existing) as *const () == address) {
            return false;
        }
        apply();
        applied.push(plugin.clone());
        true
    }
}
