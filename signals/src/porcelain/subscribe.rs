use std::sync::{Arc, Weak};

use crate::{Callback, Listener, Signal, SignalValue, WeakSignal};

/// Trait for subscribing to changes with a value-only closure, removed again when the guard drops
pub trait Subscribe<T: 'static> {
    /// Subscribe to changes with a listener that receives the new value
    fn subscribe<F>(&self, listener: F) -> SubscriptionGuard
    where F: Fn(T) + Send + Sync + 'static;
}

impl<T: SignalValue> Subscribe<T> for Signal<T> {
    fn subscribe<F>(&self, listener: F) -> SubscriptionGuard
    where F: Fn(T) + Send + Sync + 'static {
        let callback: Callback<T> = Arc::new(move |value: &T, _: Option<&T>, _: &Signal<T>| listener(value.clone()));
        self.attach(Listener::Callback(callback.clone()));
        SubscriptionGuard::new(self.downgrade(), Arc::downgrade(&callback))
    }
}

/// Removes its listener from the signal when dropped. Keeps neither the signal nor the listener
/// alive, so disposing the signal releases the listener right away.
#[must_use = "the subscription ends when the guard is dropped"]
pub struct SubscriptionGuard {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SubscriptionGuard {
    fn new<T: SignalValue>(signal: WeakSignal<T>, callback: Weak<dyn Fn(&T, Option<&T>, &Signal<T>) + Send + Sync>) -> Self {
        Self {
            release: Some(Box::new(move || {
                if let (Some(signal), Some(callback)) = (signal.upgrade(), callback.upgrade()) {
                    signal.unnotify(Listener::Callback(callback));
                }
            })),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}
