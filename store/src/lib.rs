/*!
A keyed store of values, any of which can be promoted to a relay signal

Keys hold either a raw value or a [`Signal`]. Reads and writes go through the signal when there is
one, so its transform, equality gate and read-only flag apply. The store itself never notifies
anyone; observers attach to the per-key signals handed out by [`SignalStore::provide`].

```rust
use relay_store::SignalStore;
use relay_signals::Subscribe;

let store = SignalStore::new();
store.set("greeting", "Ahoy!".to_string());

let greeting = store.provide("greeting");
let _subscription = greeting.subscribe(|value: String| println!("greeting: {value}"));

store.set("greeting", "Arrr!".to_string());
// Should print:
// greeting: Arrr!
assert_eq!(store.get("greeting").as_deref(), Some("Arrr!"));
```
*/

mod error;

pub use error::*;

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use relay_signals::{IntoListener, Signal, SignalValue};
use tracing::debug;

enum Entry<T> {
    Raw(T),
    Signal(Signal<T>),
}

/// Keyed values and signals. Cloning shares the same store.
pub struct SignalStore<T>(Arc<RwLock<BTreeMap<String, Entry<T>>>>);

impl<T> Clone for SignalStore<T> {
    fn clone(&self) -> Self { Self(Arc::clone(&self.0)) }
}

impl<T: SignalValue> Default for SignalStore<T> {
    fn default() -> Self { Self::new() }
}

impl<T: SignalValue> SignalStore<T> {
    pub fn new() -> Self { Self(Arc::new(RwLock::new(BTreeMap::new()))) }

    fn signal(&self, key: &str) -> Option<Signal<T>> {
        match self.0.read().expect("store lock is poisoned").get(key) {
            Some(Entry::Signal(signal)) => Some(signal.clone()),
            _ => None,
        }
    }

    /// Sets one value. Keys backed by a signal are written through it.
    pub fn set(&self, key: impl Into<String>, value: T) -> &Self {
        let key = key.into();
        // Write to signals outside the lock: their listeners may read the store
        let signal = {
            let mut entries = self.0.write().expect("store lock is poisoned");
            match entries.get(&key) {
                Some(Entry::Signal(signal)) => Some((signal.clone(), value)),
                _ => {
                    entries.insert(key, Entry::Raw(value));
                    None
                }
            }
        };
        if let Some((signal, value)) = signal {
            signal.write(value);
        }
        self
    }

    /// Sets several values, one key at a time
    pub fn set_many<K, I>(&self, values: I) -> &Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, T)>,
    {
        for (key, value) in values {
            self.set(key, value);
        }
        self
    }

    /// The key's value; `None` for unknown keys and for signals that hold nothing
    pub fn get(&self, key: &str) -> Option<T> {
        match self.0.read().expect("store lock is poisoned").get(key)? {
            Entry::Raw(value) => Some(value.clone()),
            Entry::Signal(signal) => signal.read(),
        }
    }

    /// Snapshot of every key that currently has a value
    pub fn get_all(&self) -> BTreeMap<String, T> {
        let entries = self.0.read().expect("store lock is poisoned");
        entries
            .iter()
            .filter_map(|(key, entry)| {
                let value = match entry {
                    Entry::Raw(value) => Some(value.clone()),
                    Entry::Signal(signal) => signal.read(),
                };
                value.map(|value| (key.clone(), value))
            })
            .collect()
    }

    /// The signal for `key`, created on first request and seeded with the key's current value.
    /// Every later call returns the same signal.
    pub fn provide(&self, key: &str) -> Signal<T> {
        let mut entries = self.0.write().expect("store lock is poisoned");
        match entries.get(key) {
            Some(Entry::Signal(signal)) => signal.clone(),
            existing => {
                let signal = match existing {
                    Some(Entry::Raw(value)) => Signal::new(value.clone()),
                    _ => Signal::empty(),
                };
                entries.insert(key.to_string(), Entry::Signal(signal.clone()));
                debug!(key, "signal provided");
                signal
            }
        }
    }

    /// Backs `key` with an existing signal, returning the signal it replaces (if any).
    /// A raw value previously stored under `key` is dropped.
    pub fn bind(&self, key: impl Into<String>, signal: Signal<T>) -> Result<Option<Signal<T>>, StoreError> {
        let key = key.into();
        if signal.is_disposed() {
            return Err(StoreError::DisposedSignal(key));
        }
        let replaced = self.0.write().expect("store lock is poisoned").insert(key, Entry::Signal(signal));
        Ok(match replaced {
            Some(Entry::Signal(signal)) => Some(signal),
            _ => None,
        })
    }

    /// Pipes the key's signal (provided on demand) into `listener`. Hands back what
    /// [`Signal::pipe`] does, for a later `unpipe` on the provided signal.
    pub fn pipe<L>(&self, key: &str, listener: L) -> Result<L::Piped, StoreError>
    where L: IntoListener<T> {
        Ok(self.provide(key).pipe(listener)?)
    }

    /// Whether `key` has been provided as a signal
    pub fn is_signal(&self, key: &str) -> bool { self.signal(key).is_some() }

    pub fn contains_key(&self, key: &str) -> bool { self.0.read().expect("store lock is poisoned").contains_key(key) }

    pub fn keys(&self) -> Vec<String> { self.0.read().expect("store lock is poisoned").keys().cloned().collect() }

    pub fn len(&self) -> usize { self.0.read().expect("store lock is poisoned").len() }

    pub fn is_empty(&self) -> bool { self.0.read().expect("store lock is poisoned").is_empty() }

    /// Disposes every signal in the store and removes all keys
    pub fn dispose(&self) {
        let entries = std::mem::take(&mut *self.0.write().expect("store lock is poisoned"));
        for entry in entries.into_values() {
            if let Entry::Signal(signal) = entry {
                signal.dispose();
            }
        }
    }
}
