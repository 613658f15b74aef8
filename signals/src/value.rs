use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};

/// A value that can be held by a [`Signal`](crate::Signal).
///
/// `is_unchanged` is the equality gate consulted on every write. Primitives compare by value,
/// so writing an equal primitive is a no-op. Composite values (collections, smart pointers and
/// user types) keep the default, which always reports a change: a composite may have been
/// mutated in place, so identity says nothing about whether listeners need to hear about it.
///
/// User types opt in with an empty impl, or override `is_unchanged` to behave like a primitive:
///
/// ```rust
/// use relay_signals::SignalValue;
///
/// #[derive(Clone)]
/// struct Position { x: i32, y: i32 }
/// impl SignalValue for Position {}
/// ```
pub trait SignalValue: Clone + Send + Sync + 'static {
    /// Returns true when storing `self` over `previous` is not a change
    fn is_unchanged(&self, previous: &Self) -> bool {
        let _ = previous;
        false
    }
}

macro_rules! primitive_values {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SignalValue for $ty {
                fn is_unchanged(&self, previous: &Self) -> bool { self == previous }
            }
        )*
    };
}

primitive_values!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
);

// `None` plays the part of null: two nulls are equal, a null and a value never are
impl<T: SignalValue> SignalValue for Option<T> {
    fn is_unchanged(&self, previous: &Self) -> bool {
        match (self, previous) {
            (None, None) => true,
            (Some(value), Some(previous)) => value.is_unchanged(previous),
            _ => false,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> SignalValue for Vec<T> {}
impl<T: Clone + Send + Sync + 'static> SignalValue for VecDeque<T> {}
impl<T: Clone + Send + Sync + 'static> SignalValue for Box<T> {}
impl<T: ?Sized + Send + Sync + 'static> SignalValue for Arc<T> {}
impl<K: Clone + Send + Sync + 'static, V: Clone + Send + Sync + 'static, S: Clone + Send + Sync + 'static> SignalValue
    for HashMap<K, V, S>
{
}
impl<K: Clone + Send + Sync + 'static, V: Clone + Send + Sync + 'static> SignalValue for BTreeMap<K, V> {}
impl<T: Clone + Send + Sync + 'static, S: Clone + Send + Sync + 'static> SignalValue for HashSet<T, S> {}
impl<T: Clone + Send + Sync + 'static> SignalValue for BTreeSet<T> {}

/// Storage slot for a signal's value. `None` is the empty sentinel, which is distinct from any
/// stored value (including a stored `Option::None`).
pub(crate) struct ValueCell<T>(RwLock<Option<T>>);

impl<T> ValueCell<T> {
    pub fn new(value: Option<T>) -> Self { Self(RwLock::new(value)) }

    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let guard = self.0.read().expect("value lock is poisoned");
        f(guard.as_ref())
    }

    /// Stores `value`, handing back whatever was there before
    pub fn replace(&self, value: T) -> Option<T> { self.0.write().expect("value lock is poisoned").replace(value) }

    /// Empties the slot
    pub fn take(&self) -> Option<T> { self.0.write().expect("value lock is poisoned").take() }

    pub fn is_empty(&self) -> bool { self.0.read().expect("value lock is poisoned").is_none() }
}

impl<T: Clone> ValueCell<T> {
    pub fn value(&self) -> Option<T> { self.0.read().expect("value lock is poisoned").clone() }
}
