use std::sync::Arc;

use super::{Signal, Transform};
use crate::{Operations, SignalValue};

/// How a signal decides whether a write is a change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChangeDetection {
    /// Equal primitives are not a change; composites always are (see [`SignalValue`])
    #[default]
    PrimitiveEquality,
    /// Every write is a change
    Always,
}

/// Configures a [`Signal`] before creating it.
///
/// ```rust
/// use relay_signals::{ChangeDetection, Signal};
///
/// let percent = Signal::builder()
///     .value(0u8)
///     .transform(|value: u8, _: Option<&u8>| value.min(100))
///     .change_detection(ChangeDetection::Always)
///     .read_only(true)
///     .build();
///
/// percent.write(50); // rejected, read-only
/// assert_eq!(percent.read(), Some(0));
/// ```
pub struct SignalBuilder<T> {
    value: Option<T>,
    read_only: bool,
    change_detection: ChangeDetection,
    transform: Option<Transform<T>>,
}

impl<T: SignalValue> Default for SignalBuilder<T> {
    fn default() -> Self { Self::new() }
}

impl<T: SignalValue> SignalBuilder<T> {
    pub fn new() -> Self { Self { value: None, read_only: false, change_detection: ChangeDetection::default(), transform: None } }

    /// Initial value. It is stored as-is, without running the transform.
    pub fn value(mut self, value: T) -> Self {
        self.value = Some(value);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn change_detection(mut self, change_detection: ChangeDetection) -> Self {
        self.change_detection = change_detection;
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where F: Fn(T, Option<&T>) -> T + Send + Sync + 'static {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn build(self) -> Signal<T> {
        Signal::from_builder(self.value, self.read_only, Operations::new(self.change_detection), self.transform)
    }
}
