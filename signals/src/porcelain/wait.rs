/// Trait for waiting on signal values asynchronously
pub trait Wait<T: 'static> {
    /// Wait for the signal to hold a specific value. Resolves to false if the signal is
    /// disposed before that happens.
    fn wait_value(&self, target_value: T) -> impl std::future::Future<Output = bool> + Send
    where T: PartialEq;

    /// Wait for the signal to hold a value matching the given predicate. Resolves to `None` if
    /// the signal is disposed first.
    fn wait_for<F, R>(&self, predicate: F) -> impl std::future::Future<Output = Option<R::Output>> + Send
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: WaitResult;
}

/// What a `wait_for` predicate returns: `Some(output)` from `result()` ends the wait with
/// `output`, `None` keeps waiting for the next change.
pub trait WaitResult {
    type Output;
    fn result(self) -> Option<Self::Output>;
}

// true ends the wait
impl WaitResult for bool {
    type Output = ();
    fn result(self) -> Option<Self::Output> { if self { Some(()) } else { None } }
}

// Some(value) ends the wait with value
impl<T> WaitResult for Option<T> {
    type Output = T;
    fn result(self) -> Option<Self::Output> { self }
}

#[cfg(feature = "tokio")]
mod tokio_impl {
    use super::{Wait, WaitResult};
    use crate::{Signal, SignalValue, porcelain::Subscribe};

    impl<T: SignalValue> Wait<T> for Signal<T> {
        fn wait_value(&self, target_value: T) -> impl std::future::Future<Output = bool> + Send
        where T: PartialEq {
            let waiting = self.wait_for(move |value: &T| *value == target_value);
            async move { waiting.await.is_some() }
        }

        fn wait_for<F, R>(&self, predicate: F) -> impl std::future::Future<Output = Option<R::Output>> + Send
        where
            F: Fn(&T) -> R + Send + Sync + 'static,
            R: WaitResult,
        {
            let signal = self.clone();
            async move {
                // Bridge the synchronous listener to an async channel. Subscribe before looking at
                // the current value so a write in between cannot be missed.
                let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
                let _subscription = signal.subscribe(move |value: T| {
                    let _ = tx.send(value);
                });

                if let Some(output) = signal.with(|current| current.and_then(|value| predicate(value).result())) {
                    return Some(output);
                }
                // Disposal drops the listener and with it the sender, which ends the loop
                drop(signal);

                while let Some(value) = rx.recv().await {
                    if let Some(output) = predicate(&value).result() {
                        return Some(output);
                    }
                }
                None
            }
        }
    }
}
