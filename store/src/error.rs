use relay_signals::SignalError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),
    #[error("Signal bound to key {0:?} is disposed")]
    DisposedSignal(String),
}
