use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("Invalid listener: {0}")]
    InvalidListener(InvalidListener),
}

/// Why a listener was refused at registration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidListener {
    /// The listener is a signal that has been disposed and no longer accepts writes
    #[error("target signal is disposed")]
    Disposed,
    /// A signal cannot listen to itself
    #[error("a signal cannot listen to itself")]
    SelfReference,
}

impl From<InvalidListener> for SignalError {
    fn from(reason: InvalidListener) -> Self { SignalError::InvalidListener(reason) }
}
