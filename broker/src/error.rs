//! Broker error types.

/// Errors that can occur during broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("not connected")]
    NotConnected,

    #[error("authentication error: {0}")]
    Auth(String),

    /// The venue answered with an `error` object.
    #[error("venue error {code}: {message}")]
    Api { code: String, message: String },

    /// A response arrived but does not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl BrokerError {
    /// Whether the error is worth a reconnect-and-retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, BrokerError::Connection(_) | BrokerError::Timeout(_))
    }
}
