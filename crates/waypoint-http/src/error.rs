//! Error types for request execution.

/// Boxed error source stored inside codec failures.
type Source = Box<dyn std::error::Error + Send + Sync>;

/// The terminal failure of a request execution.
///
/// Exactly one variant describes any failed execution. `E` is the
/// caller's validation error type produced by the request's
/// [`Validator`](crate::Validator).
#[derive(Debug, thiserror::Error)]
pub enum RequestError<E> {
    /// The wire request could not be constructed (bad host/path URL or
    /// a body encoding failure before dispatch).
    #[error("request could not be constructed")]
    MalformedRequest,

    /// The response body could not be decoded.
    #[error("failed to decode response body")]
    Decoding(#[source] DecodingError),

    /// The underlying transport failed.
    #[error("transport failed")]
    Transport(#[source] TransportError),

    /// The transport reported a timeout for a single attempt.
    #[error("request timed out")]
    TimedOut,

    /// The full retry sequence did not finish within the SLA deadline.
    #[error("execution exceeded its SLA deadline")]
    SlaExceeded,

    /// The assembled response was rejected by the request's validator.
    #[error("response failed validation")]
    Validation(E),

    /// A failure that matches no other variant.
    #[error("unknown request error")]
    Unknown,
}

impl<E> RequestError<E> {
    /// The validation error, if this failure came from the validator.
    pub fn validation_error(&self) -> Option<&E> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Failure produced by an [`Encoder`](crate::Encoder).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct EncodingError {
    message: String,
    #[source]
    source: Option<Source>,
}

impl EncodingError {
    /// Create an encoding error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an encoding error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Failure produced by a [`Decoder`](crate::Decoder).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DecodingError {
    message: String,
    #[source]
    source: Option<Source>,
}

impl DecodingError {
    /// Create a decoding error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a decoding error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Failure reported by a [`Transport`](crate::Transport).
///
/// A transport must at minimum distinguish timeouts from other
/// failures; the orchestrator maps timeouts to
/// [`RequestError::TimedOut`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The wire timeout elapsed before a reply arrived.
    #[error("transport timed out")]
    Timeout,
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),
    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}
