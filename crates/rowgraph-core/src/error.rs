use thiserror::Error;

/// Canonical result for the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Single typed failure surface for a `run`.
///
/// Every error is fatal to the run that produced it: the output stream ends
/// with the error and open buffers are released on drop. Crates outside core
/// map their own failures into these kinds.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("source '{0}' has no binding")]
    UnboundSource(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("missing key field '{0}'")]
    MissingKey(String),

    #[error("unknown join strategy '{0}' (expected inner, left, right, full or cross)")]
    BadStrategy(String),

    #[error("{operator} callback failed on {context}: {message}")]
    Callback {
        operator: &'static str,
        /// Rendering of the input the callback was invoked with.
        context: String,
        message: String,
    },

    #[error("invalid pipeline spec: {0}")]
    InvalidSpec(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Wrap a user-callback failure with the operator name and its input.
    pub fn callback(operator: &'static str, context: impl Into<String>, source: Error) -> Self {
        match source {
            // Engine-originated errors keep their kind; only user failures
            // get the callback wrapper.
            e @ (Error::TypeMismatch(_) | Error::MissingKey(_) | Error::UnboundSource(_)) => e,
            other => Error::Callback {
                operator,
                context: context.into(),
                message: other.to_string(),
            },
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}
