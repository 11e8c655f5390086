//! Error types for pipelines and their stages.

use std::sync::Arc;
use thiserror::Error;

/// The main error type for pipelines and stage callbacks.
///
/// `Error` is cheap to clone so it can travel through [`Oneshot`](crate::Oneshot)
/// slots and be observed by several waiters.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The owning pipeline is shutting down
    #[error("pipeline was cancelled")]
    Cancelled,

    /// Every input was closed before a value arrived
    #[error("channel closed")]
    ChannelClosed,

    /// A stage callback failed
    #[error("stage failed: {0}")]
    Stage(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// A tracked task panicked
    #[error("task panicked: {0}")]
    Panicked(String),

    /// An operation timed out
    #[error("operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

// Convenience constructors
impl Error {
    /// Wrap any error returned by a stage callback
    pub fn stage<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Stage(Arc::new(error))
    }

    /// Create a timeout error
    pub fn timeout(duration_ms: u64) -> Self {
        Error::Timeout { duration_ms }
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }

    /// Whether this error reports pipeline cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns a short stable label (snake_case) for logs and metrics.
    ///
    /// ```
    /// use stageweld::Error;
    ///
    /// assert_eq!(Error::ChannelClosed.as_label(), "channel_closed");
    /// assert_eq!(Error::custom("boom").as_label(), "custom");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::Cancelled => "cancelled",
            Error::ChannelClosed => "channel_closed",
            Error::Stage(_) => "stage_failed",
            Error::Panicked(_) => "task_panicked",
            Error::Timeout { .. } => "timeout",
            Error::Custom(_) => "custom",
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Error::Cancelled
        } else {
            Error::Panicked(err.to_string())
        }
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        Error::Custom(format!("Timeout: {}", e))
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Error {
    fn from(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Error::Stage(Arc::from(e))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait for turning foreign errors into stage errors
pub trait IntoStageError<T> {
    fn into_stage_error(self) -> Result<T>;
}

impl<T, E> IntoStageError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_stage_error(self) -> Result<T> {
        self.map_err(Error::stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn stage_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = Error::stage(io);

        assert_eq!(err.to_string(), "stage failed: disk on fire");
        assert!(err.source().is_some());
        assert_eq!(err.as_label(), "stage_failed");
    }

    #[test]
    fn foreign_results_convert() {
        let res: std::result::Result<(), std::fmt::Error> = Err(std::fmt::Error);
        let err = res.into_stage_error().unwrap_err();
        assert!(matches!(err, Error::Stage(_)));
    }

    #[test]
    fn clones_compare_by_display() {
        let err = Error::custom("boom");
        assert_eq!(err.clone().to_string(), "boom");
        assert!(!err.is_cancelled());
        assert!(Error::Cancelled.is_cancelled());
    }
}
