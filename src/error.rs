//! Error types for Rivulet.

use thiserror::Error;

/// Result type alias using Rivulet's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by a user-supplied closure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for Rivulet operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A terminal operation ran on a pipeline whose source was already traversed.
    #[error("sequence already consumed")]
    AlreadyConsumed,

    /// A full traversal was requested over an unbounded source with no `limit`.
    #[error("{operation} requires a bounded sequence; add limit() before it")]
    Unbounded {
        /// The operation that needed a bounded upstream.
        operation: &'static str,
    },

    /// A user-supplied closure failed.
    ///
    /// The caller's error is kept as the source and can be recovered with
    /// [`Error::downcast_stage`].
    #[error("{stage} function failed: {source}")]
    Stage {
        /// Name of the stage or terminal operation that ran the closure.
        stage: &'static str,
        /// The error returned by the closure.
        #[source]
        source: BoxError,
    },

    /// A worker thread panicked while evaluating a sub-range.
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),

    /// I/O error from a file or reader source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a closure error raised inside `stage`.
    pub fn stage(stage: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Stage {
            stage,
            source: source.into(),
        }
    }

    /// Borrow the closure error as `E`, if this is a stage failure of that type.
    pub fn downcast_stage<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Stage { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Whether this error came from a user-supplied closure.
    pub fn is_stage(&self) -> bool {
        matches!(self, Self::Stage { .. })
    }
}
