//! Error types for the Concord counter service

use thiserror::Error;

/// Counter service errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Launch errors
    /// The concurrency substrate could not start the requested tasks
    ///
    /// **Triggered by:** Dispatching outside a tokio runtime, exceeding
    /// `DispatchConfig::max_tasks`, or a thread pool that fails to build
    /// **Recovery:** Fatal to the enclosing dispatch; no partial batch exists
    #[error("Launch failure: {reason}")]
    LaunchFailure {
        /// Why the tasks could not be launched
        reason: String,
    },

    /// A launched task panicked or was aborted before reporting its result
    #[error("Task {id} failed: {reason}")]
    TaskFailed {
        /// Task identifier within its batch
        id: u64,
        /// Failure description
        reason: String,
    },

    /// A streamed dispatch lost its supervisor before the final outcome arrived
    ///
    /// **Triggered by:** The runtime shutting down while a `DispatchStream` is
    /// still being consumed
    #[error("Dispatch interrupted: {reason}")]
    DispatchInterrupted {
        /// Failure description
        reason: String,
    },

    // Counter errors
    /// The task owning an actor counter is no longer running
    ///
    /// **Triggered by:** Using an `ActorCounter` handle after its runtime shut down
    /// **Recovery:** Spawn a fresh counter and dispatch again
    #[error("Counter closed: owner task is no longer running")]
    CounterClosed,

    // Configuration errors
    /// An environment override could not be parsed
    #[error("Invalid configuration: {key}={value}")]
    InvalidConfig {
        /// Environment variable name
        key: String,
        /// Offending value
        value: String,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Fatal error that cannot be recovered from
    Fatal,
    /// Recoverable error that may be retried
    Recoverable,
    /// Warning that doesn't prevent execution
    Warning,
}

impl Error {
    /// Create a launch failure with a reason
    pub fn launch(reason: impl Into<String>) -> Self {
        Error::LaunchFailure {
            reason: reason.into(),
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::LaunchFailure { .. } => ErrorSeverity::Fatal,
            Error::TaskFailed { .. } => ErrorSeverity::Fatal,
            Error::DispatchInterrupted { .. } => ErrorSeverity::Fatal,

            Error::CounterClosed => ErrorSeverity::Recoverable,

            Error::InvalidConfig { .. } => ErrorSeverity::Warning,
        }
    }

    /// True when the error means nothing was launched at all
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, Error::LaunchFailure { .. })
    }
}

/// Result type for Concord operations
pub type Result<T> = std::result::Result<T, Error>;
