//! Error types used by the wardkit primitives.
//!
//! - [`TaskError`]: outcome of a single job or ticker run (returned by user code, classified by the pool).
//! - [`PoolError`]: failures submitting work to a [`WorkerPool`](crate::WorkerPool).
//! - [`LimitError`]: failures waiting on a [`RateLimit`](crate::RateLimit).
//! - [`CallError`]: failures of a cancellable singleflight call.
//! - [`ConfigError`]: rejected setup (pool sizing, limiter rules); reported synchronously.
//! - [`RuntimeError`]: failures of the [`Warden`](crate::Warden) itself.
//!
//! Every enum provides `as_label` (stable snake_case string for logs/metrics).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the warden runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some stewards remained running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of stewards that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use wardkit::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Outcome of a single unit of user work.
///
/// Jobs submitted to a [`WorkerPool`](crate::WorkerPool) and ticker jobs return
/// `Result<(), TaskError>`. The pool classifies the variants:
/// - `Fail` / `Canceled` are recorded and the executor keeps running;
/// - `Fatal` and `Panicked` retire the executor and a replacement is launched.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Work failed but the executor is still healthy.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error; the executor that ran it is replaced.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Work panicked; the panic was caught by the executor.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as a string.
        info: String,
    },

    /// Work observed cancellation and stopped early.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use wardkit::TaskError;
    ///
    /// let err = TaskError::Panicked { info: "boom".into() };
    /// assert_eq!(err.as_label(), "task_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Indicates whether the executor that produced this error must be replaced.
    ///
    /// # Example
    /// ```
    /// use wardkit::TaskError;
    ///
    /// assert!(TaskError::Fatal { error: "nope".into() }.retires_executor());
    /// assert!(!TaskError::Fail { error: "busy".into() }.retires_executor());
    /// ```
    pub fn retires_executor(&self) -> bool {
        matches!(self, TaskError::Fatal { .. } | TaskError::Panicked { .. })
    }

    /// Indicates whether the error type is safe to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. })
    }

    /// Renders a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        TaskError::Panicked { info }
    }
}

/// # Errors submitting work to a worker pool.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was stopped; the job queue is closed.
    #[error("worker pool is stopped")]
    Stopped,
    /// The job queue is full (only from `try_submit`).
    #[error("worker pool queue is full")]
    Full,
    /// The pool scope was cancelled while waiting for queue space.
    #[error("worker pool cancelled")]
    Canceled,
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::Stopped => "pool_stopped",
            PoolError::Full => "pool_full",
            PoolError::Canceled => "pool_canceled",
        }
    }
}

/// # Errors waiting on a rate limiter.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitError {
    /// The caller's token was cancelled before a permit was granted.
    #[error("rate limiter wait cancelled")]
    Canceled,
    /// The limiter has a zero rate and no stored tokens; it will never grant.
    #[error("rate limiter has zero rate and an empty bucket")]
    Starved,
}

impl LimitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LimitError::Canceled => "limit_canceled",
            LimitError::Starved => "limit_starved",
        }
    }
}

/// # Errors of a cancellable singleflight call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError<E> {
    /// The caller's token was cancelled before the shared result arrived.
    #[error("call cancelled")]
    Canceled,
    /// The shared call returned an error.
    #[error("call failed: {0}")]
    Failed(E),
}

impl<E> CallError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallError::Canceled => "call_canceled",
            CallError::Failed(_) => "call_failed",
        }
    }
}

/// # Rejected configuration.
///
/// Returned synchronously by setup calls; fatal to that call only.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A worker pool needs at least one executor.
    #[error("worker pool needs at least one worker")]
    ZeroWorkers,
    /// A worker pool needs a job queue of capacity at least one.
    #[error("worker pool queue capacity must be positive")]
    ZeroQueue,
    /// Rate limit is negative or not a number.
    #[error("invalid rate limit {limit}")]
    InvalidLimit {
        /// The rejected rate (events per second).
        limit: f64,
    },
    /// A finite, non-zero rate with a zero burst can never grant a permit.
    #[error("burst must be positive for a finite rate")]
    ZeroBurst,
    /// A multi-tier limiter needs at least one tier.
    #[error("multi limiter needs at least one limiter")]
    NoLimiters,
    /// A prefix rule with this key is already registered.
    #[error("rule {key:?} already registered")]
    DuplicateRule {
        /// The duplicated rule key.
        key: String,
    },
    /// A prefix rule has an empty key, zero quantum or zero fill interval.
    #[error("invalid rule {key:?}: {reason}")]
    InvalidRule {
        /// The rejected rule key.
        key: String,
        /// Why the rule was rejected.
        reason: &'static str,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroWorkers => "config_zero_workers",
            ConfigError::ZeroQueue => "config_zero_queue",
            ConfigError::InvalidLimit { .. } => "config_invalid_limit",
            ConfigError::ZeroBurst => "config_zero_burst",
            ConfigError::NoLimiters => "config_no_limiters",
            ConfigError::DuplicateRule { .. } => "config_duplicate_rule",
            ConfigError::InvalidRule { .. } => "config_invalid_rule",
        }
    }
}
