//! Error types and the error-handling policy.
//!
//! Every fallible operation in this crate reports through a single [`Error`]
//! enum, so registration, instrument updates and exposition can share one
//! `?`-friendly [`Result`] type.
//!
//! Recoverable failures raised on the hot path (bad label arity, invalid
//! observations, oversized exemplars, unknown states) can also be routed to
//! an [`ErrorHandler`] instead of being returned. The handler is the error
//! policy of a [`Registry`](crate::registry::Registry): the default policy
//! logs a warning, [`ErrorHandler::panic`] aborts the caller.
//!
//! # Example
//!
//! ```rust
//! use openmetrics::error::{Error, ErrorHandler, ValueError};
//! use openmetrics::instruments::counter::Counter;
//!
//! let counter = Counter::new().with_error_handler(ErrorHandler::new(|err| {
//!     eprintln!("metrics: {err}");
//! }));
//!
//! assert!(matches!(
//!     counter.try_add(-1.0),
//!     Err(Error::InvalidValue { reason: ValueError::Negative, .. })
//! ));
//! ```

use std::fmt::{self, Debug};
use std::sync::Arc;

use thiserror::Error;

/// Unified error type for registration, recording and exposition.
#[derive(Debug, Error)]
pub enum Error {
    /// The metric name does not match the metric name grammar.
    #[error("metric name {0:?} is invalid")]
    InvalidName(String),

    /// The metric name ends with a suffix reserved for exposition.
    #[error("metric name {name:?} contains an ambiguous suffix {suffix:?}")]
    AmbiguousSuffix { name: String, suffix: &'static str },

    /// The unit does not match the unit grammar.
    #[error("unit name {0:?} is invalid")]
    InvalidUnit(String),

    /// The metric name already ends with its unit.
    #[error("metric name {name:?} already ends with unit {unit:?}")]
    RedundantUnit { name: String, unit: String },

    /// The help text exceeds [`MAX_HELP_LEN`](crate::validation::MAX_HELP_LEN).
    #[error("help text of {len} bytes exceeds the limit of {max} bytes")]
    HelpTooLong { len: usize, max: usize },

    /// A label name does not match the label name grammar.
    #[error("label name {0:?} is invalid")]
    InvalidLabelName(String),

    /// A label name appears more than once.
    #[error("label names contain duplicate {0:?}")]
    DuplicateLabel(String),

    /// A label name is reserved by the metric type.
    #[error("label name {0:?} is reserved for this metric type")]
    ReservedLabel(String),

    /// Histogram bounds are NaN or not strictly ascending.
    #[error("histogram bounds {0}")]
    InvalidBounds(&'static str),

    /// A family with the same name and unit already exists.
    #[error("metric {0:?} is already registered")]
    AlreadyRegistered(String),

    /// The number of label values does not match the declared label names.
    #[error("metric {name:?} requires exactly {expected} label value(s), got {got}")]
    LabelArity {
        name: String,
        expected: usize,
        got: usize,
    },

    /// An observation was rejected. The instrument was not modified.
    #[error("{instrument} cannot accept {reason}")]
    InvalidValue {
        instrument: &'static str,
        reason: ValueError,
    },

    /// An exemplar carries invalid labels. The observation itself was recorded.
    #[error("invalid exemplar: {0}")]
    InvalidExemplar(#[source] Box<Error>),

    /// An exemplar exceeds the 128 character label budget. The observation itself was recorded.
    #[error("the combined length of the exemplar label names and values ({0} characters) exceeds 128 characters")]
    ExemplarTooLong(usize),

    /// The named state is not declared in the state set.
    #[error("invalid state {0:?}")]
    UnknownState(String),

    /// Writing the exposition to the sink failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reason an observation was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValueError {
    /// The value is negative.
    #[error("negative values")]
    Negative,
    /// The value is NaN.
    #[error("NaN values")]
    NaN,
    /// The value is positive infinity.
    #[error("infinity values")]
    Infinite,
}

impl ValueError {
    /// Checks a value for monotonic accumulators (counters, histograms, summaries).
    pub(crate) fn check(value: f64) -> std::result::Result<(), ValueError> {
        if value < 0.0 {
            Err(ValueError::Negative)
        } else if value.is_nan() {
            Err(ValueError::NaN)
        } else if value == f64::INFINITY {
            Err(ValueError::Infinite)
        } else {
            Ok(())
        }
    }
}

/// Result type for all fallible operations of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Callback invoked on recoverable failures that are not returned to the caller.
///
/// Handlers are cheap to clone and shared by every instrument created through
/// the same registry. The engine never decides whether an error is fatal: that
/// is the handler's call.
#[derive(Clone)]
pub struct ErrorHandler(Arc<dyn Fn(&Error) + Send + Sync>);

impl ErrorHandler {
    /// Wraps an arbitrary callback.
    pub fn new(f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Logs every error as a `tracing` warning. This is the default policy.
    pub fn warn() -> Self {
        Self::new(|err| {
            tracing::warn!(target: "openmetrics", error = %err, "metric update rejected");
        })
    }

    /// Panics on every error.
    pub fn panic() -> Self {
        Self::new(|err| panic!("openmetrics: {err}"))
    }

    /// Invokes the handler.
    #[inline]
    pub fn handle(&self, err: &Error) {
        (self.0)(err)
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::warn()
    }
}

impl Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorHandler(..)")
    }
}
