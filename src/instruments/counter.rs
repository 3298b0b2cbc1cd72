//! Monotonic counter with creation timestamp and exemplar.
//!
//! A [`Counter`] accumulates a non-negative, monotonically non-decreasing
//! total. Attempts to add negative, NaN or infinite values are rejected
//! without touching the total.

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;

use crate::clock::Clock;
use crate::desc::Desc;
use crate::error::{Error, ErrorHandler, Result, ValueError};
use crate::exemplar::Exemplar;
use crate::instruments::{store_exemplar, Instrument, MetricPoint, MetricSuffix, PointValue};

#[derive(Debug)]
struct CounterState {
    total: f64,
    created: SystemTime,
    exemplar: Option<Arc<Exemplar>>,
}

/// A monotonically non-decreasing total.
///
/// Each counter holds a reader-writer lock: updates take the write lock,
/// reads and snapshots the read lock, so a snapshot never observes a total
/// without its matching exemplar.
///
/// # Examples
///
/// ```rust
/// use openmetrics::instruments::counter::Counter;
///
/// let counter = Counter::new();
/// counter.add(1.0);
/// counter.add(2.5);
/// assert_eq!(counter.total(), 3.5);
///
/// // rejected without mutation
/// assert!(counter.try_add(-1.0).is_err());
/// assert_eq!(counter.total(), 3.5);
/// ```
#[derive(Debug)]
pub struct Counter {
    state: RwLock<CounterState>,
    clock: Clock,
    on_error: ErrorHandler,
}

impl Counter {
    /// Creates a counter stamped with the current system time.
    pub fn new() -> Self {
        let clock = Clock::system();
        Self {
            state: RwLock::new(CounterState {
                total: 0.0,
                created: clock.now(),
                exemplar: None,
            }),
            clock,
            on_error: ErrorHandler::default(),
        }
    }

    /// Uses `clock` for the creation timestamp and for [`reset`](Self::reset).
    pub fn with_clock(self, clock: Clock) -> Self {
        self.state.write().created = clock.now();
        Self { clock, ..self }
    }

    /// Overrides the creation timestamp.
    pub fn with_created(self, created: SystemTime) -> Self {
        self.state.write().created = created;
        self
    }

    /// Routes errors of [`add`](Self::add) and
    /// [`add_with_exemplar`](Self::add_with_exemplar) to `handler`.
    pub fn with_error_handler(self, handler: ErrorHandler) -> Self {
        Self {
            on_error: handler,
            ..self
        }
    }

    /// Increments the total by `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for negative, NaN and +Inf values; the
    /// total is left unchanged.
    pub fn try_add(&self, value: f64) -> Result<()> {
        check(value)?;
        self.state.write().total += value;
        Ok(())
    }

    /// Like [`try_add`](Self::try_add), reporting errors to the error handler.
    #[inline]
    pub fn add(&self, value: f64) {
        if let Err(err) = self.try_add(value) {
            self.on_error.handle(&err);
        }
    }

    /// Increments the total by `exemplar.value` and records the exemplar.
    ///
    /// # Errors
    ///
    /// An invalid value is rejected as in [`try_add`](Self::try_add). An
    /// invalid exemplar is dropped and its error returned, but the value is
    /// still added to the total.
    pub fn try_add_with_exemplar(&self, exemplar: &Exemplar) -> Result<()> {
        check(exemplar.value)?;

        if let Err(err) = exemplar.validate() {
            self.state.write().total += exemplar.value;
            return Err(err);
        }

        let mut state = self.state.write();
        state.total += exemplar.value;
        store_exemplar(&mut state.exemplar, exemplar);
        Ok(())
    }

    /// Like [`try_add_with_exemplar`](Self::try_add_with_exemplar), reporting
    /// errors to the error handler.
    #[inline]
    pub fn add_with_exemplar(&self, exemplar: &Exemplar) {
        if let Err(err) = self.try_add_with_exemplar(exemplar) {
            self.on_error.handle(&err);
        }
    }

    /// Zeroes the total, restamps the creation time and drops the exemplar.
    pub fn reset(&self) {
        let created = self.clock.now();
        let mut state = self.state.write();
        state.total = 0.0;
        state.created = created;
        state.exemplar = None;
    }

    /// Returns the current total.
    pub fn total(&self) -> f64 {
        self.state.read().total
    }

    /// Returns the creation time.
    pub fn created(&self) -> SystemTime {
        self.state.read().created
    }

    /// Returns the most recent exemplar.
    pub fn exemplar(&self) -> Option<Arc<Exemplar>> {
        self.state.read().exemplar.clone()
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl Instrument for Counter {
    fn append_points(&self, dst: &mut Vec<MetricPoint>, _desc: &Desc) {
        let state = self.state.read();
        dst.push(
            MetricPoint::new(MetricSuffix::Total, state.total)
                .with_exemplar(state.exemplar.clone()),
        );
        dst.push(MetricPoint::new(
            MetricSuffix::Created,
            PointValue::Epoch(state.created),
        ));
    }
}

#[inline]
fn check(value: f64) -> Result<()> {
    ValueError::check(value).map_err(|reason| Error::InvalidValue {
        instrument: "counter",
        reason,
    })
}
