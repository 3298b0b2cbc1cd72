//! Exemplars and their reuse pool.
//!
//! An [`Exemplar`] is a raw observation attached to a counter total or a
//! histogram bucket, typically carrying a trace id for correlation. Instruments
//! keep only the most recent exemplar; a new one overwrites the previous one.
//!
//! Exemplars can be recycled through an [`ExemplarPool`] to avoid allocating
//! label storage on every observation. Handing an exemplar back to the pool
//! moves it, so the previous owner cannot touch it afterwards.
//!
//! # Example
//!
//! ```rust
//! use openmetrics::exemplar::Exemplar;
//! use openmetrics::instruments::counter::Counter;
//!
//! let counter = Counter::new();
//!
//! let mut ex = Exemplar::recycle();
//! ex.value = 2.0;
//! ex.labels.push("trace_id", "KOO5S4vxi0o");
//! counter.add_with_exemplar(&ex);
//! ex.release();
//!
//! assert_eq!(counter.total(), 2.0);
//! assert_eq!(counter.exemplar().unwrap().value, 2.0);
//! ```

use std::time::SystemTime;

use parking_lot::{const_mutex, Mutex};

use crate::error::{Error, Result};
use crate::labels::LabelSet;

/// Maximum combined number of characters of exemplar label names and values.
pub const MAX_EXEMPLAR_RUNES: usize = 128;

static DEFAULT_POOL: ExemplarPool = ExemplarPool::new(1024);

/// A value, an optional timestamp and a set of labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exemplar {
    pub value: f64,
    pub timestamp: Option<SystemTime>,
    pub labels: LabelSet,
}

impl Exemplar {
    /// Creates an exemplar without timestamp.
    pub fn new(value: f64, labels: LabelSet) -> Self {
        Self {
            value,
            timestamp: None,
            labels,
        }
    }

    /// Sets the timestamp, returning `self` for chaining.
    pub fn with_timestamp(self, timestamp: SystemTime) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }

    /// Takes a reset exemplar from the process-wide pool, or allocates one.
    pub fn recycle() -> Self {
        DEFAULT_POOL.acquire()
    }

    /// Returns this exemplar to the process-wide pool.
    pub fn release(self) {
        DEFAULT_POOL.release(self)
    }

    /// Clears value, timestamp and labels, keeping the label allocation.
    pub fn reset(&mut self) {
        self.value = 0.0;
        self.timestamp = None;
        self.labels.clear();
    }

    /// Checks label names and the 128 character budget. Empty labels do not
    /// count towards the budget.
    ///
    /// ```rust
    /// use openmetrics::exemplar::Exemplar;
    /// use openmetrics::labels::LabelSet;
    ///
    /// let ok = Exemplar::new(1.0, LabelSet::new().with("trace_id", "x".repeat(120)));
    /// assert!(ok.validate().is_ok());
    ///
    /// let too_long = Exemplar::new(1.0, LabelSet::new().with("trace_id", "x".repeat(121)));
    /// assert!(too_long.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        self.labels
            .validate()
            .map_err(|err| Error::InvalidExemplar(Box::new(err)))?;

        let runes: usize = self
            .labels
            .non_empty()
            .map(|l| l.name.chars().count() + l.value.chars().count())
            .sum();
        if runes > MAX_EXEMPLAR_RUNES {
            return Err(Error::ExemplarTooLong(runes));
        }
        Ok(())
    }

    /// Overwrites `self` with `other`, dropping empty labels and reusing
    /// existing allocations.
    pub(crate) fn copy_from(&mut self, other: &Exemplar) {
        self.value = other.value;
        self.timestamp = other.timestamp;
        self.labels.copy_non_empty_from(&other.labels);
    }

    /// Returns a compact copy of `self` without empty labels.
    pub(crate) fn compact(&self) -> Exemplar {
        let mut ex = Exemplar::default();
        ex.copy_from(self);
        ex
    }
}

/// A bounded free list of exemplars.
///
/// Exemplars released beyond the pool's capacity are dropped.
#[derive(Debug)]
pub struct ExemplarPool {
    free: Mutex<Vec<Exemplar>>,
    capacity: usize,
}

impl ExemplarPool {
    /// Creates an empty pool retaining at most `capacity` exemplars.
    pub const fn new(capacity: usize) -> Self {
        Self {
            free: const_mutex(Vec::new()),
            capacity,
        }
    }

    /// Takes a reset exemplar from the pool, or allocates a new one.
    pub fn acquire(&self) -> Exemplar {
        self.free.lock().pop().unwrap_or_default()
    }

    /// Resets `ex` and makes it available to the next [`acquire`](Self::acquire).
    pub fn release(&self, mut ex: Exemplar) {
        ex.reset();
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(ex);
        }
    }

    /// Number of exemplars waiting to be reused.
    pub fn len(&self) -> usize {
        self.free.lock().len()
    }

    /// Returns `true` if no exemplar is waiting to be reused.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ExemplarPool {
    fn default() -> Self {
        Self::new(1024)
    }
}
