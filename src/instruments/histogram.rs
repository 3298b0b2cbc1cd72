//! Histogram with caller-defined bucket bounds.
//!
//! A [`Histogram`] counts observations into buckets. Each bound is the
//! inclusive upper threshold of one bucket; an implicit `+Inf` bucket catches
//! everything above the last bound. Buckets are exposed cumulatively, in
//! ascending bound order, including empty ones.
//!
//! ```text
//!   bounds [1, 2]      observe(0.5)  observe(1)  observe(1.2)  observe(99)
//!
//!   le="1"     ──►  2
//!   le="2"     ──►  3
//!   le="+Inf"  ──►  4
//! ```

use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;

use crate::clock::Clock;
use crate::desc::Desc;
use crate::error::{Error, ErrorHandler, Result, ValueError};
use crate::exemplar::Exemplar;
use crate::instruments::{store_exemplar, Instrument, MetricPoint, MetricSuffix, PointValue};
use crate::labels::Label;
use crate::writer::format_float;

/// Above this many bounds, buckets are located by binary search.
const LINEAR_SEARCH_MAX: usize = 50;

/// Name of the extra bucket label.
pub const BUCKET_LABEL: &str = "le";

#[derive(Debug, Default, Clone)]
struct Bucket {
    count: u64,
    exemplar: Option<Arc<Exemplar>>,
}

#[derive(Debug)]
struct HistogramState {
    sum: f64,
    count: u64,
    created: SystemTime,
    buckets: Vec<Bucket>,
}

/// Cumulative bucket counts, sum and count of observations.
///
/// # Examples
///
/// ```rust
/// use openmetrics::instruments::histogram::Histogram;
///
/// let histogram = Histogram::new(&[0.1, 1.0, 10.0]).unwrap();
/// histogram.observe(0.5);
/// histogram.observe(5.0);
///
/// assert_eq!(histogram.count(), 2);
/// assert_eq!(histogram.sum(), 5.5);
/// assert_eq!(histogram.num_buckets(), 4);
/// ```
#[derive(Debug)]
pub struct Histogram {
    bounds: Box<[f64]>,
    labels: Box<[Label]>,
    state: RwLock<HistogramState>,
    clock: Clock,
    on_error: ErrorHandler,
}

/// Checks that bounds are NaN-free and strictly ascending.
pub fn validate_bounds(bounds: &[f64]) -> Result<()> {
    if bounds.iter().any(|b| b.is_nan()) {
        return Err(Error::InvalidBounds("must not contain NaN"));
    }
    if bounds.windows(2).any(|w| w[1] <= w[0]) {
        return Err(Error::InvalidBounds("must be in strictly ascending order"));
    }
    Ok(())
}

impl Histogram {
    /// Creates a histogram with the given bucket bounds.
    ///
    /// A trailing `+Inf` bound is implicit and trimmed. Empty `bounds` create
    /// a histogram with a single `+Inf` bucket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] if a bound is NaN or bounds are not
    /// strictly ascending.
    pub fn new(bounds: &[f64]) -> Result<Self> {
        validate_bounds(bounds)?;

        let bounds = match bounds.split_last() {
            Some((last, rest)) if *last == f64::INFINITY => rest,
            _ => bounds,
        };

        let labels = bounds
            .iter()
            .map(|b| Label::new(BUCKET_LABEL, format_float(*b)))
            .chain(std::iter::once(Label::new(BUCKET_LABEL, "+Inf")))
            .collect();

        let clock = Clock::system();
        Ok(Self {
            bounds: bounds.into(),
            labels,
            state: RwLock::new(HistogramState {
                sum: 0.0,
                count: 0,
                created: clock.now(),
                buckets: vec![Bucket::default(); bounds.len() + 1],
            }),
            clock,
            on_error: ErrorHandler::default(),
        })
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

    /// Routes errors of [`observe`](Self::observe) and
    /// [`observe_with_exemplar`](Self::observe_with_exemplar) to `handler`.
    pub fn with_error_handler(self, handler: ErrorHandler) -> Self {
        Self {
            on_error: handler,
            ..self
        }
    }

    /// Records an observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for negative, NaN and +Inf values; the
    /// histogram is left unchanged.
    pub fn try_observe(&self, value: f64) -> Result<()> {
        check(value)?;
        let pos = self.search(value);

        let mut state = self.state.write();
        state.sum += value;
        state.count += 1;
        state.buckets[pos].count += 1;
        Ok(())
    }

    /// Like [`try_observe`](Self::try_observe), reporting errors to the error handler.
    #[inline]
    pub fn observe(&self, value: f64) {
        if let Err(err) = self.try_observe(value) {
            self.on_error.handle(&err);
        }
    }

    /// Records `exemplar.value` and attaches the exemplar to its bucket.
    ///
    /// # Errors
    ///
    /// An invalid value is rejected as in [`try_observe`](Self::try_observe).
    /// An invalid exemplar is dropped and its error returned, but the value is
    /// still observed.
    pub fn try_observe_with_exemplar(&self, exemplar: &Exemplar) -> Result<()> {
        check(exemplar.value)?;

        if let Err(err) = exemplar.validate() {
            self.try_observe(exemplar.value)?;
            return Err(err);
        }

        let pos = self.search(exemplar.value);

        let mut state = self.state.write();
        state.sum += exemplar.value;
        state.count += 1;
        let bucket = &mut state.buckets[pos];
        bucket.count += 1;
        store_exemplar(&mut bucket.exemplar, exemplar);
        Ok(())
    }

    /// Like [`try_observe_with_exemplar`](Self::try_observe_with_exemplar),
    /// reporting errors to the error handler.
    #[inline]
    pub fn observe_with_exemplar(&self, exemplar: &Exemplar) {
        if let Err(err) = self.try_observe_with_exemplar(exemplar) {
            self.on_error.handle(&err);
        }
    }

    /// Zeroes all counts, restamps the creation time and drops exemplars.
    pub fn reset(&self) {
        let created = self.clock.now();
        let mut state = self.state.write();
        state.sum = 0.0;
        state.count = 0;
        state.created = created;
        state.buckets.fill(Bucket::default());
    }

    /// Returns the creation time.
    pub fn created(&self) -> SystemTime {
        self.state.read().created
    }

    /// Returns the sum of all observations.
    pub fn sum(&self) -> f64 {
        self.state.read().sum
    }

    /// Returns the number of observations.
    pub fn count(&self) -> u64 {
        self.state.read().count
    }

    /// Returns the number of buckets, including `+Inf`.
    pub fn num_buckets(&self) -> usize {
        self.labels.len()
    }

    /// Returns the bucket bounds, without the implicit `+Inf`.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Returns the exemplar of the bucket at `index`.
    pub fn exemplar(&self, index: usize) -> Option<Arc<Exemplar>> {
        self.state.read().buckets.get(index)?.exemplar.clone()
    }

    /// Index of the bucket with the smallest bound `>= value`.
    fn search(&self, value: f64) -> usize {
        if self.bounds.len() > LINEAR_SEARCH_MAX {
            return self.bounds.partition_point(|b| *b < value);
        }
        self.bounds
            .iter()
            .position(|b| value <= *b)
            .unwrap_or(self.bounds.len())
    }
}

impl Instrument for Histogram {
    fn append_points(&self, dst: &mut Vec<MetricPoint>, _desc: &Desc) {
        let state = self.state.read();

        let mut cumulative = 0;
        for (bucket, label) in state.buckets.iter().zip(self.labels.iter()) {
            cumulative += bucket.count;
            dst.push(
                MetricPoint::new(MetricSuffix::Bucket, cumulative as f64)
                    .with_label(label.clone())
                    .with_exemplar(bucket.exemplar.clone()),
            );
        }

        dst.push(MetricPoint::new(MetricSuffix::Count, state.count as f64));
        dst.push(MetricPoint::new(MetricSuffix::Sum, state.sum));
        dst.push(MetricPoint::new(
            MetricSuffix::Created,
            PointValue::Epoch(state.created),
        ));
    }
}

#[inline]
fn check(value: f64) -> Result<()> {
    ValueError::check(value).map_err(|reason| Error::InvalidValue {
        instrument: "histogram",
        reason,
    })
}
