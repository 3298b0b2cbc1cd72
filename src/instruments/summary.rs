//! Summary without quantiles: sum and count of observations.

use std::time::SystemTime;

use parking_lot::RwLock;

use crate::clock::Clock;
use crate::desc::Desc;
use crate::error::{Error, ErrorHandler, Result, ValueError};
use crate::instruments::{Instrument, MetricPoint, MetricSuffix, PointValue};

#[derive(Debug)]
struct SummaryState {
    sum: f64,
    count: u64,
    created: SystemTime,
}

/// Tracks the sum and number of observations.
///
/// # Examples
///
/// ```rust
/// use openmetrics::instruments::summary::Summary;
///
/// let summary = Summary::new();
/// summary.observe(0.25);
/// summary.observe(0.75);
/// assert_eq!(summary.count(), 2);
/// assert_eq!(summary.sum(), 1.0);
/// ```
#[derive(Debug)]
pub struct Summary {
    state: RwLock<SummaryState>,
    clock: Clock,
    on_error: ErrorHandler,
}

impl Summary {
    /// Creates a summary stamped with the current system time.
    pub fn new() -> Self {
        let clock = Clock::system();
        Self {
            state: RwLock::new(SummaryState {
                sum: 0.0,
                count: 0,
                created: clock.now(),
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

    /// Routes errors of [`observe`](Self::observe) to `handler`.
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
    /// summary is left unchanged.
    pub fn try_observe(&self, value: f64) -> Result<()> {
        ValueError::check(value).map_err(|reason| Error::InvalidValue {
            instrument: "summary",
            reason,
        })?;

        let mut state = self.state.write();
        state.count += 1;
        state.sum += value;
        Ok(())
    }

    /// Like [`try_observe`](Self::try_observe), reporting errors to the error handler.
    #[inline]
    pub fn observe(&self, value: f64) {
        if let Err(err) = self.try_observe(value) {
            self.on_error.handle(&err);
        }
    }

    /// Zeroes sum and count and restamps the creation time.
    pub fn reset(&self) {
        let created = self.clock.now();
        let mut state = self.state.write();
        state.sum = 0.0;
        state.count = 0;
        state.created = created;
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
}

impl Default for Summary {
    fn default() -> Self {
        Self::new()
    }
}

impl Instrument for Summary {
    fn append_points(&self, dst: &mut Vec<MetricPoint>, _desc: &Desc) {
        let state = self.state.read();
        dst.push(MetricPoint::new(MetricSuffix::Count, state.count as f64));
        dst.push(MetricPoint::new(MetricSuffix::Sum, state.sum));
        dst.push(MetricPoint::new(
            MetricSuffix::Created,
            PointValue::Epoch(state.created),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_observe() {
        let summary = Summary::new();
        summary.observe(1.0);
        summary.observe(2.0);
        assert_eq!(summary.count(), 2);
        assert_eq!(summary.sum(), 3.0);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let summary = Summary::new();
        for (value, expected) in [
            (-2.0, ValueError::Negative),
            (f64::NAN, ValueError::NaN),
            (f64::INFINITY, ValueError::Infinite),
        ] {
            assert!(matches!(
                summary.try_observe(value),
                Err(Error::InvalidValue { instrument: "summary", reason }) if reason == expected
            ));
        }
        assert_eq!(summary.count(), 0);
    }

    #[test]
    fn test_reset() {
        let at = SystemTime::UNIX_EPOCH + Duration::from_secs(3);
        let summary = Summary::new().with_clock(Clock::fixed(at));
        summary.observe(5.0);
        summary.reset();
        assert_eq!(summary.count(), 0);
        assert_eq!(summary.sum(), 0.0);
        assert_eq!(summary.created(), at);
    }

    #[test]
    fn test_append_points() {
        let created = SystemTime::UNIX_EPOCH + Duration::from_millis(1500);
        let summary = Summary::new().with_created(created);
        summary.observe(0.5);

        let mut points = Vec::new();
        summary.append_points(&mut points, &Desc::new("mock"));
        assert_eq!(
            points,
            vec![
                MetricPoint::new(MetricSuffix::Count, 1.0),
                MetricPoint::new(MetricSuffix::Sum, 0.5),
                MetricPoint::new(MetricSuffix::Created, PointValue::Epoch(created)),
            ]
        );
    }

    #[test]
    fn test_multiple_threads() {
        let summary = Arc::new(Summary::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let summary = Arc::clone(&summary);
                thread::spawn(move || {
                    for _ in 0..500 {
                        summary.observe(0.5);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(summary.count(), 2000);
        assert_eq!(summary.sum(), 1000.0);
    }
}
