//! Injectable wall-clock source.
//!
//! Counters, histograms and summaries stamp their `_created` point from a
//! [`Clock`]. Production code uses the system clock; tests inject a fixed
//! instant to get byte-identical exposition output.

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::SystemTime;

/// A shared source of wall-clock time.
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> SystemTime + Send + Sync>);

impl Clock {
    /// Reads the system clock.
    pub fn system() -> Self {
        Self(Arc::new(SystemTime::now))
    }

    /// Always returns `at`.
    ///
    /// ```rust
    /// use openmetrics::clock::Clock;
    /// use std::time::{Duration, SystemTime, UNIX_EPOCH};
    ///
    /// let at = UNIX_EPOCH + Duration::from_secs(1515151515);
    /// assert_eq!(Clock::fixed(at).now(), at);
    /// ```
    pub fn fixed(at: SystemTime) -> Self {
        Self(Arc::new(move || at))
    }

    /// Wraps an arbitrary time function.
    pub fn from_fn(f: impl Fn() -> SystemTime + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Returns the current time according to this clock.
    #[inline]
    pub fn now(&self) -> SystemTime {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Clock(..)")
    }
}
