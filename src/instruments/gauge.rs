//! Lock-free floating point gauge.
//!
//! A [`Gauge`] stores the IEEE-754 bit pattern of its value in a single
//! cache-padded `AtomicU64`. `set` is a plain atomic store, `add` a
//! compare-and-swap retry loop.
//!
//! One NaN bit pattern is reserved as the "unset" sentinel. An unset gauge
//! reports nothing at all, which is different from reporting `0` or `NaN`:
//!
//! ```rust
//! use openmetrics::desc::Desc;
//! use openmetrics::instruments::gauge::Gauge;
//! use openmetrics::instruments::Instrument;
//!
//! let gauge = Gauge::new();
//! let mut points = Vec::new();
//!
//! gauge.append_points(&mut points, &Desc::new("temperature"));
//! assert!(points.is_empty());
//!
//! gauge.set(f64::NAN);
//! gauge.append_points(&mut points, &Desc::new("temperature"));
//! assert_eq!(points.len(), 1);
//! ```

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

use crate::desc::Desc;
use crate::instruments::{Instrument, MetricPoint, MetricSuffix};

/// Bit pattern of the "unset" sentinel: a quiet NaN with a payload no
/// arithmetic operation produces.
const UNSET: u64 = 0x7FF9_0000_0000_0001;

/// A value that can go up and down.
///
/// # Examples
///
/// ```rust
/// use openmetrics::instruments::gauge::Gauge;
///
/// let gauge = Gauge::new();
/// assert!(!gauge.is_set());
///
/// gauge.add(2.5); // unset reads as zero
/// gauge.add(-4.0);
/// assert_eq!(gauge.value(), -1.5);
///
/// gauge.set(17.1);
/// assert_eq!(gauge.value(), 17.1);
/// ```
pub struct Gauge {
    bits: CachePadded<AtomicU64>,
}

impl Gauge {
    /// Creates an unset gauge.
    pub const fn new() -> Self {
        Gauge {
            bits: CachePadded::new(AtomicU64::new(UNSET)),
        }
    }

    /// Stores `value`.
    #[inline]
    pub fn set(&self, value: f64) {
        self.bits.store(encode(value), Ordering::Relaxed);
    }

    /// Adds `value`, treating an unset gauge as zero.
    pub fn add(&self, value: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = encode(decode(current) + value);
            match self.bits.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Subtracts `value`.
    #[inline]
    pub fn sub(&self, value: f64) {
        self.add(-value)
    }

    /// Returns the current value; `0.0` while unset.
    #[inline]
    pub fn value(&self) -> f64 {
        decode(self.bits.load(Ordering::Relaxed))
    }

    /// Returns `true` once a value has been set or added.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.bits.load(Ordering::Relaxed) != UNSET
    }

    /// Returns the gauge to the unset state.
    pub fn reset(&self) {
        self.bits.store(UNSET, Ordering::Relaxed);
    }
}

/// Converts a value to bits, mapping a NaN that happens to carry the sentinel
/// payload to the canonical NaN.
#[inline]
fn encode(value: f64) -> u64 {
    match value.to_bits() {
        UNSET => f64::NAN.to_bits(),
        bits => bits,
    }
}

#[inline]
fn decode(bits: u64) -> f64 {
    match bits {
        UNSET => 0.0,
        bits => f64::from_bits(bits),
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "Gauge({})", self.value())
        } else {
            f.write_str("Gauge(unset)")
        }
    }
}

impl Instrument for Gauge {
    fn append_points(&self, dst: &mut Vec<MetricPoint>, _desc: &Desc) {
        let bits = self.bits.load(Ordering::Relaxed);
        if bits != UNSET {
            dst.push(MetricPoint::new(MetricSuffix::Empty, f64::from_bits(bits)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::PointValue;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_is_unset() {
        let gauge = Gauge::new();
        assert!(!gauge.is_set());
        assert_eq!(gauge.value(), 0.0);
    }

    #[test]
    fn test_set_round_trips() {
        let gauge = Gauge::new();
        for v in [0.0, -0.0, 1.5, -1e300, f64::MIN_POSITIVE, f64::MAX, f64::NEG_INFINITY] {
            gauge.set(v);
            assert_eq!(gauge.value().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn test_set_nan_is_distinct_from_unset() {
        let gauge = Gauge::new();
        gauge.set(f64::NAN);
        assert!(gauge.is_set());
        assert!(gauge.value().is_nan());

        gauge.set(f64::from_bits(UNSET));
        assert!(gauge.is_set());
        assert!(gauge.value().is_nan());
    }

    #[test]
    fn test_add_sub() {
        let gauge = Gauge::new();
        gauge.add(10.0);
        gauge.sub(2.5);
        assert_eq!(gauge.value(), 7.5);
    }

    #[test]
    fn test_reset() {
        let gauge = Gauge::new();
        gauge.set(3.0);
        gauge.reset();
        assert!(!gauge.is_set());

        let mut points = Vec::new();
        gauge.append_points(&mut points, &Desc::new("mock"));
        assert!(points.is_empty());
    }

    #[test]
    fn test_append_points() {
        let gauge = Gauge::new();
        gauge.set(-1.5);

        let mut points = Vec::new();
        gauge.append_points(&mut points, &Desc::new("mock"));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].suffix, MetricSuffix::Empty);
        assert_eq!(points[0].value, PointValue::Number(-1.5));
    }

    #[test]
    fn test_debug() {
        let gauge = Gauge::new();
        assert_eq!(format!("{:?}", gauge), "Gauge(unset)");
        gauge.set(2.0);
        assert_eq!(format!("{:?}", gauge), "Gauge(2)");
    }

    #[test]
    fn test_multiple_threads() {
        let gauge = Arc::new(Gauge::new());
        let mut handles = vec![];

        // Half threads add, half subtract
        for i in 0..4 {
            let gauge_clone = Arc::clone(&gauge);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    if i % 2 == 0 {
                        gauge_clone.add(2.0);
                    } else {
                        gauge_clone.sub(1.0);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(gauge.value(), 2000.0);
    }
}
