//! Instruments and the wire points they produce.
//!
//! An instrument is the accumulator for one label combination inside a
//! metric family. Every instrument is independently thread-safe and shares a
//! single contract, [`Instrument::append_points`]: atomically copy the
//! current state into zero or more [`MetricPoint`]s.
//!
//! | Type | Points | Locking |
//! |------|--------|---------|
//! | [`Counter`](counter::Counter) | `_total`, `_created` | `RwLock` |
//! | [`Gauge`](gauge::Gauge) | value (none while unset) | lock-free |
//! | [`Histogram`](histogram::Histogram) | `_bucket` × N+1, `_count`, `_sum`, `_created` | `RwLock` |
//! | [`Summary`](summary::Summary) | `_count`, `_sum`, `_created` | `RwLock` |
//! | [`Info`](info::Info) | `_info` | none |
//! | [`StateSet`](stateset::StateSet) | one per state | `RwLock` |
//!
//! Instruments are normally obtained from a
//! [`MetricFamily`](crate::family::MetricFamily), but can be used standalone:
//!
//! ```rust
//! use openmetrics::desc::Desc;
//! use openmetrics::instruments::counter::Counter;
//! use openmetrics::instruments::{Instrument, MetricSuffix};
//!
//! let counter = Counter::new();
//! counter.add(3.0);
//!
//! let mut points = Vec::new();
//! counter.append_points(&mut points, &Desc::new("requests"));
//! assert_eq!(points.len(), 2);
//! assert_eq!(points[0].suffix, MetricSuffix::Total);
//! ```

pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod info;
pub mod stateset;
pub mod summary;

use std::fmt::{self, Debug, Display};
use std::sync::Arc;
use std::time::SystemTime;

use crate::desc::Desc;
use crate::exemplar::Exemplar;
use crate::labels::Label;

/// The type of a metric family, as exposed in the `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MetricType {
    Unknown,
    Gauge,
    Counter,
    StateSet,
    Info,
    Histogram,
    Summary,
}

impl MetricType {
    /// Returns the exposition name of the type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Unknown => "unknown",
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
            MetricType::StateSet => "stateset",
            MetricType::Info => "info",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
        }
    }
}

impl Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suffix appended to the full metric name of a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MetricSuffix {
    /// No suffix: gauge, stateset, unknown.
    #[default]
    Empty,
    /// `_total`: counter.
    Total,
    /// `_created`: counter, histogram, summary.
    Created,
    /// `_count`: histogram, summary.
    Count,
    /// `_sum`: histogram, summary.
    Sum,
    /// `_bucket`: histogram.
    Bucket,
    /// `_info`: info.
    Info,
}

impl MetricSuffix {
    /// Returns the suffix text.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricSuffix::Empty => "",
            MetricSuffix::Total => "_total",
            MetricSuffix::Created => "_created",
            MetricSuffix::Count => "_count",
            MetricSuffix::Sum => "_sum",
            MetricSuffix::Bucket => "_bucket",
            MetricSuffix::Info => "_info",
        }
    }
}

/// The value carried by a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointValue {
    /// A sample value.
    Number(f64),
    /// A point in time, rendered as epoch seconds.
    Epoch(SystemTime),
}

impl From<f64> for PointValue {
    fn from(v: f64) -> Self {
        PointValue::Number(v)
    }
}

/// One line of exposition output, before the family name and label values
/// are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub suffix: MetricSuffix,
    pub value: PointValue,
    /// Extra label written after the family labels (`le`, state name).
    pub label: Option<Label>,
    /// Sample timestamp.
    pub timestamp: Option<SystemTime>,
    pub exemplar: Option<Arc<Exemplar>>,
}

impl MetricPoint {
    /// Creates a point without extra label, timestamp or exemplar.
    pub fn new(suffix: MetricSuffix, value: impl Into<PointValue>) -> Self {
        Self {
            suffix,
            value: value.into(),
            label: None,
            timestamp: None,
            exemplar: None,
        }
    }

    /// Attaches an extra label.
    pub fn with_label(self, label: Label) -> Self {
        Self {
            label: Some(label),
            ..self
        }
    }

    /// Attaches an exemplar.
    pub fn with_exemplar(self, exemplar: Option<Arc<Exemplar>>) -> Self {
        Self { exemplar, ..self }
    }

    /// Attaches a sample timestamp.
    pub fn with_timestamp(self, timestamp: SystemTime) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }
}

/// The contract shared by every instrument.
pub trait Instrument: Debug + Send + Sync + 'static {
    /// Appends a consistent snapshot of the current state to `dst`.
    ///
    /// Appending nothing means there is nothing to report for this label
    /// combination, which is different from reporting zero.
    fn append_points(&self, dst: &mut Vec<MetricPoint>, desc: &Desc);
}

/// Stores `exemplar` into `slot`, reusing the previous allocation when no
/// snapshot still holds it.
pub(crate) fn store_exemplar(slot: &mut Option<Arc<Exemplar>>, exemplar: &Exemplar) {
    match slot.as_mut().and_then(Arc::get_mut) {
        Some(current) => current.copy_from(exemplar),
        None => *slot = Some(Arc::new(exemplar.compact())),
    }
}
