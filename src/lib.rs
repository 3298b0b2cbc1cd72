//! # OpenMetrics - Concurrent Metric Families with Text Exposition
//!
//! A Rust library for recording application metrics under heavy concurrent
//! use and rendering them in the [OpenMetrics] text exposition format.
//!
//! ## Concepts
//!
//! - A [`Desc`](desc::Desc) describes a **family**: name, unit, help text and
//!   the names of the labels its members are keyed by.
//! - A [`MetricFamily`](family::MetricFamily) lazily creates exactly one
//!   **instrument** per combination of label values.
//! - A [`Registry`](registry::Registry) owns an ordered list of families and
//!   writes them all out as one document.
//!
//! ## Available Instruments
//!
//! | Type | Exposed as | Use Case |
//! |------|-----------|----------|
//! | [`Counter`](instruments::counter::Counter) | `counter` | Request totals, bytes sent |
//! | [`Gauge`](instruments::gauge::Gauge) | `gauge`, `unknown` | Temperatures, queue depths |
//! | [`Histogram`](instruments::histogram::Histogram) | `histogram` | Latency distributions |
//! | [`Summary`](instruments::summary::Summary) | `summary` | Sum and count without buckets |
//! | [`Info`](instruments::info::Info) | `info` | Build and version metadata |
//! | [`StateSet`](instruments::stateset::StateSet) | `stateset` | Enumerated boolean states |
//!
//! ## Quick Start
//!
//! ```rust
//! use openmetrics::desc::Desc;
//! use openmetrics::registry::Registry;
//!
//! let registry = Registry::new();
//!
//! let requests = registry.counter(
//!     Desc::new("http_requests")
//!         .with_help("Total HTTP requests.")
//!         .with_labels(["method", "status"]),
//! );
//! let latency = registry.histogram(
//!     Desc::new("http_request").with_unit("seconds").with_labels(["method"]),
//!     &[0.005, 0.05, 0.5, 5.0],
//! );
//!
//! requests.must(&["GET", "200"]).add(1.0);
//! latency.must(&["GET"]).observe(0.042);
//!
//! let mut body = Vec::new();
//! registry.write_to(&mut body)?;
//! assert!(body.ends_with(b"# EOF\n"));
//! # Ok::<(), openmetrics::error::Error>(())
//! ```
//!
//! ## Thread Safety
//!
//! Every instrument is `Send + Sync`. Gauges are a single lock-free atomic
//! word; the other instruments hold a reader-writer lock so that exposition
//! never observes a half-applied update. Families use double-checked locking
//! so that the steady-state lookup only takes a read lock. The registry
//! serializes scrapes behind one mutex.
//!
//! ## Errors
//!
//! Registration returns [`Result`](error::Result). Hot-path failures (wrong
//! label arity, negative counter increments, oversized exemplars, unknown
//! states) are either returned by the `try_*` methods or passed to an
//! [`ErrorHandler`](error::ErrorHandler), which by default logs a
//! `tracing` warning.
//!
//! [OpenMetrics]: https://github.com/OpenObservability/OpenMetrics/blob/main/specification/OpenMetrics.md

pub mod clock;
pub mod desc;
pub mod error;
pub mod exemplar;
pub mod family;
pub mod instruments;
pub mod labels;
pub mod registry;
mod snapshot;
pub mod validation;
pub mod writer;

pub use desc::Desc;
pub use error::{Error, ErrorHandler, Result};
pub use registry::Registry;
