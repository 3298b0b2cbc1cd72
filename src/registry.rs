//! The registry: an ordered set of metric families and their exposition.
//!
//! Families are registered through typed constructors and exposed in
//! registration order. `(name, unit)` identifies a family; registering the
//! same pair twice, or another pair that yields the same exposed name, fails
//! and the first registrant stays in place.
//!
//! [`Registry::write_to`] renders every family into a reusable scratch
//! buffer while holding the registry lock, then hands the finished document
//! to the sink in one write, so concurrent scrapes never interleave.
//!
//! # Examples
//!
//! ```rust
//! use openmetrics::clock::Clock;
//! use openmetrics::desc::Desc;
//! use openmetrics::registry::Registry;
//! use std::time::{Duration, UNIX_EPOCH};
//!
//! let registry = Registry::consistent(Clock::fixed(UNIX_EPOCH + Duration::from_secs(1515151515)));
//! let jobs = registry.counter(Desc::new("jobs").with_help("Processed jobs."));
//! jobs.must(&[] as &[&str]).add(3.0);
//!
//! let expected = concat!(
//!     "# TYPE jobs counter\n",
//!     "# HELP jobs Processed jobs.\n",
//!     "jobs_total 3\n",
//!     "jobs_created 1515151515\n",
//!     "# EOF\n",
//! );
//! assert_eq!(registry.render()?, expected);
//! # Ok::<(), openmetrics::error::Error>(())
//! ```

use std::fmt::{self, Debug};
use std::io::{self, Write};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::clock::Clock;
use crate::desc::Desc;
use crate::error::{Error, ErrorHandler, Result};
use crate::family::{
    Collector, CounterFamily, GaugeFamily, HistogramFamily, InfoFamily, MetricFamily,
    StateSetFamily, SummaryFamily,
};
use crate::instruments::counter::Counter;
use crate::instruments::gauge::Gauge;
use crate::instruments::histogram::{self, Histogram, BUCKET_LABEL};
use crate::instruments::info::Info;
use crate::instruments::stateset::StateSet;
use crate::instruments::summary::Summary;
use crate::instruments::{Instrument, MetricType};
use crate::snapshot::Snapshot;
use crate::validation::is_valid_label_name;
use crate::writer::ExpositionWriter;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

struct State {
    families: Vec<Arc<dyn Collector>>,
    snapshot: Snapshot,
    buf: Vec<u8>,
}

/// An ordered collection of metric families.
pub struct Registry {
    state: Mutex<State>,
    clock: Clock,
    on_error: ErrorHandler,
    consistent: bool,
}

impl Registry {
    /// Creates an empty registry using the system clock and the default
    /// error handler.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                families: Vec::new(),
                snapshot: Snapshot::new(),
                buf: Vec::new(),
            }),
            clock: Clock::system(),
            on_error: ErrorHandler::default(),
            consistent: false,
        }
    }

    /// Creates a registry with byte-identical output for identical inputs:
    /// instruments are stamped from `clock` and exposed in label identity
    /// order. Mostly useful in tests.
    pub fn consistent(clock: Clock) -> Self {
        Self::new().with_clock(clock).with_consistent_order(true)
    }

    /// Returns the process-wide default registry, creating it on first use.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    /// Sets the clock instruments created afterwards stamp `_created` from.
    pub fn with_clock(self, clock: Clock) -> Self {
        Self { clock, ..self }
    }

    /// Sets the handler for errors not returned to the caller, for all
    /// families and instruments created afterwards.
    pub fn with_error_handler(self, handler: ErrorHandler) -> Self {
        Self {
            on_error: handler,
            ..self
        }
    }

    /// Exposes the instruments of each family in label identity order
    /// rather than creation order.
    pub fn with_consistent_order(self, consistent: bool) -> Self {
        Self { consistent, ..self }
    }

    /// Registers a counter family.
    ///
    /// # Errors
    ///
    /// Fails if `desc` is invalid or a family with the same name and unit is
    /// already registered.
    pub fn add_counter(&self, desc: Desc) -> Result<CounterFamily> {
        let (clock, on_error) = (self.clock.clone(), self.on_error.clone());
        self.register(desc, MetricType::Counter, move || {
            Ok(Counter::new()
                .with_clock(clock.clone())
                .with_error_handler(on_error.clone()))
        })
    }

    /// Like [`add_counter`](Self::add_counter), but panics on error.
    pub fn counter(&self, desc: Desc) -> CounterFamily {
        must(self.add_counter(desc))
    }

    /// Registers a gauge family.
    pub fn add_gauge(&self, desc: Desc) -> Result<GaugeFamily> {
        self.register(desc, MetricType::Gauge, || Ok(Gauge::new()))
    }

    /// Like [`add_gauge`](Self::add_gauge), but panics on error.
    pub fn gauge(&self, desc: Desc) -> GaugeFamily {
        must(self.add_gauge(desc))
    }

    /// Registers a histogram family with the given bucket bounds.
    ///
    /// # Errors
    ///
    /// Fails on an invalid `desc`, on invalid bounds, if `desc` declares an
    /// `le` label, or on a duplicate registration.
    pub fn add_histogram(&self, desc: Desc, bounds: &[f64]) -> Result<HistogramFamily> {
        desc.reserve_label(BUCKET_LABEL)?;
        histogram::validate_bounds(bounds)?;

        let bounds: Arc<[f64]> = bounds.into();
        let (clock, on_error) = (self.clock.clone(), self.on_error.clone());
        self.register(desc, MetricType::Histogram, move || {
            Ok(Histogram::new(&bounds)?
                .with_clock(clock.clone())
                .with_error_handler(on_error.clone()))
        })
    }

    /// Like [`add_histogram`](Self::add_histogram), but panics on error.
    pub fn histogram(&self, desc: Desc, bounds: &[f64]) -> HistogramFamily {
        must(self.add_histogram(desc, bounds))
    }

    /// Registers a summary family.
    pub fn add_summary(&self, desc: Desc) -> Result<SummaryFamily> {
        let (clock, on_error) = (self.clock.clone(), self.on_error.clone());
        self.register(desc, MetricType::Summary, move || {
            Ok(Summary::new()
                .with_clock(clock.clone())
                .with_error_handler(on_error.clone()))
        })
    }

    /// Like [`add_summary`](Self::add_summary), but panics on error.
    pub fn summary(&self, desc: Desc) -> SummaryFamily {
        must(self.add_summary(desc))
    }

    /// Registers an info family.
    pub fn add_info(&self, desc: Desc) -> Result<InfoFamily> {
        self.register(desc, MetricType::Info, || Ok(Info::new()))
    }

    /// Like [`add_info`](Self::add_info), but panics on error.
    pub fn info(&self, desc: Desc) -> InfoFamily {
        must(self.add_info(desc))
    }

    /// Registers a state set family with the given state names.
    ///
    /// # Errors
    ///
    /// Fails on an invalid `desc`, if the family name is not a valid label
    /// name, if `desc` declares a label named like the family itself, or on a
    /// duplicate registration.
    pub fn add_state_set<S: AsRef<str>>(&self, desc: Desc, states: &[S]) -> Result<StateSetFamily> {
        desc.validate()?;
        if !is_valid_label_name(&desc.name) {
            return Err(Error::InvalidLabelName(desc.name));
        }
        desc.reserve_label(&desc.name)?;

        let states: Arc<[String]> = states.iter().map(|s| s.as_ref().to_owned()).collect();
        let on_error = self.on_error.clone();
        self.register(desc, MetricType::StateSet, move || {
            Ok(StateSet::new(states.iter().map(String::as_str)).with_error_handler(on_error.clone()))
        })
    }

    /// Like [`add_state_set`](Self::add_state_set), but panics on error.
    pub fn state_set<S: AsRef<str>>(&self, desc: Desc, states: &[S]) -> StateSetFamily {
        must(self.add_state_set(desc, states))
    }

    /// Registers a family of type `unknown`, backed by gauges.
    pub fn add_unknown(&self, desc: Desc) -> Result<GaugeFamily> {
        self.register(desc, MetricType::Unknown, || Ok(Gauge::new()))
    }

    /// Like [`add_unknown`](Self::add_unknown), but panics on error.
    pub fn unknown(&self, desc: Desc) -> GaugeFamily {
        must(self.add_unknown(desc))
    }

    fn register<I, F>(&self, desc: Desc, metric_type: MetricType, factory: F) -> Result<MetricFamily<I>>
    where
        I: Instrument,
        F: Fn() -> Result<I> + Send + Sync + 'static,
    {
        desc.validate()?;
        let family = MetricFamily::new(desc, metric_type, self.on_error.clone(), factory)?;

        let full_name = family.desc().full_name();
        let mut state = self.state.lock();
        if let Some(existing) = state
            .families
            .iter()
            .find(|f| f.id() == family.id() || f.desc().full_name() == full_name)
        {
            return Err(Error::AlreadyRegistered(existing.desc().full_name()));
        }
        state.families.push(family.collector());

        tracing::debug!(
            target: "openmetrics",
            name = %full_name,
            metric_type = %metric_type,
            "registered metric family"
        );
        Ok(family)
    }

    /// Writes all families followed by `# EOF` to `sink` and flushes it.
    /// Returns the number of bytes written.
    ///
    /// Families without any points are left out entirely. Calls are
    /// serialized; the document is written to `sink` in a single
    /// `write_all`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if writing to or flushing `sink` fails.
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<usize> {
        let mut state = self.state.lock();
        let State {
            families,
            snapshot,
            buf,
        } = &mut *state;

        buf.clear();
        let mut w = ExpositionWriter::new(&mut *buf);
        for family in families.iter() {
            family.collect(snapshot, self.consistent);
            snapshot.write_to(&mut w)?;
        }
        snapshot.clear();
        w.write_eof()?;

        sink.write_all(buf.as_slice())?;
        sink.flush()?;
        Ok(buf.len())
    }

    /// Renders all families into a string.
    pub fn render(&self) -> Result<String> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        String::from_utf8(out).map_err(|err| Error::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }

    /// Returns the number of registered families.
    pub fn len(&self) -> usize {
        self.state.lock().families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("families", &self.len())
            .field("consistent", &self.consistent)
            .finish_non_exhaustive()
    }
}

fn must<T>(result: Result<T>) -> T {
    match result {
        Ok(v) => v,
        Err(err) => panic!("{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exemplar::Exemplar;
    use crate::labels::{LabelIdentity, LabelSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    const NONE: &[&str] = &[];

    fn mock_time() -> SystemTime {
        UNIX_EPOCH + Duration::new(1515151515, 757575757)
    }

    fn mock_registry() -> Registry {
        Registry::consistent(Clock::fixed(mock_time()))
    }

    /// Orders label value tuples the way a consistent registry exposes them.
    fn by_identity<'a>(mut values: Vec<&'a [&'a str]>) -> Vec<&'a [&'a str]> {
        values.sort_by_key(|v| LabelIdentity::of(*v).0);
        values
    }

    #[test]
    fn test_write_single_counter() {
        let registry = mock_registry();
        registry.counter(Desc::new("foo")).must(NONE).add(1.0);

        assert_eq!(
            registry.render().unwrap(),
            "# TYPE foo counter\nfoo_total 1\nfoo_created 1515151515.757576\n# EOF\n"
        );
    }

    #[test]
    fn test_write_empty_registry() {
        let registry = Registry::new();
        let mut out = Vec::new();
        assert_eq!(registry.write_to(&mut out).unwrap(), 6);
        assert_eq!(out, b"# EOF\n");
    }

    #[test]
    fn test_registration() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&errors);
        let registry = mock_registry().with_error_handler(ErrorHandler::new(move |err| {
            seen.lock().push(err.to_string());
        }));

        let foo = registry.counter(Desc::new("foo").with_help("Helpful.").with_labels(["status"]));
        registry.counter(Desc::new("foo").with_unit("any"));
        assert_eq!(registry.len(), 2);

        let err = registry
            .add_counter(Desc::new("foo").with_labels(["other"]))
            .unwrap_err();
        assert_eq!(err.to_string(), r#"metric "foo" is already registered"#);

        let err = registry.add_gauge(Desc::new("foo").with_unit("any")).unwrap_err();
        assert_eq!(err.to_string(), r#"metric "foo_any" is already registered"#);

        let err = registry.add_counter(Desc::default()).unwrap_err();
        assert_eq!(err.to_string(), r#"metric name "" is invalid"#);
        assert_eq!(registry.len(), 2);

        let counter = foo.with_or_report(&["201"]);
        counter.add(1.0);
        assert_eq!(counter.total(), 1.0);

        foo.with_or_report(&["too", "many"]).add(1.0);
        assert_eq!(
            *errors.lock(),
            [r#"metric "foo" requires exactly 1 label value(s), got 2"#]
        );
    }

    #[test]
    fn test_rejects_colliding_full_names() {
        let registry = mock_registry();
        registry.gauge(Desc::new("foo").with_unit("bytes")).must(NONE).set(1.0);

        let err = registry.add_gauge(Desc::new("foo_bytes")).unwrap_err();
        assert!(matches!(&err, Error::AlreadyRegistered(name) if name == "foo_bytes"));

        let err = registry.add_counter(Desc::new("foo_bytes")).unwrap_err();
        assert_eq!(err.to_string(), r#"metric "foo_bytes" is already registered"#);

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.render().unwrap(),
            "# TYPE foo_bytes gauge\n# UNIT foo_bytes bytes\nfoo_bytes 1\n# EOF\n"
        );
    }

    #[test]
    fn test_first_registrant_wins() {
        let registry = mock_registry();
        registry.gauge(Desc::new("foo")).must(NONE).set(1.0);
        assert!(registry.add_counter(Desc::new("foo")).is_err());

        assert_eq!(
            registry.render().unwrap(),
            "# TYPE foo gauge\nfoo 1\n# EOF\n"
        );
    }

    #[test]
    fn test_write_counters() {
        let registry = mock_registry();
        let foo = registry.counter(Desc::new("foo").with_help("Some text and \n some \" escaping"));
        foo.must(NONE).add(17.1);
        let bar = registry.counter(Desc::new("bar").with_unit("hits").with_labels(["path"]));
        bar.must(&["/"]).add(2.0);
        bar.must(&["/about"]).add(1.0);

        let mut expected = String::from(
            "# TYPE foo counter\n\
             # HELP foo Some text and \\n some \\\" escaping\n\
             foo_total 17.1\n\
             foo_created 1515151515.757576\n\
             # TYPE bar_hits counter\n\
             # UNIT bar_hits hits\n",
        );
        for values in by_identity(vec![&["/"][..], &["/about"][..]]) {
            let total = if values[0] == "/" { 2 } else { 1 };
            expected.push_str(&format!(
                "bar_hits_total{{path=\"{0}\"}} {total}\n\
                 bar_hits_created{{path=\"{0}\"}} 1515151515.757576\n",
                values[0]
            ));
        }
        expected.push_str("# EOF\n");

        assert_eq!(registry.render().unwrap(), expected);
    }

    #[test]
    fn test_write_gauges() {
        let registry = mock_registry();
        let foo = registry.gauge(Desc::new("foo").with_labels(["a"]));
        foo.must(&["b"]).set(17.1);
        foo.must(&["c"]);
        registry.gauge(Desc::new("bar")).must(NONE).set(-1.5);
        registry
            .gauge(Desc::new("bar").with_unit("bytes"))
            .must(NONE)
            .set(4096.0);
        registry.gauge(Desc::new("baz")).must(NONE);

        assert_eq!(
            registry.render().unwrap(),
            "# TYPE foo gauge\n\
             foo{a=\"b\"} 17.1\n\
             # TYPE bar gauge\n\
             bar -1.5\n\
             # TYPE bar_bytes gauge\n\
             # UNIT bar_bytes bytes\n\
             bar_bytes 4096\n\
             # EOF\n"
        );
    }

    #[test]
    fn test_write_histogram() {
        let registry = mock_registry();
        let foo = registry.histogram(Desc::new("foo"), &[0.01, 0.1, 1.0, 10.0]);
        let h = foo.must(NONE);
        for v in [0.005, 0.05, 0.05, 0.5, 5.0, 50.0] {
            h.observe(v);
        }
        h.observe_with_exemplar(&Exemplar::new(0.054, LabelSet::new()));
        h.observe_with_exemplar(
            &Exemplar::new(9.8, LabelSet::new().with("trace_id", "oHg5SJYRHA0"))
                .with_timestamp(UNIX_EPOCH + Duration::from_secs(1515151515)),
        );

        assert_eq!(
            registry.render().unwrap(),
            "# TYPE foo histogram\n\
             foo_bucket{le=\"0.01\"} 1\n\
             foo_bucket{le=\"0.1\"} 4 # {} 0.054\n\
             foo_bucket{le=\"1\"} 5\n\
             foo_bucket{le=\"10\"} 7 # {trace_id=\"oHg5SJYRHA0\"} 9.8 1515151515\n\
             foo_bucket{le=\"+Inf\"} 8\n\
             foo_count 8\n\
             foo_sum 65.459\n\
             foo_created 1515151515.757576\n\
             # EOF\n"
        );
    }

    #[test]
    fn test_histogram_rejects_le_label() {
        let registry = mock_registry();
        assert!(matches!(
            registry.add_histogram(Desc::new("foo").with_labels(["le"]), &[1.0]),
            Err(Error::ReservedLabel(_))
        ));
        assert!(matches!(
            registry.add_histogram(Desc::new("foo"), &[2.0, 1.0]),
            Err(Error::InvalidBounds(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_write_summary() {
        let registry = mock_registry();
        let foo = registry.summary(Desc::new("foo").with_unit("seconds"));
        foo.must(NONE).observe(0.25);
        foo.must(NONE).observe(1.5);

        assert_eq!(
            registry.render().unwrap(),
            "# TYPE foo_seconds summary\n\
             # UNIT foo_seconds seconds\n\
             foo_seconds_count 2\n\
             foo_seconds_sum 1.75\n\
             foo_seconds_created 1515151515.757576\n\
             # EOF\n"
        );
    }

    #[test]
    fn test_write_info() {
        let registry = mock_registry();
        let foo = registry.info(Desc::new("foo").with_labels(["component", "ver"]));
        foo.must(&["core", "8.2.7"]);
        foo.must(&["auth", "8.1.9"]);

        let mut expected = String::from("# TYPE foo info\n");
        for values in by_identity(vec![&["core", "8.2.7"][..], &["auth", "8.1.9"][..]]) {
            expected.push_str(&format!(
                "foo_info{{component=\"{}\",ver=\"{}\"}} 1\n",
                values[0], values[1]
            ));
        }
        expected.push_str("# EOF\n");

        assert_eq!(registry.render().unwrap(), expected);
    }

    #[test]
    fn test_write_state_set() {
        let registry = mock_registry();
        let foo = registry.state_set(Desc::new("foo").with_labels(["a"]), &["one", "two"]);
        foo.must(&["b"]).set("one", true);
        foo.must(&["c"]).set("two", true);
        foo.must(&[""]);

        let mut expected = String::from("# TYPE foo stateset\n");
        for values in by_identity(vec![&["b"][..], &["c"][..], &[""][..]]) {
            let (one, two) = match values[0] {
                "b" => (1, 0),
                "c" => (0, 1),
                _ => (0, 0),
            };
            let prefix = if values[0].is_empty() {
                String::new()
            } else {
                format!("a=\"{}\",", values[0])
            };
            expected.push_str(&format!(
                "foo{{{prefix}foo=\"one\"}} {one}\nfoo{{{prefix}foo=\"two\"}} {two}\n"
            ));
        }
        expected.push_str("# EOF\n");

        assert_eq!(registry.render().unwrap(), expected);
    }

    #[test]
    fn test_state_set_rejects_own_name_as_label() {
        let registry = mock_registry();
        assert!(matches!(
            registry.add_state_set(Desc::new("foo").with_labels(["foo"]), &["x"]),
            Err(Error::ReservedLabel(_))
        ));
    }

    #[test]
    fn test_state_set_name_must_be_a_label_name() {
        let registry = mock_registry();
        assert!(registry.add_gauge(Desc::new("app:door")).is_ok());
        assert!(matches!(
            registry.add_state_set(Desc::new("app:door_state"), &["open", "closed"]),
            Err(Error::InvalidLabelName(name)) if name == "app:door_state"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_state_set_unknown_state_is_reported() {
        let reported = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&reported);
        let registry = mock_registry().with_error_handler(ErrorHandler::new(move |err| {
            assert!(matches!(err, Error::UnknownState(_)));
            seen.fetch_add(1, Ordering::Relaxed);
        }));

        let foo = registry.state_set(Desc::new("foo"), &["one"]);
        foo.must(NONE).set("missing", true);
        foo.must(NONE).toggle("missing");
        assert_eq!(reported.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_write_unknown() {
        let registry = mock_registry();
        registry.unknown(Desc::new("foo")).must(NONE).set(17.1);

        assert_eq!(
            registry.render().unwrap(),
            "# TYPE foo unknown\nfoo 17.1\n# EOF\n"
        );
    }

    #[test]
    fn test_escapes_label_values() {
        let registry = mock_registry();
        let foo = registry.gauge(Desc::new("foo").with_labels(["path"]));
        foo.must(&["C:\\dir \"x\"\nnext"]).set(1.0);

        assert_eq!(
            registry.render().unwrap(),
            "# TYPE foo gauge\nfoo{path=\"C:\\\\dir \\\"x\\\"\\nnext\"} 1\n# EOF\n"
        );
    }

    #[test]
    fn test_consistent_output_is_repeatable() {
        let build = || {
            let registry = mock_registry();
            let family = registry.counter(Desc::new("req").with_labels(["path"]));
            for i in 0..50 {
                family.must(&[format!("/p{i}")]).add(i as f64);
            }
            registry.render().unwrap()
        };

        let first = build();
        assert_eq!(first, build());
        assert_eq!(first, build());
    }

    #[test]
    fn test_default_order_is_creation_order() {
        let registry = Registry::new().with_clock(Clock::fixed(mock_time()));
        let family = registry.gauge(Desc::new("g").with_labels(["k"]));
        for k in ["z", "a", "m"] {
            family.must(&[k]).set(1.0);
        }

        assert_eq!(
            registry.render().unwrap(),
            "# TYPE g gauge\ng{k=\"z\"} 1\ng{k=\"a\"} 1\ng{k=\"m\"} 1\n# EOF\n"
        );
    }

    #[test]
    fn test_write_to_counts_bytes() {
        let registry = mock_registry();
        registry.gauge(Desc::new("foo")).must(NONE).set(2.0);

        let mut out = Vec::new();
        let n = registry.write_to(&mut out).unwrap();
        assert_eq!(n, out.len());
        assert_eq!(n, "# TYPE foo gauge\nfoo 2\n# EOF\n".len());
    }

    #[test]
    fn test_write_to_reports_sink_errors() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let registry = mock_registry();
        assert!(matches!(registry.write_to(Broken), Err(Error::Io(_))));
    }

    #[test]
    fn test_concurrent_updates_and_scrapes() {
        let registry = Arc::new(mock_registry());
        let family = registry.counter(Desc::new("hits").with_labels(["worker"]));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let family = family.clone();
                thread::spawn(move || {
                    let worker = i.to_string();
                    for _ in 0..200 {
                        family.must(&[worker.as_str()]).add(1.0);
                        if i == 0 {
                            let out = registry.render().unwrap();
                            assert!(out.ends_with("# EOF\n"));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(family.len(), 4);
        for i in 0..4 {
            assert_eq!(family.must(&[i.to_string()]).total(), 200.0);
        }
    }

    #[test]
    fn test_global() {
        let a = Registry::global();
        let b = Registry::global();
        assert!(std::ptr::eq(a, b));
    }
}
