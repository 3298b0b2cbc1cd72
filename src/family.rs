//! Metric families: one instrument per label combination.
//!
//! A [`MetricFamily`] owns a [`Desc`] and lazily creates one instrument for
//! every distinct combination of label values it is asked for. Lookups are
//! double-checked: the steady-state path takes only a read lock, and
//! concurrent first-time callers for the same combination collapse onto a
//! single instrument under the write lock.
//!
//! Three call styles share one fallible core:
//!
//! - [`with`](MetricFamily::with) returns a [`Result`],
//! - [`must`](MetricFamily::must) panics on error,
//! - [`with_or_report`](MetricFamily::with_or_report) hands the error to the
//!   family's [`ErrorHandler`] and returns a detached instrument that is
//!   never exposed.
//!
//! # Examples
//!
//! ```rust
//! use openmetrics::desc::Desc;
//! use openmetrics::registry::Registry;
//!
//! let registry = Registry::new();
//! let requests = registry.counter(Desc::new("http_requests").with_labels(["method", "status"]));
//!
//! requests.must(&["GET", "200"]).add(1.0);
//! requests.must(&["GET", "200"]).add(1.0);
//! requests.must(&["POST", "500"]).add(1.0);
//!
//! assert_eq!(requests.len(), 2);
//! assert_eq!(requests.must(&["GET", "200"]).total(), 2.0);
//! assert!(requests.with(&["GET"]).is_err());
//! ```

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::desc::Desc;
use crate::error::{ErrorHandler, Result};
use crate::instruments::counter::Counter;
use crate::instruments::gauge::Gauge;
use crate::instruments::histogram::Histogram;
use crate::instruments::info::Info;
use crate::instruments::stateset::StateSet;
use crate::instruments::summary::Summary;
use crate::instruments::{Instrument, MetricType};
use crate::labels::LabelIdentity;
use crate::snapshot::Snapshot;

pub type CounterFamily = MetricFamily<Counter>;
/// Also used for families of type `unknown`.
pub type GaugeFamily = MetricFamily<Gauge>;
pub type HistogramFamily = MetricFamily<Histogram>;
pub type SummaryFamily = MetricFamily<Summary>;
pub type InfoFamily = MetricFamily<Info>;
pub type StateSetFamily = MetricFamily<StateSet>;

type Factory<I> = Box<dyn Fn() -> Result<I> + Send + Sync>;

struct Member<I> {
    id: u64,
    instrument: Arc<I>,
    values: Arc<[String]>,
}

/// Members in creation order, indexed by label identity.
struct Members<I> {
    list: Vec<Member<I>>,
    index: HashMap<u64, usize>,
}

struct Inner<I> {
    desc: Arc<Desc>,
    metric_type: MetricType,
    id: u64,
    members: RwLock<Members<I>>,
    factory: Factory<I>,
    detached: Arc<I>,
    on_error: ErrorHandler,
}

/// The registry's view of a family, independent of its instrument type.
pub(crate) trait Collector: Send + Sync {
    fn desc(&self) -> &Desc;

    fn id(&self) -> u64;

    /// Stages the points of every member into `snapshot`. With `consistent`
    /// set, members are visited in ascending label identity order instead of
    /// creation order.
    fn collect(&self, snapshot: &mut Snapshot, consistent: bool);
}

impl<I: Instrument> Collector for Inner<I> {
    fn desc(&self) -> &Desc {
        &self.desc
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn collect(&self, snapshot: &mut Snapshot, consistent: bool) {
        let members = self.members.read();
        snapshot.reset(Arc::clone(&self.desc), self.metric_type);

        if consistent {
            let mut order = std::mem::take(&mut snapshot.order);
            order.clear();
            order.extend(0..members.list.len());
            order.sort_unstable_by_key(|&pos| members.list[pos].id);
            for &pos in &order {
                let member = &members.list[pos];
                snapshot.append(&*member.instrument, &member.values);
            }
            snapshot.order = order;
        } else {
            for member in &members.list {
                snapshot.append(&*member.instrument, &member.values);
            }
        }
    }
}

/// A family of instruments of type `I`, keyed by label values.
///
/// Cloning is cheap and yields a handle to the same family.
pub struct MetricFamily<I> {
    inner: Arc<Inner<I>>,
}

impl<I> Clone for MetricFamily<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I: Instrument> MetricFamily<I> {
    /// Creates a standalone family. `factory` builds the instrument for each
    /// new label combination.
    ///
    /// The descriptor is not validated here; families obtained from a
    /// [`Registry`](crate::registry::Registry) are.
    ///
    /// # Errors
    ///
    /// Fails if `factory` fails; it is called once up front to build the
    /// detached instrument.
    pub fn new<F>(desc: Desc, metric_type: MetricType, on_error: ErrorHandler, factory: F) -> Result<Self>
    where
        F: Fn() -> Result<I> + Send + Sync + 'static,
    {
        let detached = Arc::new(factory()?);
        Ok(Self {
            inner: Arc::new(Inner {
                id: desc.id(),
                desc: Arc::new(desc),
                metric_type,
                members: RwLock::new(Members {
                    list: Vec::new(),
                    index: HashMap::new(),
                }),
                factory: Box::new(factory),
                detached,
                on_error,
            }),
        })
    }

    /// Returns the instrument for `values`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabelArity`](crate::error::Error::LabelArity) if the
    /// number of values differs from the declared label names. No instrument
    /// is created in that case.
    pub fn with<S: AsRef<str>>(&self, values: &[S]) -> Result<Arc<I>> {
        self.inner.desc.check_label_values(values)?;
        let id = LabelIdentity::of(values).0;

        {
            let members = self.inner.members.read();
            if let Some(&pos) = members.index.get(&id) {
                return Ok(Arc::clone(&members.list[pos].instrument));
            }
        }

        let mut members = self.inner.members.write();
        if let Some(&pos) = members.index.get(&id) {
            return Ok(Arc::clone(&members.list[pos].instrument));
        }

        let instrument = Arc::new((self.inner.factory)()?);
        let pos = members.list.len();
        members.list.push(Member {
            id,
            instrument: Arc::clone(&instrument),
            values: values.iter().map(|v| v.as_ref().to_owned()).collect(),
        });
        members.index.insert(id, pos);
        Ok(instrument)
    }

    /// Like [`with`](Self::with), but panics on error.
    ///
    /// # Panics
    ///
    /// Panics if the number of values differs from the declared label names.
    pub fn must<S: AsRef<str>>(&self, values: &[S]) -> Arc<I> {
        match self.with(values) {
            Ok(instrument) => instrument,
            Err(err) => panic!("{err}"),
        }
    }

    /// Like [`with`](Self::with), but reports errors to the family's error
    /// handler and returns a detached instrument instead. The detached
    /// instrument is shared by all failed lookups and never exposed.
    pub fn with_or_report<S: AsRef<str>>(&self, values: &[S]) -> Arc<I> {
        match self.with(values) {
            Ok(instrument) => instrument,
            Err(err) => {
                self.inner.on_error.handle(&err);
                Arc::clone(&self.inner.detached)
            }
        }
    }

    /// Returns the number of instruments created so far.
    pub fn len(&self) -> usize {
        self.inner.members.read().list.len()
    }

    /// Returns `true` if no instrument was created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the family identity, derived from name and unit.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn desc(&self) -> &Desc {
        &self.inner.desc
    }

    pub fn metric_type(&self) -> MetricType {
        self.inner.metric_type
    }

    pub(crate) fn collector(&self) -> Arc<dyn Collector> {
        self.inner.clone()
    }
}

impl<I> Debug for MetricFamily<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricFamily")
            .field("desc", &self.inner.desc)
            .field("metric_type", &self.inner.metric_type)
            .finish_non_exhaustive()
    }
}
