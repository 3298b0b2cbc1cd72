//! OpenMetrics text rendering.
//!
//! [`ExpositionWriter`] turns descriptors and [`MetricPoint`]s into the
//! line-oriented text format:
//!
//! ```text
//! # TYPE http_request_seconds histogram
//! # UNIT http_request_seconds seconds
//! # HELP http_request_seconds Request latency.
//! http_request_seconds_bucket{path="/",le="0.1"} 3 # {trace_id="KOO5S4vxi0o"} 0.067
//! http_request_seconds_bucket{path="/",le="+Inf"} 4
//! http_request_seconds_count{path="/"} 4
//! http_request_seconds_sum{path="/"} 1.367
//! http_request_seconds_created{path="/"} 1515151515.757576
//! # EOF
//! ```
//!
//! # Number formatting
//!
//! Sample values are rounded to 12 decimal places before printing to drop
//! float noise, then printed as the shortest decimal that round-trips:
//!
//! | value | output |
//! |-------|--------|
//! | `f64::NAN` | `NaN` |
//! | `f64::INFINITY` | `+Inf` |
//! | `0.1 + 0.2` | `0.3` |
//! | `4096.0` | `4096` |
//! | `123456.0` | `123456` |
//! | `1234567.0` | `1.234567e+06` |
//! | `1e-7` | `1e-07` |
//!
//! Timestamps are epoch seconds with the least precision that is exact at
//! millisecond resolution: `1515151515`, `1515151515.757`, or six decimals
//! otherwise.

use std::fmt::{self, Display};
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::desc::Desc;
use crate::exemplar::Exemplar;
use crate::instruments::{MetricPoint, MetricType, PointValue};
use crate::labels::Label;

/// Content type of an OpenMetrics text document.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Terminal line of every document.
pub const EOF: &str = "# EOF\n";

/// Formats a float with the shortest round-trippable representation, without
/// rounding. Used for bucket bounds.
pub(crate) fn format_float(v: f64) -> String {
    Float(v).to_string()
}

/// Shortest round-trippable float. Decimal exponents outside `-4..6` switch
/// to exponent form with a signed, two-digit minimum exponent.
struct Float(f64);

impl Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            f.write_str("NaN")
        } else if v.is_infinite() {
            f.write_str(if v > 0.0 { "+Inf" } else { "-Inf" })
        } else if v == 0.0 {
            f.write_str("0")
        } else {
            let sci = format!("{v:e}");
            match sci.split_once('e').map(|(m, e)| (m, e.parse::<i32>())) {
                Some((mantissa, Ok(exp))) if !(-4..6).contains(&exp) => {
                    let sign = if exp < 0 { '-' } else { '+' };
                    write!(f, "{mantissa}e{sign}{:02}", exp.unsigned_abs())
                }
                _ => write!(f, "{v}"),
            }
        }
    }
}

/// Sample value, rounded to 1e-12.
struct Value(f64);

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Float(round(self.0)).fmt(f)
    }
}

/// 2^53: above this the scaled value has no fractional part left to round.
const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

fn round(v: f64) -> f64 {
    let scaled = v * 1e12;
    if scaled.is_finite() && scaled.abs() < MAX_EXACT {
        scaled.round() / 1e12
    } else {
        v
    }
}

/// Epoch seconds.
struct Epoch(SystemTime);

impl Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, d) = match self.0.duration_since(UNIX_EPOCH) {
            Ok(d) => ("", d),
            Err(e) => ("-", e.duration()),
        };

        let secs = d.as_secs();
        let nanos = d.subsec_nanos();
        if nanos == 0 {
            write!(f, "{sign}{secs}")
        } else if nanos % 1_000_000 == 0 {
            write!(f, "{sign}{secs}.{:03}", nanos / 1_000_000)
        } else {
            let micros = (nanos + 500) / 1_000;
            if micros == 1_000_000 {
                write!(f, "{sign}{}.000000", secs + 1)
            } else {
                write!(f, "{sign}{secs}.{micros:06}")
            }
        }
    }
}

/// Writes OpenMetrics text into any [`Write`] sink.
///
/// The writer does no buffering of its own; hand it a `Vec<u8>` or a
/// `BufWriter` to avoid small writes hitting the sink directly.
///
/// # Examples
///
/// ```rust
/// use openmetrics::desc::Desc;
/// use openmetrics::instruments::{MetricPoint, MetricSuffix, MetricType};
/// use openmetrics::writer::ExpositionWriter;
///
/// let desc = Desc::new("jobs").with_labels(["queue"]);
/// let mut w = ExpositionWriter::new(Vec::new());
/// w.write_desc(&desc, MetricType::Gauge)?;
/// w.write_point(&desc, &["mail".to_string()], &MetricPoint::new(MetricSuffix::Empty, 3.0))?;
/// w.write_eof()?;
///
/// let text = String::from_utf8(w.into_inner()).unwrap();
/// assert_eq!(text, "# TYPE jobs gauge\njobs{queue=\"mail\"} 3\n# EOF\n");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct ExpositionWriter<W> {
    inner: W,
}

impl<W: Write> ExpositionWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Returns a mutable reference to the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Writes the `# TYPE`, `# UNIT` and `# HELP` lines of a family. `UNIT`
    /// and `HELP` are skipped when empty.
    pub fn write_desc(&mut self, desc: &Desc, metric_type: MetricType) -> io::Result<()> {
        self.write_intro("# TYPE ", desc, metric_type.as_str(), false)?;
        if !desc.unit.is_empty() {
            self.write_intro("# UNIT ", desc, &desc.unit, false)?;
        }
        if !desc.help.is_empty() {
            self.write_intro("# HELP ", desc, &desc.help, true)?;
        }
        Ok(())
    }

    /// Writes one sample line. `values` are the family's label values, in
    /// the order of `desc.labels`; empty values are left out.
    pub fn write_point<S: AsRef<str>>(
        &mut self,
        desc: &Desc,
        values: &[S],
        point: &MetricPoint,
    ) -> io::Result<()> {
        self.write_name(desc)?;
        self.inner.write_all(point.suffix.as_str().as_bytes())?;
        self.write_labels(&desc.labels, values, point.label.as_ref())?;

        match point.value {
            PointValue::Number(v) => write!(self.inner, " {}", Value(v))?,
            PointValue::Epoch(at) => write!(self.inner, " {}", Epoch(at))?,
        }
        if let Some(at) = point.timestamp {
            write!(self.inner, " {}", Epoch(at))?;
        }
        if let Some(exemplar) = point.exemplar.as_deref() {
            self.write_exemplar(exemplar)?;
        }
        self.inner.write_all(b"\n")
    }

    /// Writes the terminal `# EOF` line.
    pub fn write_eof(&mut self) -> io::Result<()> {
        self.inner.write_all(EOF.as_bytes())
    }

    fn write_intro(&mut self, prefix: &str, desc: &Desc, text: &str, escape: bool) -> io::Result<()> {
        self.inner.write_all(prefix.as_bytes())?;
        self.write_name(desc)?;
        self.inner.write_all(b" ")?;
        if escape {
            self.write_escaped(text)?;
        } else {
            self.inner.write_all(text.as_bytes())?;
        }
        self.inner.write_all(b"\n")
    }

    fn write_name(&mut self, desc: &Desc) -> io::Result<()> {
        self.inner.write_all(desc.name.as_bytes())?;
        if !desc.unit.is_empty() {
            self.inner.write_all(b"_")?;
            self.inner.write_all(desc.unit.as_bytes())?;
        }
        Ok(())
    }

    fn write_labels<S: AsRef<str>>(
        &mut self,
        names: &[String],
        values: &[S],
        extra: Option<&Label>,
    ) -> io::Result<()> {
        let extra = extra.filter(|l| !l.is_zero());
        let mut pairs = names
            .iter()
            .zip(values)
            .map(|(n, v)| (n.as_str(), v.as_ref()))
            .chain(extra.map(|l| (l.name.as_str(), l.value.as_str())))
            .filter(|(_, v)| !v.is_empty())
            .peekable();

        if pairs.peek().is_none() {
            return Ok(());
        }

        self.inner.write_all(b"{")?;
        let mut first = true;
        for (name, value) in pairs {
            self.write_label(name, value, first)?;
            first = false;
        }
        self.inner.write_all(b"}")
    }

    fn write_exemplar(&mut self, exemplar: &Exemplar) -> io::Result<()> {
        self.inner.write_all(b" # {")?;
        let mut first = true;
        for label in exemplar.labels.non_empty() {
            self.write_label(&label.name, &label.value, first)?;
            first = false;
        }
        write!(self.inner, "}} {}", Value(exemplar.value))?;
        if let Some(at) = exemplar.timestamp {
            write!(self.inner, " {}", Epoch(at))?;
        }
        Ok(())
    }

    fn write_label(&mut self, name: &str, value: &str, first: bool) -> io::Result<()> {
        if !first {
            self.inner.write_all(b",")?;
        }
        self.inner.write_all(name.as_bytes())?;
        self.inner.write_all(b"=\"")?;
        self.write_escaped(value)?;
        self.inner.write_all(b"\"")
    }

    fn write_escaped(&mut self, s: &str) -> io::Result<()> {
        let bytes = s.as_bytes();
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let escaped: &[u8] = match b {
                b'\n' => b"\\n",
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                _ => continue,
            };
            self.inner.write_all(&bytes[start..i])?;
            self.inner.write_all(escaped)?;
            start = i + 1;
        }
        self.inner.write_all(&bytes[start..])
    }
}
