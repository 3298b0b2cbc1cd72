//! Metric family descriptions.

use crate::error::{Error, Result};
use crate::labels::{hash, TERM};
use crate::validation;

/// Describes a metric family: name, unit, help text and label names.
///
/// A `Desc` is validated when its family is registered and is immutable
/// afterwards.
///
/// # Examples
///
/// ```rust
/// use openmetrics::desc::Desc;
///
/// let desc = Desc::new("http_request_duration")
///     .with_unit("seconds")
///     .with_help("Time spent serving HTTP requests.")
///     .with_labels(["method", "status"]);
///
/// assert!(desc.validate().is_ok());
/// assert_eq!(desc.full_name(), "http_request_duration_seconds");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Desc {
    /// Name of the metric (required).
    pub name: String,
    /// Unit of the metric, appended to the name on the wire.
    pub unit: String,
    /// Short human readable description.
    pub help: String,
    /// Names of the labels instruments of this family are keyed by.
    pub labels: Vec<String>,
}

impl Desc {
    /// Creates a description with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the unit.
    pub fn with_unit(self, unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..self
        }
    }

    /// Sets the help text.
    pub fn with_help(self, help: impl Into<String>) -> Self {
        Self {
            help: help.into(),
            ..self
        }
    }

    /// Sets the label names.
    pub fn with_labels<S: Into<String>>(self, labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Validates name, unit, help text and label names.
    pub fn validate(&self) -> Result<()> {
        validation::check_metric_name(&self.name)?;
        validation::check_metric_unit(&self.name, &self.unit)?;
        validation::check_help(&self.help)?;
        validation::check_label_names(self.labels.iter().map(String::as_str))
    }

    /// Returns the exposed name: `name` or `name_unit`.
    pub fn full_name(&self) -> String {
        if self.unit.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.name, self.unit)
        }
    }

    /// Returns the family identity, derived from name and unit only.
    pub fn id(&self) -> u64 {
        let id = hash(0, self.name.as_bytes());
        let id = hash(id, &[TERM]);
        hash(id, self.unit.as_bytes())
    }

    /// Checks that exactly one value is given per declared label name.
    pub fn check_label_values<S: AsRef<str>>(&self, values: &[S]) -> Result<()> {
        if values.len() != self.labels.len() {
            return Err(Error::LabelArity {
                name: self.name.clone(),
                expected: self.labels.len(),
                got: values.len(),
            });
        }
        Ok(())
    }

    /// Fails if `label` is one of the declared label names.
    pub(crate) fn reserve_label(&self, label: &str) -> Result<()> {
        if self.labels.iter().any(|l| l == label) {
            return Err(Error::ReservedLabel(label.to_string()));
        }
        Ok(())
    }
}
