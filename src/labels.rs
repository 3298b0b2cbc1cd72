//! Labels, label sets and label identities.
//!
//! A [`Label`] is a name-value pair. An empty value means the label is absent:
//! it is skipped on the wire and never counts against exemplar budgets.
//!
//! A [`LabelIdentity`] is the 64-bit key a family uses to find the instrument
//! for an ordered sequence of label values. It is computed by folding a
//! chainable hash over every value, each followed by a terminator byte that
//! can never occur in UTF-8 text, so `["a", ""]` and `["a"]` never collide by
//! construction. Distinct sequences are assumed to produce distinct 64-bit
//! identities; there is no collision fallback.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

use crate::error::{Error, Result};
use crate::validation::is_valid_label_name;

/// Separator byte appended after every hashed component. `0xFF` is not a valid
/// UTF-8 byte.
pub(crate) const TERM: u8 = 0xFF;

/// A name-value pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    /// Creates a label.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns `true` if the value is empty, i.e. the label is absent.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value.is_empty()
    }
}

/// An ordered list of labels with unique names.
///
/// ```rust
/// use openmetrics::labels::LabelSet;
///
/// let set = LabelSet::from_pairs([("trace_id", "KOO5S4vxi0o"), ("span", "")]);
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.non_empty().count(), 1);
/// assert!(set.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(Vec<Label>);

impl LabelSet {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Builds a set from name-value pairs, preserving order.
    pub fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(n, v)| Label::new(n, v)).collect())
    }

    /// Appends a label, returning `self` for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Appends a label.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Label::new(name, value));
    }

    /// Removes all labels, keeping the allocation.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of labels, including empty ones.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no labels.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all labels.
    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.0.iter()
    }

    /// Iterates over labels that carry a value.
    pub fn non_empty(&self) -> impl Iterator<Item = &Label> {
        self.0.iter().filter(|l| !l.is_zero())
    }

    /// Checks that names are well formed and unique.
    pub fn validate(&self) -> Result<()> {
        for (i, label) in self.0.iter().enumerate() {
            if !is_valid_label_name(&label.name) {
                return Err(Error::InvalidLabelName(label.name.clone()));
            }
            if self.0[i + 1..].iter().any(|l| l.name == label.name) {
                return Err(Error::DuplicateLabel(label.name.clone()));
            }
        }
        Ok(())
    }

    /// Replaces the content with the non-empty labels of `other`, reusing
    /// existing string allocations where possible.
    pub(crate) fn copy_non_empty_from(&mut self, other: &LabelSet) {
        let mut n = 0;
        for label in other.non_empty() {
            if let Some(slot) = self.0.get_mut(n) {
                slot.name.clone_from(&label.name);
                slot.value.clone_from(&label.value);
            } else {
                self.0.push(label.clone());
            }
            n += 1;
        }
        self.0.truncate(n);
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Label> for LabelSet {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Label>> for LabelSet {
    fn from(labels: Vec<Label>) -> Self {
        Self(labels)
    }
}

/// Chainable 64-bit hash step: `seed' = hash(seed, bytes)`.
#[inline]
pub(crate) fn hash(seed: u64, bytes: &[u8]) -> u64 {
    let mut h = DefaultHasher::new();
    h.write_u64(seed);
    h.write(bytes);
    h.finish()
}

/// Hash-derived key of an ordered label value sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelIdentity(pub u64);

impl LabelIdentity {
    /// Folds the hash over `values`, each followed by the terminator byte.
    pub fn of<S: AsRef<str>>(values: &[S]) -> Self {
        let id = values.iter().fold(0, |id, v| {
            let id = hash(id, v.as_ref().as_bytes());
            hash(id, &[TERM])
        });
        Self(id)
    }
}
