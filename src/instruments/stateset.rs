//! A fixed set of named boolean states.
//!
//! The state names are fixed when the set is created: duplicates are dropped,
//! first occurrence wins, and declaration order is the exposition order.
//! Each state is exposed as one point carrying an extra label named after the
//! family, whose value is the state name:
//!
//! ```text
//! # TYPE door stateset
//! door{door="open"} 1
//! door{door="closed"} 0
//! ```

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::desc::Desc;
use crate::error::{Error, ErrorHandler, Result};
use crate::instruments::{Instrument, MetricPoint, MetricSuffix};
use crate::labels::Label;

/// Above this many states, lookups binary-search the sorted index.
const LINEAR_SEARCH_MAX: usize = 20;

/// A set of named boolean states, all initially disabled.
///
/// # Examples
///
/// ```rust
/// use openmetrics::instruments::stateset::StateSet;
///
/// let door = StateSet::new(["open", "closed", "open"]);
/// assert_eq!(door.len(), 2);
///
/// door.set("closed", true);
/// assert!(door.is_enabled("closed"));
///
/// door.toggle("closed");
/// assert!(!door.is_enabled("closed"));
///
/// assert!(door.try_set("ajar", true).is_err());
/// ```
#[derive(Debug)]
pub struct StateSet {
    names: Box<[String]>,
    /// Positions into `names`, ordered by name.
    sorted: Box<[usize]>,
    enabled: RwLock<Vec<bool>>,
    on_error: ErrorHandler,
}

impl StateSet {
    /// Creates a state set from `names`, dropping duplicates.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let names: Box<[String]> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| seen.insert(name.clone()))
            .collect();

        let mut sorted: Vec<usize> = (0..names.len()).collect();
        sorted.sort_by(|&a, &b| names[a].cmp(&names[b]));

        Self {
            enabled: RwLock::new(vec![false; names.len()]),
            sorted: sorted.into_boxed_slice(),
            names,
            on_error: ErrorHandler::default(),
        }
    }

    /// Routes errors of [`set`](Self::set) and [`toggle`](Self::toggle) to `handler`.
    pub fn with_error_handler(self, handler: ErrorHandler) -> Self {
        Self {
            on_error: handler,
            ..self
        }
    }

    /// Enables or disables the state `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownState`] if `name` is not part of the set.
    pub fn try_set(&self, name: &str, enabled: bool) -> Result<()> {
        let pos = self.position(name)?;
        self.enabled.write()[pos] = enabled;
        Ok(())
    }

    /// Like [`try_set`](Self::try_set), reporting errors to the error handler.
    pub fn set(&self, name: &str, enabled: bool) {
        if let Err(err) = self.try_set(name, enabled) {
            self.on_error.handle(&err);
        }
    }

    /// Flips the state `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownState`] if `name` is not part of the set.
    pub fn try_toggle(&self, name: &str) -> Result<()> {
        let pos = self.position(name)?;
        let mut enabled = self.enabled.write();
        enabled[pos] = !enabled[pos];
        Ok(())
    }

    /// Like [`try_toggle`](Self::try_toggle), reporting errors to the error handler.
    pub fn toggle(&self, name: &str) {
        if let Err(err) = self.try_toggle(name) {
            self.on_error.handle(&err);
        }
    }

    /// Returns `true` if `name` is part of the set and enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.search(name)
            .map_or(false, |pos| self.enabled.read()[pos])
    }

    /// Returns `true` if `name` is part of the set.
    pub fn contains(&self, name: &str) -> bool {
        self.search(name).is_some()
    }

    /// Returns the number of states.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the state names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.search(name)
            .ok_or_else(|| Error::UnknownState(name.to_owned()))
    }

    fn search(&self, name: &str) -> Option<usize> {
        if self.names.len() > LINEAR_SEARCH_MAX {
            self.sorted
                .binary_search_by(|&pos| self.names[pos].as_str().cmp(name))
                .ok()
                .map(|i| self.sorted[i])
        } else {
            self.names.iter().position(|n| n == name)
        }
    }
}

impl Instrument for StateSet {
    fn append_points(&self, dst: &mut Vec<MetricPoint>, desc: &Desc) {
        let enabled = self.enabled.read();
        for (name, &on) in self.names.iter().zip(enabled.iter()) {
            dst.push(
                MetricPoint::new(MetricSuffix::Empty, if on { 1.0 } else { 0.0 })
                    .with_label(Label::new(desc.name.as_str(), name.as_str())),
            );
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
    fn test_new_dedups() {
        let set = StateSet::new(["foo", "bar", "foo"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.names().collect::<Vec<_>>(), ["foo", "bar"]);
        assert!(set.contains("foo"));
        assert!(set.contains("bar"));
        assert!(!set.contains("baz"));
    }

    #[test]
    fn test_set_and_toggle() {
        let set = StateSet::new(["foo", "bar"]);
        assert!(!set.is_enabled("foo"));

        set.try_set("foo", true).unwrap();
        assert!(set.is_enabled("foo"));

        set.try_toggle("foo").unwrap();
        assert!(!set.is_enabled("foo"));
        assert!(!set.is_enabled("missing"));
    }

    #[test]
    fn test_unknown_state() {
        let set = StateSet::new(["foo", "bar"]);
        let err = set.try_set("missing", true).unwrap_err();
        assert_eq!(err.to_string(), r#"invalid state "missing""#);
        assert!(matches!(set.try_toggle("missing"), Err(Error::UnknownState(_))));
    }

    #[test]
    fn test_large_set_uses_sorted_index() {
        let names: Vec<String> = (0..40).rev().map(|i| format!("s{i:02}")).collect();
        let set = StateSet::new(names.clone());
        assert_eq!(set.len(), 40);

        for name in &names {
            assert!(set.contains(name));
        }
        assert!(!set.contains("s40"));

        set.set("s07", true);
        assert!(set.is_enabled("s07"));
        assert!(!set.is_enabled("s08"));

        let mut points = Vec::new();
        set.append_points(&mut points, &Desc::new("mock"));
        let on: Vec<_> = points
            .iter()
            .filter(|p| p.value == PointValue::Number(1.0))
            .map(|p| p.label.as_ref().unwrap().value.as_str())
            .collect();
        assert_eq!(on, ["s07"]);
    }

    #[test]
    fn test_append_points() {
        let set = StateSet::new(["foo", "bar"]);
        set.toggle("foo");

        let mut points = Vec::new();
        set.append_points(&mut points, &Desc::new("mock"));
        assert_eq!(
            points,
            vec![
                MetricPoint::new(MetricSuffix::Empty, 1.0).with_label(Label::new("mock", "foo")),
                MetricPoint::new(MetricSuffix::Empty, 0.0).with_label(Label::new("mock", "bar")),
            ]
        );
    }

    #[test]
    fn test_multiple_threads() {
        let set = Arc::new(StateSet::new(["one", "two"]));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let set = Arc::clone(&set);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        set.toggle("one");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // an even number of toggles
        assert!(!set.is_enabled("one"));
    }
}
