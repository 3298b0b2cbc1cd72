//! Info metrics: static key/value metadata exposed as a constant `1`.

use crate::desc::Desc;
use crate::instruments::{Instrument, MetricPoint, MetricSuffix};

/// Carries no state; the information lives in the label values of the
/// family member.
///
/// ```rust
/// use openmetrics::desc::Desc;
/// use openmetrics::instruments::info::Info;
/// use openmetrics::instruments::Instrument;
///
/// let mut points = Vec::new();
/// Info.append_points(&mut points, &Desc::new("build"));
/// assert_eq!(points.len(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Info;

impl Info {
    pub const fn new() -> Self {
        Info
    }
}

impl Instrument for Info {
    fn append_points(&self, dst: &mut Vec<MetricPoint>, _desc: &Desc) {
        dst.push(MetricPoint::new(MetricSuffix::Info, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::PointValue;

    #[test]
    fn test_append_points() {
        let mut points = Vec::new();
        Info::new().append_points(&mut points, &Desc::new("build"));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].suffix, MetricSuffix::Info);
        assert_eq!(points[0].value, PointValue::Number(1.0));
        assert!(points[0].label.is_none());
    }
}
