//! Per-family staging of wire points.
//!
//! A [`Snapshot`] linearizes the state of every instrument in one family into
//! a flat list of [`MetricPoint`]s. Each instrument's run of points is
//! recorded as an end offset paired with the label values it was created
//! with. Instruments that append nothing leave no trace, so an unset gauge is
//! omitted rather than reported as zero.
//!
//! The registry keeps a single snapshot and reuses its buffers for every
//! family on every scrape.

use std::io::{self, Write};
use std::sync::Arc;

use crate::desc::Desc;
use crate::instruments::{Instrument, MetricPoint, MetricType};
use crate::writer::ExpositionWriter;

/// Staged points of one family.
#[derive(Debug, Default)]
pub(crate) struct Snapshot {
    desc: Option<Arc<Desc>>,
    metric_type: Option<MetricType>,
    points: Vec<MetricPoint>,
    values: Vec<Arc<[String]>>,
    offsets: Vec<usize>,
    /// Scratch for ordering instruments by identity.
    pub(crate) order: Vec<usize>,
}

impl Snapshot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Starts a new family, keeping allocated capacity.
    pub(crate) fn reset(&mut self, desc: Arc<Desc>, metric_type: MetricType) {
        self.clear();
        self.desc = Some(desc);
        self.metric_type = Some(metric_type);
    }

    /// Drops staged points and their exemplar references, keeping capacity.
    pub(crate) fn clear(&mut self) {
        self.desc = None;
        self.metric_type = None;
        self.points.clear();
        self.values.clear();
        self.offsets.clear();
    }

    /// Appends the points of one instrument. Instruments reporting nothing
    /// are skipped.
    pub(crate) fn append<I: Instrument + ?Sized>(&mut self, instrument: &I, values: &Arc<[String]>) {
        let Some(desc) = self.desc.as_deref() else {
            return;
        };

        let before = self.points.len();
        instrument.append_points(&mut self.points, desc);
        if self.points.len() == before {
            return;
        }

        self.offsets.push(self.points.len());
        self.values.push(Arc::clone(values));
    }

    #[cfg(test)]
    fn points(&self) -> &[MetricPoint] {
        &self.points
    }

    /// Number of instruments that contributed points.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns `true` if nothing is staged.
    pub(crate) fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Renders the staged family. Writes nothing at all if no instrument
    /// contributed points.
    pub(crate) fn write_to<W: Write>(&self, w: &mut ExpositionWriter<W>) -> io::Result<()> {
        let (Some(desc), Some(metric_type)) = (self.desc.as_deref(), self.metric_type) else {
            return Ok(());
        };
        if self.is_empty() {
            return Ok(());
        }

        w.write_desc(desc, metric_type)?;

        let mut start = 0;
        for (end, values) in self.offsets.iter().zip(&self.values) {
            for point in &self.points[start..*end] {
                w.write_point(desc, &**values, point)?;
            }
            start = *end;
        }
        Ok(())
    }
}
