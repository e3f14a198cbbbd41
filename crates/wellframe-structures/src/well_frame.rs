use crate::error::{Result, WellframeError};
use crate::run::{RunId, WellId, WellInfo};
use ndarray::{Array2, Axis};
use std::collections::BTreeSet;

/// Metadata columns of one row of a [`WellFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellRow {
    pub well: WellId,
    pub run: RunId,
    pub index: u32,
    pub label: String,
}

impl WellRow {
    pub fn from_info(run: RunId, info: &WellInfo) -> WellRow {
        WellRow {
            well: info.id,
            run,
            index: info.index,
            label: info.label.clone(),
        }
    }
}

/// An analysis-ready table with one row per well: metadata columns plus a
/// per-frame feature matrix.
///
/// A `WellFrame` cached for a run always holds every well of that run;
/// narrowing to a subset of wells happens in memory, after load, and
/// never feeds back into the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct WellFrame {
    rows: Vec<WellRow>,
    features: Array2<f32>,
}

impl WellFrame {
    pub fn new(rows: Vec<WellRow>, features: Array2<f32>) -> Result<WellFrame> {
        if rows.len() != features.nrows() {
            return Err(WellframeError::Integrity(format!(
                "{} well rows but {} feature rows",
                rows.len(),
                features.nrows()
            )));
        }
        Ok(WellFrame { rows, features })
    }

    pub fn empty() -> WellFrame {
        WellFrame {
            rows: Vec::new(),
            features: Array2::zeros((0, 0)),
        }
    }

    pub fn n_wells(&self) -> usize {
        self.rows.len()
    }

    /// Number of feature samples per well.
    pub fn n_frames(&self) -> usize {
        self.features.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[WellRow] {
        &self.rows
    }

    pub fn features(&self) -> &Array2<f32> {
        &self.features
    }

    pub fn runs(&self) -> BTreeSet<RunId> {
        self.rows.iter().map(|r| r.run).collect()
    }

    pub fn wells(&self) -> BTreeSet<WellId> {
        self.rows.iter().map(|r| r.well).collect()
    }

    /// Concatenates frames row-wise. Frames of different widths are
    /// padded on the right with NaN, matching what happens when runs of
    /// different battery lengths land in one table.
    pub fn concat(frames: Vec<WellFrame>) -> Result<WellFrame> {
        let frames: Vec<WellFrame> = frames.into_iter().filter(|f| !f.is_empty()).collect();
        if frames.is_empty() {
            return Err(WellframeError::EmptyCollection(
                "no well frames to concatenate".into(),
            ));
        }
        let width = frames.iter().map(|f| f.n_frames()).max().unwrap_or(0);
        let n_rows: usize = frames.iter().map(|f| f.n_wells()).sum();
        let mut rows = Vec::with_capacity(n_rows);
        let mut features = Array2::from_elem((n_rows, width), f32::NAN);
        let mut at = 0;
        for frame in frames {
            let n = frame.n_wells();
            features
                .slice_mut(ndarray::s![at..at + n, ..frame.n_frames()])
                .assign(&frame.features);
            rows.extend(frame.rows);
            at += n;
        }
        WellFrame::new(rows, features)
    }

    /// Keeps only the given wells, preserving order. Purely in memory.
    pub fn filter_wells(&self, keep: &BTreeSet<WellId>) -> WellFrame {
        let picked: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| keep.contains(&r.well))
            .map(|(i, _)| i)
            .collect();
        let rows = picked.iter().map(|i| self.rows[*i].clone()).collect();
        let features = self.features.select(Axis(0), &picked);
        WellFrame { rows, features }
    }

    /// Sorts rows by (run, well index), the standard presentation order.
    pub fn sort_standard(mut self) -> WellFrame {
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by_key(|i| (self.rows[*i].run, self.rows[*i].index, self.rows[*i].well));
        let rows = order.iter().map(|i| self.rows[*i].clone()).collect();
        let features = self.features.select(Axis(0), &order);
        self.rows = rows;
        self.features = features;
        self
    }

    /// Replaces each row's label via `labeler`. Does not touch the cache.
    pub fn relabel<F: Fn(&WellRow) -> String>(mut self, labeler: F) -> WellFrame {
        for row in &mut self.rows {
            row.label = labeler(row);
        }
        self
    }
}
