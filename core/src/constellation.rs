//! Constellation map extraction
//!
//! A cell of the magnitude grid becomes a constellation point when it is the
//! maximum of its `(2 * dist_freq + 1) x (2 * dist_time + 1)` neighborhood and
//! that maximum exceeds `thresh`. Cells outside the grid count as
//! `BOUNDARY_VALUE`. A decibel mask then clears every cell whose |dB| falls
//! below `max_db * db_thresh`.
//!
//! The two thresholds live on different scales (raw magnitude vs. dB) and
//! are configured separately. With a dB grid referenced to its own maximum,
//! `max_db` is 0 and the mask removes nothing unless `db_thresh` is negative.

use ndarray::{s, Array2, ArrayView2, Axis, Zip};

/// Value assumed for neighborhood cells outside the grid
pub const BOUNDARY_VALUE: f32 = 0.0;

/// Sliding maximum over `±dist` along `axis`, padding with `BOUNDARY_VALUE`
fn max_along_axis(grid: ArrayView2<f32>, axis: Axis, dist: usize) -> Array2<f32> {
    let mut out = Array2::<f32>::zeros(grid.raw_dim());
    for (src, mut dst) in grid.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        let len = src.len();
        for i in 0..len {
            let lo = i.saturating_sub(dist);
            let hi = (i + dist).min(len - 1);
            let mut max = src
                .slice(s![lo..=hi])
                .fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
            if i < dist || i + dist >= len {
                max = max.max(BOUNDARY_VALUE);
            }
            dst[i] = max;
        }
    }
    out
}

/// Rectangular maximum filter with a constant boundary.
///
/// Rows are frequency bins, columns are time frames. Computed as two 1-D
/// passes since the rectangular maximum is separable.
pub fn maximum_filter(grid: ArrayView2<f32>, dist_freq: usize, dist_time: usize) -> Array2<f32> {
    let along_freq = max_along_axis(grid, Axis(0), dist_freq);
    max_along_axis(along_freq.view(), Axis(1), dist_time)
}

/// Cells equal to their neighborhood maximum where that maximum exceeds `thresh`
pub fn local_peaks(
    grid: ArrayView2<f32>,
    dist_freq: usize,
    dist_time: usize,
    thresh: f32,
) -> Array2<bool> {
    let neighborhood = maximum_filter(grid, dist_freq, dist_time);
    let mut cmap = Array2::from_elem(grid.raw_dim(), false);
    Zip::from(&mut cmap)
        .and(&grid)
        .and(&neighborhood)
        .for_each(|c, &v, &max| *c = v == max && max > thresh);
    cmap
}

/// Clear cells whose |dB| is below `max_db * db_thresh`; returns how many were cleared
pub fn apply_db_mask(cmap: &mut Array2<bool>, decibels: ArrayView2<f32>, db_thresh: f32) -> usize {
    let max_db = decibels.iter().fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let limit = max_db * db_thresh;
    let mut cleared = 0;
    Zip::from(cmap)
        .and(&decibels)
        .for_each(|c, &db| {
            if *c && db.abs() < limit {
                *c = false;
                cleared += 1;
            }
        });
    cleared
}

/// Peak picker producing the boolean constellation grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstellationExtractor {
    pub dist_freq: usize,
    pub dist_time: usize,
    pub thresh: f32,
    pub db_thresh: f32,
}

impl ConstellationExtractor {
    pub fn new(dist_freq: usize, dist_time: usize, thresh: f32, db_thresh: f32) -> Self {
        Self {
            dist_freq,
            dist_time,
            thresh,
            db_thresh,
        }
    }

    /// Build the constellation grid from magnitudes and their dB view
    pub fn extract(&self, magnitudes: ArrayView2<f32>, decibels: ArrayView2<f32>) -> Array2<bool> {
        let mut cmap = local_peaks(magnitudes, self.dist_freq, self.dist_time, self.thresh);
        let accepted = cmap.iter().filter(|&&c| c).count();
        let cleared = apply_db_mask(&mut cmap, decibels, self.db_thresh);

        log::debug!(
            "Constellation: {} local maxima above {}, {} cleared by dB mask (x{})",
            accepted,
            self.thresh,
            cleared,
            self.db_thresh
        );
        cmap
    }
}
