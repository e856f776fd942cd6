//! Per-epoch, per-channel z-score normalisation.
//!
//! `zscore_epoch_inplace` matches `sklearn.preprocessing.scale(epoch, axis=0)`:
//!   for each channel c:  μ = mean(epoch[:, c]),  σ = std(epoch[:, c]) (ddof=0)
//!   epoch[:, c] = (epoch[:, c] - μ) / σ
//!
//! Zero-variance channels are only centred (σ is treated as 1), so a flat
//! channel comes out as all zeros instead of NaN.
//!
//! No statistics are shared between epochs.
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Axis};
use rayon::prelude::*;

use crate::epoch::EpochSet;

/// Z-score every channel (column) of a `[W, C]` window in place.
/// Returns the per-channel `(mean, std)` used.
pub fn zscore_epoch_inplace(mut epoch: ArrayViewMut2<f32>) -> Vec<(f32, f32)> {
    let mut stats = Vec::with_capacity(epoch.ncols());
    for mut col in epoch.axis_iter_mut(Axis(1)) {
        let n = col.len() as f64;
        if n == 0.0 {
            stats.push((0.0, 0.0));
            continue;
        }
        let mean = col.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var = col
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std = var.sqrt();

        let scale = if std > 0.0 { std } else { 1.0 };
        col.mapv_inplace(|v| ((v as f64 - mean) / scale) as f32);
        stats.push((mean as f32, std as f32));
    }
    stats
}

/// Z-scored copy of a `[W, C]` window.
pub fn zscore_epoch(epoch: ArrayView2<f32>) -> Array2<f32> {
    let mut out = epoch.to_owned();
    zscore_epoch_inplace(out.view_mut());
    out
}

/// Normalise every epoch of the set independently.
pub fn normalize_epochs(mut set: EpochSet) -> EpochSet {
    set.epochs.par_iter_mut().for_each(|e| {
        zscore_epoch_inplace(e.data.view_mut());
    });
    set
}
