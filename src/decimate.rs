//! Integer-factor decimation of signal and event timelines.
//!
//! Keeps samples `0, k, 2k, …` strictly below `n - 1`: the final raw sample
//! never enters the decimated timeline.  The identical index set is used for
//! the signal and for every per-sample event array (flashing, stimulus code,
//! stimulus type), so a sample index means the same instant in all of them.
//!
//! No anti-alias stage is applied here; the bandpass in [`crate::filter`]
//! runs first and already removes content above the new Nyquist frequency.
use ndarray::{s, Array2, Array3};

use crate::error::{PipelineError, Result};

/// Integer decimation factor for `src_sfreq → dst_sfreq`.
///
/// Fails with [`PipelineError::Configuration`] unless `src_sfreq` is a
/// positive integer multiple of `dst_sfreq`.
pub fn decimation_factor(src_sfreq: f32, dst_sfreq: f32) -> Result<usize> {
    if !(src_sfreq > 0.0 && dst_sfreq > 0.0) {
        return Err(PipelineError::Configuration(format!(
            "sampling rates must be positive (native {src_sfreq} Hz, target {dst_sfreq} Hz)"
        )));
    }
    let ratio = src_sfreq as f64 / dst_sfreq as f64;
    let k = ratio.round();
    if k < 1.0 || (ratio - k).abs() > 1e-6 {
        return Err(PipelineError::Configuration(format!(
            "native rate {src_sfreq} Hz is not an integer multiple of target rate {dst_sfreq} Hz"
        )));
    }
    Ok(k as usize)
}

/// Length of a timeline of `n` samples after decimation by `k`:
/// `ceil((n - 1) / k)`.
pub fn decimated_len(n: usize, k: usize) -> usize {
    n.saturating_sub(1).div_ceil(k)
}

/// Decimate `[trials, samples, channels]` along the sample axis.
pub fn decimate_signal(signal: &Array3<f32>, k: usize) -> Array3<f32> {
    let n = signal.shape()[1];
    if n == 0 {
        return signal.clone();
    }
    signal.slice(s![.., 0..n - 1;k, ..]).to_owned()
}

/// Decimate a `[trials, samples]` event timeline with the same index set as
/// [`decimate_signal`].
pub fn decimate_timeline<T: Clone>(timeline: &Array2<T>, k: usize) -> Array2<T> {
    let n = timeline.ncols();
    if n == 0 {
        return timeline.clone();
    }
    timeline.slice(s![.., 0..n - 1;k]).to_owned()
}
