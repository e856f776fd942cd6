//! Zero-phase IIR application.
//!
//! Matches `scipy.signal.sosfiltfilt(sos, x, axis=0)`:
//! the signal is extended by odd reflection, filtered forward with the
//! steady-state initial conditions, then filtered backward, so the
//! magnitude response is squared and the phase response cancels.
//!
//! Every call starts from fresh filter state: nothing carries over between
//! channels or between trials.
use ndarray::{ArrayViewMut2, Axis};
use sci_rs::signal::filter::{design::Sos, sosfiltfilt_dyn};

/// Shortest signal the forward-backward pass accepts for `sos`.
///
/// The odd extension needs `3 × (2 × n_sections + 1)` samples on each side,
/// taken from the interior of the signal, so the signal must be longer than
/// that.
pub fn min_filter_len(sos: &[Sos<f64>]) -> usize {
    3 * (2 * sos.len() + 1) + 1
}

/// Filter a single 1-D signal forward and backward.
///
/// Returns a vector of the same length as `x`.  The caller guarantees
/// `x.len() >= min_filter_len(sos)`.
pub fn filtfilt_1d(x: &[f32], sos: &[Sos<f64>]) -> Vec<f32> {
    if x.is_empty() {
        return vec![];
    }
    let y: Vec<f64> = sosfiltfilt_dyn(x.iter().map(|&v| v as f64), sos);
    y.into_iter().map(|v| v as f32).collect()
}

/// Apply `sos` zero-phase to every channel of one trial (`[T, C]`) in place.
pub fn filtfilt_trial_inplace(mut trial: ArrayViewMut2<f32>, sos: &[Sos<f64>]) {
    for mut column in trial.axis_iter_mut(Axis(1)) {
        let x: Vec<f32> = column.to_vec();
        let y = filtfilt_1d(&x, sos);
        column.iter_mut().zip(y).for_each(|(dst, v)| *dst = v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::design::design_bandpass;
    use std::f32::consts::PI;

    const FS: f32 = 240.0;

    fn sine(freq: f32, n: usize) -> Vec<f32> {
        (0..n).map(|i| (2.0 * PI * freq * i as f32 / FS).sin()).collect()
    }

    #[test]
    fn filter_preserves_length() {
        let sos = design_bandpass(0.1, 20.0, FS, 4).unwrap();
        let x = sine(5.0, 1000);
        assert_eq!(filtfilt_1d(&x, &sos).len(), x.len());
    }

    #[test]
    fn min_len_for_order_4() {
        let sos = design_bandpass(0.1, 20.0, FS, 4).unwrap();
        assert_eq!(min_filter_len(&sos), 28);
    }

    #[test]
    fn trial_columns_filtered_independently() {
        let sos = design_bandpass(0.1, 20.0, FS, 4).unwrap();
        let n = 2400;
        let a = sine(5.0, n);
        let b = sine(12.0, n);
        let mut trial = ndarray::Array2::from_shape_fn((n, 2), |(t, c)| if c == 0 { a[t] } else { b[t] });
        filtfilt_trial_inplace(trial.view_mut(), &sos);

        let fa = filtfilt_1d(&a, &sos);
        let fb = filtfilt_1d(&b, &sos);
        for t in 0..n {
            assert_eq!(trial[[t, 0]], fa[t]);
            assert_eq!(trial[[t, 1]], fb[t]);
        }
    }
}
