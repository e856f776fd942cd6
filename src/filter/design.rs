//! Butterworth bandpass design.
//!
//! The prototype is designed by `sci-rs`, which follows `scipy.signal.butter`:
//!   • analog Butterworth prototype of order N
//!   • lowpass → bandpass transform (2N poles)
//!   • bilinear transform with pre-warping at the sampling rate `fs`
//!   • pole/zero pairing into N second-order sections
use sci_rs::signal::filter::design::*;

use crate::error::{PipelineError, Result};

/// Design a digital Butterworth bandpass as second-order sections.
///
/// Cutoffs are in Hz and refer to `sfreq`, the rate of the signal the
/// filter will be applied to.
pub fn design_bandpass(l_freq: f32, h_freq: f32, sfreq: f32, order: usize) -> Result<Vec<Sos<f64>>> {
    let nyquist = sfreq as f64 / 2.0;
    let (lo, hi) = (l_freq as f64, h_freq as f64);
    if order == 0 || !(lo > 0.0 && lo < hi && hi < nyquist) {
        return Err(PipelineError::Configuration(format!(
            "cannot design order-{order} bandpass {l_freq}–{h_freq} Hz at {sfreq} Hz"
        )));
    }

    let filter = butter_dyn(
        order,
        [lo, hi].to_vec(),
        Some(FilterBandType::Bandpass),
        Some(false),
        Some(FilterOutputType::Sos),
        Some(sfreq as f64),
    );
    let DigitalFilter::Sos(SosFormatFilter { sos }) = filter else {
        return Err(PipelineError::Configuration(
            "Butterworth designer did not return second-order sections".into(),
        ));
    };
    Ok(sos)
}
