//! Signal conditioning: channel selection, bandpass, decimation.
//!
//! ```text
//! Recording @ native_sfreq, all channels
//!   ├─ select_channels        keep cfg.channels, in order
//!   ├─ Butterworth bandpass   order-N, l_freq–h_freq, forward-backward, per trial
//!   └─ decimate ×k            signal, flashing, stimulus_code, stimulus_type
//!        │
//!        └─→ Recording @ target_sfreq
//! ```
//!
//! The raw recording is consumed; nothing downstream needs the unfiltered
//! samples.
use ndarray::parallel::prelude::*;
use ndarray::Axis;

use crate::config::PipelineConfig;
use crate::decimate::{decimate_signal, decimate_timeline};
use crate::error::{PipelineError, Result};
use crate::filter::{design_bandpass, filtfilt_trial_inplace, min_filter_len};
use crate::recording::Recording;

/// Condition `recording` according to `cfg`.
///
/// # Errors
///
/// [`PipelineError::Configuration`] if the configuration is invalid, the
/// recording's rate differs from `cfg.native_sfreq`, a channel index is out
/// of range, or trials are too short for the zero-phase filter.
pub fn condition(recording: Recording, cfg: &PipelineConfig) -> Result<Recording> {
    cfg.validate()?;
    recording.check_shapes()?;
    if (recording.sfreq - cfg.native_sfreq).abs() > 1e-3 {
        return Err(PipelineError::Configuration(format!(
            "recording is sampled at {} Hz, configuration expects {} Hz",
            recording.sfreq, cfg.native_sfreq
        )));
    }
    let k = cfg.decimation_factor()?;

    let mut rec = recording.select_channels(&cfg.channels)?;

    let sos = design_bandpass(cfg.l_freq, cfg.h_freq, cfg.native_sfreq, cfg.filter_order)?;
    let min_len = min_filter_len(&sos);
    if rec.n_samples() < min_len {
        return Err(PipelineError::Configuration(format!(
            "trials have {} samples, the order-{} bandpass needs at least {min_len}",
            rec.n_samples(),
            cfg.filter_order
        )));
    }

    // Trials share no filter state, so they run in parallel.
    rec.signal
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|trial| filtfilt_trial_inplace(trial, &sos));

    let n_before = rec.n_samples();
    rec.signal = decimate_signal(&rec.signal, k);
    rec.flashing = decimate_timeline(&rec.flashing, k);
    rec.stimulus_code = decimate_timeline(&rec.stimulus_code, k);
    rec.stimulus_type = rec.stimulus_type.as_ref().map(|t| decimate_timeline(t, k));
    rec.sfreq = cfg.target_sfreq;

    log::info!(
        "conditioned {} trials × {} channels: {} → {} samples per trial ({} → {} Hz)",
        rec.n_trials(),
        rec.n_channels(),
        n_before,
        rec.n_samples(),
        cfg.native_sfreq,
        cfg.target_sfreq
    );
    Ok(rec)
}
