//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter of the epoch pipeline.
//! All fields have defaults that match the P300 speller recordings the
//! pipeline was built for (BCI Competition III, 64 channels at 240 Hz).
use crate::error::{PipelineError, Result};

/// What to do when a trial contains a stimulus code the character matrix
/// does not define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidCodePolicy {
    /// Abort the offending trial only. Its epochs are discarded and the trial
    /// is listed in [`EpochSet::aborted_trials`](crate::EpochSet::aborted_trials).
    #[default]
    SkipTrial,
    /// Abort the whole extraction with [`PipelineError::InvalidStimulusCode`].
    Fail,
}

/// Configuration for the epoch pipeline.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use p300_epochs::PipelineConfig;
///
/// let cfg = PipelineConfig {
///     target_sfreq: 60.0,     // decimate by 4 instead of 2
///     window_ms:    800.0,    // longer post-stimulus window
///     ..PipelineConfig::default()
/// };
/// assert_eq!(cfg.decimation_factor().unwrap(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ordered channel indices kept from the recording.
    ///
    /// The order is preserved in every output window. Empty lists, duplicates
    /// and indices beyond the recording's channel count are rejected.
    ///
    /// Default: `[10, 33, 48, 50, 52, 55, 59, 61]`
    /// (Fz, Cz, Pz, P3, P4, PO7, PO8, Oz in the 64-channel 10-10 montage).
    pub channels: Vec<usize>,

    /// Sampling rate of the raw recording in Hz.
    ///
    /// The recording's own rate must match this value.
    ///
    /// Default: `240.0` Hz.
    pub native_sfreq: f32,

    /// Sampling rate after decimation in Hz.
    ///
    /// `native_sfreq` must be an integer multiple of this value; the
    /// decimation factor is `round(native_sfreq / target_sfreq)`.
    ///
    /// Default: `120.0` Hz.
    pub target_sfreq: f32,

    /// Lower cutoff of the Butterworth bandpass in Hz.
    ///
    /// Default: `0.1` Hz.
    pub l_freq: f32,

    /// Upper cutoff of the Butterworth bandpass in Hz.
    ///
    /// Must lie below the Nyquist frequency of `native_sfreq`, since
    /// filtering runs before decimation.
    ///
    /// Default: `20.0` Hz.
    pub h_freq: f32,

    /// Order of the Butterworth prototype.
    ///
    /// The bandpass has `2 × order` poles; it is applied forward and backward,
    /// so the effective magnitude response is squared and the phase is zero.
    ///
    /// Default: `4`.
    pub filter_order: usize,

    /// Duration of each post-onset window in milliseconds.
    ///
    /// At the default 650 ms / 120 Hz each epoch has **78 samples**.
    ///
    /// Default: `650.0` ms.
    pub window_ms: f32,

    /// Handling of stimulus codes outside the character matrix.
    ///
    /// Default: [`InvalidCodePolicy::SkipTrial`].
    pub on_invalid_code: InvalidCodePolicy,
}

impl Default for PipelineConfig {
    /// Returns the speller configuration:
    /// 8 channels · 240 → 120 Hz · 0.1–20 Hz order-4 Butterworth · 650 ms windows.
    fn default() -> Self {
        Self {
            channels: vec![10, 33, 48, 50, 52, 55, 59, 61],
            native_sfreq: 240.0,
            target_sfreq: 120.0,
            l_freq: 0.1,
            h_freq: 20.0,
            filter_order: 4,
            window_ms: 650.0,
            on_invalid_code: InvalidCodePolicy::SkipTrial,
        }
    }
}

impl PipelineConfig {
    /// Check every parameter that can be checked without data.
    ///
    /// Channel indices are range-checked later against the recording, in
    /// [`Recording::select_channels`](crate::Recording::select_channels).
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(PipelineError::Configuration("channel subset is empty".into()));
        }
        let mut seen = self.channels.clone();
        seen.sort_unstable();
        if seen.windows(2).any(|w| w[0] == w[1]) {
            return Err(PipelineError::Configuration(format!(
                "channel subset {:?} contains duplicates",
                self.channels
            )));
        }
        self.decimation_factor()?;

        let nyquist = self.native_sfreq / 2.0;
        if !(self.l_freq > 0.0 && self.l_freq < self.h_freq && self.h_freq < nyquist) {
            return Err(PipelineError::Configuration(format!(
                "bandpass {}–{} Hz must satisfy 0 < low < high < {nyquist} Hz",
                self.l_freq, self.h_freq
            )));
        }
        if self.filter_order == 0 {
            return Err(PipelineError::Configuration("filter order must be at least 1".into()));
        }
        if self.window_samples() == 0 {
            return Err(PipelineError::Configuration(format!(
                "window of {} ms is shorter than one sample at {} Hz",
                self.window_ms, self.target_sfreq
            )));
        }
        Ok(())
    }

    /// Integer decimation factor `round(native_sfreq / target_sfreq)`.
    ///
    /// Fails unless `native_sfreq` is a positive integer multiple of
    /// `target_sfreq`.
    ///
    /// # Examples
    ///
    /// ```
    /// use p300_epochs::PipelineConfig;
    /// assert_eq!(PipelineConfig::default().decimation_factor().unwrap(), 2);
    ///
    /// let odd = PipelineConfig { target_sfreq: 100.0, ..PipelineConfig::default() };
    /// assert!(odd.decimation_factor().is_err());
    /// ```
    pub fn decimation_factor(&self) -> Result<usize> {
        crate::decimate::decimation_factor(self.native_sfreq, self.target_sfreq)
    }

    /// Number of samples per window at the target sampling rate.
    ///
    /// Computed as `round(target_sfreq × window_ms / 1000)`.  At the defaults
    /// this returns **78** (= 0.65 s × 120 Hz).
    ///
    /// ```
    /// use p300_epochs::PipelineConfig;
    /// assert_eq!(PipelineConfig::default().window_samples(), 78);
    /// ```
    pub fn window_samples(&self) -> usize {
        crate::epoch::window_samples(self.target_sfreq, self.window_ms)
    }
}
