//! One subject/session of speller data.
//!
//! All per-trial arrays share the same `[trials, samples]` prefix:
//!
//! ```text
//! signal          [trials, samples, channels]  f32   amplitude
//! flashing        [trials, samples]            u8    1 while a stimulus is lit
//! stimulus_code   [trials, samples]            u8    0 = none, 1..=12 row/column
//! stimulus_type   [trials, samples]            u8    1 = target (training data only)
//! target_chars    [trials]                     char  intended selection
//! ```
use ndarray::{Array2, Array3, Axis};

use crate::error::{PipelineError, Result};

/// Raw or conditioned speller recording.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Subject identifier the recording was loaded under.
    pub subject: String,
    pub signal: Array3<f32>,
    pub flashing: Array2<u8>,
    pub stimulus_code: Array2<u8>,
    /// Explicit target flags; absent in test sessions.
    pub stimulus_type: Option<Array2<u8>>,
    pub target_chars: Vec<char>,
    /// Sampling rate of every timeline in Hz.
    pub sfreq: f32,
}

impl Recording {
    /// Assemble a recording, checking that every array agrees on trial and
    /// sample counts.
    pub fn new(
        subject: impl Into<String>,
        signal: Array3<f32>,
        flashing: Array2<u8>,
        stimulus_code: Array2<u8>,
        stimulus_type: Option<Array2<u8>>,
        target_chars: Vec<char>,
        sfreq: f32,
    ) -> Result<Self> {
        let rec = Self {
            subject: subject.into(),
            signal,
            flashing,
            stimulus_code,
            stimulus_type,
            target_chars,
            sfreq,
        };
        rec.check_shapes()?;
        Ok(rec)
    }

    pub fn n_trials(&self) -> usize {
        self.signal.shape()[0]
    }

    pub fn n_samples(&self) -> usize {
        self.signal.shape()[1]
    }

    pub fn n_channels(&self) -> usize {
        self.signal.shape()[2]
    }

    /// Total recorded time in minutes: `trials × samples / (sfreq × 60)`.
    pub fn duration_minutes(&self) -> f64 {
        (self.n_trials() * self.n_samples()) as f64 / (self.sfreq as f64 * 60.0)
    }

    /// The spelled word, one character per trial.
    pub fn spelled_word(&self) -> String {
        self.target_chars.iter().collect()
    }

    /// Keep only `channels`, in the given order.
    pub fn select_channels(mut self, channels: &[usize]) -> Result<Self> {
        let n_ch = self.n_channels();
        if channels.is_empty() {
            return Err(PipelineError::Configuration("channel subset is empty".into()));
        }
        if let Some(&bad) = channels.iter().find(|&&c| c >= n_ch) {
            return Err(PipelineError::Configuration(format!(
                "channel index {bad} out of range for a {n_ch}-channel recording"
            )));
        }
        self.signal = self.signal.select(Axis(2), channels);
        Ok(self)
    }

    pub(crate) fn check_shapes(&self) -> Result<()> {
        let (n_trials, n_samples) = (self.n_trials(), self.n_samples());
        let expect = [n_trials, n_samples];

        let timelines = [
            ("flashing", Some(&self.flashing)),
            ("stimulus_code", Some(&self.stimulus_code)),
            ("stimulus_type", self.stimulus_type.as_ref()),
        ];
        for (name, arr) in timelines {
            if let Some(arr) = arr {
                if arr.shape() != &expect[..] {
                    return Err(PipelineError::InvalidRecording(format!(
                        "{name} has shape {:?}, signal implies {expect:?}",
                        arr.shape()
                    )));
                }
            }
        }
        if self.target_chars.len() != n_trials {
            return Err(PipelineError::InvalidRecording(format!(
                "{} target characters for {n_trials} trials",
                self.target_chars.len()
            )));
        }
        if !(self.sfreq > 0.0) {
            return Err(PipelineError::InvalidRecording(format!(
                "sampling rate must be positive, got {}",
                self.sfreq
            )));
        }
        Ok(())
    }
}
