//! Onset-locked epoch extraction.
//!
//! For every flash onset `i` of a trial the window `[i, i + W)` is cut from
//! the conditioned signal (`[T, C]` per trial) and paired with the label and
//! stimulus code of sample `i`.  Windows that would run past the end of the
//! trial are dropped and counted, as are onsets with no active stimulus.
//!
//! Trials are extracted independently and committed to the [`EpochSet`] in
//! trial order, onset order within a trial.
use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, Axis};

use crate::config::InvalidCodePolicy;
use crate::error::{PipelineError, Result};
use crate::label::{Label, LabelSource};
use crate::onset::onsets;
use crate::recording::Recording;

/// Window length in samples: `round(sfreq × window_ms / 1000)`.
pub fn window_samples(sfreq: f32, window_ms: f32) -> usize {
    (sfreq as f64 * window_ms as f64 / 1000.0).round() as usize
}

/// One onset-locked window.
#[derive(Debug, Clone, PartialEq)]
pub struct Epoch {
    /// `[W, C]` samples × channels.
    pub data: Array2<f32>,
    pub label: Label,
    /// Row/column code flashed at the onset sample.
    pub stimulus_code: u8,
    pub trial: usize,
    /// Onset sample index within the (conditioned) trial.
    pub onset: usize,
}

/// Per-trial bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialCounts {
    pub onsets: usize,
    pub dropped_positive: usize,
    pub dropped_negative: usize,
    /// Onsets with stimulus code 0, which carry no label.
    pub unlabeled: usize,
}

impl TrialCounts {
    pub fn dropped(&self) -> usize {
        self.dropped_positive + self.dropped_negative
    }
}

/// A trial whose labeling pass hit a stimulus code the matrix does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortedTrial {
    pub trial: usize,
    pub code: u8,
}

/// Ordered epochs of one dataset partition plus class and drop counters.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSet {
    pub(crate) epochs: Vec<Epoch>,
    window_samples: usize,
    n_channels: usize,
    positive_count: usize,
    negative_count: usize,
    pub(crate) dropped_positive: usize,
    pub(crate) dropped_negative: usize,
    pub(crate) unlabeled: usize,
    pub(crate) aborted_trials: Vec<AbortedTrial>,
}

impl EpochSet {
    pub fn new(window_samples: usize, n_channels: usize) -> Self {
        Self {
            epochs: Vec::new(),
            window_samples,
            n_channels,
            positive_count: 0,
            negative_count: 0,
            dropped_positive: 0,
            dropped_negative: 0,
            unlabeled: 0,
            aborted_trials: Vec::new(),
        }
    }

    /// Append one epoch, updating the class counts.
    pub fn push(&mut self, epoch: Epoch) -> Result<()> {
        if epoch.data.dim() != (self.window_samples, self.n_channels) {
            return Err(PipelineError::InvalidRecording(format!(
                "epoch shape {:?} does not match set shape ({}, {})",
                epoch.data.dim(),
                self.window_samples,
                self.n_channels
            )));
        }
        match epoch.label {
            Label::Target => self.positive_count += 1,
            Label::NonTarget => self.negative_count += 1,
        }
        self.epochs.push(epoch);
        Ok(())
    }

    fn commit_trial(&mut self, epochs: Vec<Epoch>, counts: TrialCounts) -> Result<()> {
        for e in epochs {
            self.push(e)?;
        }
        self.dropped_positive += counts.dropped_positive;
        self.dropped_negative += counts.dropped_negative;
        self.unlabeled += counts.unlabeled;
        Ok(())
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn window_samples(&self) -> usize {
        self.window_samples
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn positive_count(&self) -> usize {
        self.positive_count
    }

    pub fn negative_count(&self) -> usize {
        self.negative_count
    }

    /// Onsets dropped because their window ran past the end of the trial.
    pub fn dropped(&self) -> usize {
        self.dropped_positive + self.dropped_negative
    }

    pub fn dropped_positive(&self) -> usize {
        self.dropped_positive
    }

    pub fn dropped_negative(&self) -> usize {
        self.dropped_negative
    }

    pub fn unlabeled(&self) -> usize {
        self.unlabeled
    }

    pub fn aborted_trials(&self) -> &[AbortedTrial] {
        &self.aborted_trials
    }

    /// All windows stacked as `[E, W, C]`.
    pub fn windows(&self) -> Array3<f32> {
        let mut out = Array3::zeros((self.len(), self.window_samples, self.n_channels));
        for (mut dst, e) in out.axis_iter_mut(Axis(0)).zip(&self.epochs) {
            dst.assign(&e.data);
        }
        out
    }

    /// Labels as `0`/`1`, in epoch order.
    pub fn labels(&self) -> Array1<u8> {
        self.epochs.iter().map(|e| e.label.as_u8()).collect()
    }

    /// Stimulus codes at each onset, in epoch order.
    pub fn stimulus_codes(&self) -> Array1<u8> {
        self.epochs.iter().map(|e| e.stimulus_code).collect()
    }
}

/// Extract all epochs of one trial.
///
/// * `signal`        – conditioned trial, shape `[T, C]`.
/// * `flashing`      – flash indicator of the trial, length `T`.
/// * `stimulus_code` – stimulus codes of the trial, length `T`.
///
/// Either the whole trial succeeds or nothing of it is returned: a label
/// error aborts the trial.
pub fn extract_trial(
    trial: usize,
    signal: ArrayView2<f32>,
    flashing: &[u8],
    stimulus_code: ArrayView1<u8>,
    labels: &dyn LabelSource,
    window: usize,
) -> Result<(Vec<Epoch>, TrialCounts)> {
    let n_t = signal.nrows();
    let mut epochs = Vec::new();
    let mut counts = TrialCounts::default();

    for onset in onsets(flashing) {
        counts.onsets += 1;
        let label = match labels.label_for(trial, onset) {
            Ok(Some(label)) => label,
            Ok(None) => {
                counts.unlabeled += 1;
                continue;
            }
            Err(e) => {
                log::error!("trial {trial}: labeling failed at sample {onset}: {e}");
                return Err(e);
            }
        };

        if onset + window > n_t {
            match label {
                Label::Target => counts.dropped_positive += 1,
                Label::NonTarget => counts.dropped_negative += 1,
            }
            continue;
        }

        epochs.push(Epoch {
            data: signal.slice(s![onset..onset + window, ..]).to_owned(),
            label,
            stimulus_code: stimulus_code[onset],
            trial,
            onset,
        });
    }

    log::debug!(
        "trial {trial}: {} onsets, {} epochs, {} dropped, {} unlabeled",
        counts.onsets,
        epochs.len(),
        counts.dropped(),
        counts.unlabeled
    );
    if counts.dropped() > 0 {
        log::warn!(
            "trial {trial}: {} epoch(s) dropped, window of {window} samples exceeds trial end ({n_t})",
            counts.dropped()
        );
    }
    Ok((epochs, counts))
}

/// Extract epochs from every trial of a conditioned recording.
///
/// The window length is `round(recording.sfreq × window_ms / 1000)`.
pub fn extract(
    recording: &Recording,
    labels: &dyn LabelSource,
    window_ms: f32,
    policy: InvalidCodePolicy,
) -> Result<EpochSet> {
    let window = window_samples(recording.sfreq, window_ms);
    if window == 0 {
        return Err(PipelineError::Configuration(format!(
            "window of {window_ms} ms is shorter than one sample at {} Hz",
            recording.sfreq
        )));
    }

    let mut set = EpochSet::new(window, recording.n_channels());
    for trial in 0..recording.n_trials() {
        let flashing = recording.flashing.row(trial).to_vec();
        let result = extract_trial(
            trial,
            recording.signal.index_axis(Axis(0), trial),
            &flashing,
            recording.stimulus_code.row(trial),
            labels,
            window,
        );
        match result {
            Ok((epochs, counts)) => set.commit_trial(epochs, counts)?,
            Err(PipelineError::InvalidStimulusCode { code, .. })
                if policy == InvalidCodePolicy::SkipTrial =>
            {
                log::error!("trial {trial}: aborted, stimulus code {code} is not in the matrix");
                set.aborted_trials.push(AbortedTrial { trial, code });
            }
            Err(e) => return Err(e),
        }
    }

    log::info!(
        "extracted {} epochs ({} target / {} non-target), {} dropped, {} unlabeled",
        set.len(),
        set.positive_count(),
        set.negative_count(),
        set.dropped(),
        set.unlabeled()
    );
    Ok(set)
}
