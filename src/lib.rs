//! # p300-epochs: P300 speller epoch extraction in pure Rust
//!
//! `p300-epochs` turns raw multi-channel recordings from a row/column P300
//! speller into labeled, normalised, onset-locked windows ready for
//! classifier training and weighted evaluation.
//!
//! ## Pipeline overview
//!
//! ```text
//! recording.safetensors
//!   │
//!   ├─ io::load_recording()       signal [trials, samples, channels] + event timelines
//!   ├─ select_channels            8 of 64 channels (Fz Cz Pz P3 P4 PO7 PO8 Oz)
//!   ├─ filter (Butterworth BP)    order 4, 0.1–20 Hz, forward-backward, per trial
//!   ├─ decimate                   every k-th sample, 240 → 120 Hz, all timelines alike
//!   ├─ onset                      sample 0 + rising edges of `flashing`
//!   ├─ label                      stimulus_type flags, or target char ∈ row/column group
//!   ├─ epoch                      [onset, onset + 78) per onset, trailing ones dropped
//!   ├─ normalize (z-score)        per epoch, per channel, ddof = 0
//!   └─ balance                    class ratio N/P + per-example weights
//!        │
//!        └─→ Dataset { epochs [E, 78, 8], labels, stimulus codes, ratio, weights, summary }
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use p300_epochs::{preprocess, CharacterMatrix, PipelineConfig};
//! use p300_epochs::io::load_recording;
//! use std::path::Path;
//!
//! let recording = load_recording(Path::new("data/Subject_A_Train.safetensors")).unwrap();
//! let cfg = PipelineConfig::default();
//! let matrix = CharacterMatrix::default();
//!
//! let dataset = preprocess(recording, &cfg, &matrix).unwrap();
//! println!("{}", dataset.summary);
//! let windows = dataset.epochs.windows();            // [E, 78, 8]
//! let weights = &dataset.balance.weights;            // [E]
//! # let _ = (windows, weights);
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use p300_epochs::{condition, extract, label_source, normalize_epochs, compute_balance};
//! use p300_epochs::{CharacterMatrix, PipelineConfig};
//! # let recording: p300_epochs::Recording = unimplemented!();
//!
//! let cfg = PipelineConfig::default();
//! let matrix = CharacterMatrix::default();
//!
//! let rec = condition(recording, &cfg).unwrap();               // 120 Hz, 8 channels
//! let labels = label_source(&rec, &matrix);
//! let set = extract(&rec, labels.as_ref(), cfg.window_ms, cfg.on_invalid_code).unwrap();
//! let set = normalize_epochs(set);
//! let balance = compute_balance(&set).unwrap();
//! ```

pub mod balance;
pub mod condition;
pub mod config;
pub mod decimate;
pub mod epoch;
pub mod error;
pub mod filter;
pub mod io;
pub mod label;
pub mod matrix;
pub mod metrics;
pub mod normalize;
pub mod onset;
pub mod recording;
pub mod summary;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use balance::{compute_balance, Balance};
pub use condition::condition;
pub use config::{InvalidCodePolicy, PipelineConfig};
pub use decimate::{decimate_signal, decimate_timeline, decimated_len, decimation_factor};
pub use epoch::{extract, extract_trial, window_samples, AbortedTrial, Epoch, EpochSet, TrialCounts};
pub use error::{PipelineError, Result};
pub use filter::{design_bandpass, filtfilt_1d, filtfilt_trial_inplace, min_filter_len};
pub use label::{label_source, resolve_label, ExplicitLabels, Label, LabelSource, MatrixLabels};
pub use matrix::CharacterMatrix;
pub use metrics::WeightedConfusion;
pub use normalize::{normalize_epochs, zscore_epoch, zscore_epoch_inplace};
pub use onset::{onsets, Onsets};
pub use recording::Recording;
pub use summary::DatasetSummary;

/// Output of the full pipeline for one dataset partition.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Normalised epochs in trial/onset order.
    pub epochs: EpochSet,
    pub balance: Balance,
    pub summary: DatasetSummary,
}

/// Run the **full epoch pipeline** on one recording.
///
/// # Pipeline steps
///
/// 1. Validate `cfg` and the recording's shapes and sampling rate.
/// 2. Keep [`PipelineConfig::channels`], in order.
/// 3. Zero-phase Butterworth bandpass per trial at the native rate.
/// 4. Decimate signal and event timelines by the same integer factor.
/// 5. Choose the label source once: explicit flags if present, otherwise the
///    character matrix.
/// 6. Cut one window per flash onset; drop and count incomplete ones.
/// 7. Z-score every window per channel.
/// 8. Compute class ratio and per-example weights.
///
/// # Errors
///
/// * [`PipelineError::Configuration`] / [`PipelineError::InvalidRecording`]
///   before any processing.
/// * [`PipelineError::InvalidStimulusCode`] under [`InvalidCodePolicy::Fail`].
/// * [`PipelineError::DegenerateDataset`] if a class ends up empty.
pub fn preprocess(
    recording: Recording,
    cfg: &PipelineConfig,
    matrix: &CharacterMatrix,
) -> Result<Dataset> {
    cfg.validate()?;
    let raw = summary::RawStats {
        subject: recording.subject.clone(),
        sfreq: recording.sfreq,
        duration_minutes: recording.duration_minutes(),
        trials: recording.n_trials(),
        samples: recording.n_samples(),
        spelled_word: recording.spelled_word(),
    };

    // 1–4. Channel selection, bandpass, decimation.
    let rec = condition(recording, cfg)?;

    // 5–6. Labels + windows.
    let labels = label_source(&rec, matrix);
    let set = extract(&rec, labels.as_ref(), cfg.window_ms, cfg.on_invalid_code)?;

    // 7. Per-epoch z-score.
    let set = normalize_epochs(set);

    // 8. Class balance.
    let balance = compute_balance(&set)?;

    let summary = DatasetSummary::new(raw, cfg.target_sfreq, rec.n_samples(), &set, &balance);
    Ok(Dataset { epochs: set, balance, summary })
}
