//! Dataset summary for reporting.
use std::fmt;

use crate::balance::Balance;
use crate::epoch::{AbortedTrial, EpochSet};

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub subject: String,
    pub native_sfreq: f32,
    pub target_sfreq: f32,
    pub duration_minutes: f64,
    pub trials: usize,
    pub spelled_word: String,
    pub samples_before: usize,
    pub samples_after: usize,
    pub window_samples: usize,
    pub n_channels: usize,
    pub epochs: usize,
    pub positive: usize,
    pub negative: usize,
    pub dropped: usize,
    pub dropped_positive: usize,
    pub unlabeled: usize,
    pub aborted_trials: Vec<AbortedTrial>,
    pub class_ratio: f64,
}

impl DatasetSummary {
    pub(crate) fn new(
        raw: RawStats,
        target_sfreq: f32,
        samples_after: usize,
        set: &EpochSet,
        balance: &Balance,
    ) -> Self {
        Self {
            subject: raw.subject,
            native_sfreq: raw.sfreq,
            target_sfreq,
            duration_minutes: raw.duration_minutes,
            trials: raw.trials,
            spelled_word: raw.spelled_word,
            samples_before: raw.samples,
            samples_after,
            window_samples: set.window_samples(),
            n_channels: set.n_channels(),
            epochs: set.len(),
            positive: set.positive_count(),
            negative: set.negative_count(),
            dropped: set.dropped(),
            dropped_positive: set.dropped_positive(),
            unlabeled: set.unlabeled(),
            aborted_trials: set.aborted_trials().to_vec(),
            class_ratio: balance.class_ratio,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let aborted: Vec<_> = self
            .aborted_trials
            .iter()
            .map(|a| serde_json::json!({ "trial": a.trial, "code": a.code }))
            .collect();
        serde_json::json!({
            "subject": self.subject,
            "native_sfreq": self.native_sfreq,
            "target_sfreq": self.target_sfreq,
            "duration_minutes": self.duration_minutes,
            "trials": self.trials,
            "spelled_word": self.spelled_word,
            "samples_before": self.samples_before,
            "samples_after": self.samples_after,
            "window_samples": self.window_samples,
            "n_channels": self.n_channels,
            "epochs": self.epochs,
            "positive": self.positive,
            "negative": self.negative,
            "dropped": self.dropped,
            "dropped_positive": self.dropped_positive,
            "unlabeled": self.unlabeled,
            "aborted_trials": aborted,
            "class_ratio": self.class_ratio,
        })
    }
}

/// Facts about the raw recording captured before conditioning consumes it.
#[derive(Debug, Clone)]
pub(crate) struct RawStats {
    pub subject: String,
    pub sfreq: f32,
    pub duration_minutes: f64,
    pub trials: usize,
    pub samples: usize,
    pub spelled_word: String,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "subject {}", self.subject)?;
        writeln!(f, "  sampling frequency   {} Hz → {} Hz", self.native_sfreq, self.target_sfreq)?;
        writeln!(f, "  session duration     {:.2} min", self.duration_minutes)?;
        writeln!(f, "  letters              {}", self.trials)?;
        writeln!(f, "  spelled word         {}", self.spelled_word)?;
        writeln!(f, "  samples per trial    {} → {}", self.samples_before, self.samples_after)?;
        writeln!(
            f,
            "  epochs               {} × [{} × {}]",
            self.epochs, self.window_samples, self.n_channels
        )?;
        writeln!(f, "  target / non-target  {} / {}", self.positive, self.negative)?;
        writeln!(
            f,
            "  dropped / unlabeled  {} ({} target) / {}",
            self.dropped, self.dropped_positive, self.unlabeled
        )?;
        if !self.aborted_trials.is_empty() {
            let list: Vec<String> = self
                .aborted_trials
                .iter()
                .map(|a| format!("{} (code {})", a.trial, a.code))
                .collect();
            writeln!(f, "  aborted trials       {}", list.join(", "))?;
        }
        write!(f, "  class ratio          {:.4}", self.class_ratio)
    }
}
