//! Weighted evaluation of externally produced predictions.
//!
//! Sample weights from [`compute_balance`](crate::compute_balance) make
//! both classes count equally.  The confusion matrix is divided by the
//! number of epochs, so its four cells sum to 2 when the balance weights
//! are used.
use crate::error::{PipelineError, Result};
use crate::label::Label;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightedConfusion {
    pub tn: f64,
    pub fp: f64,
    pub fn_: f64,
    pub tp: f64,
}

impl WeightedConfusion {
    pub fn from_predictions(truth: &[Label], predicted: &[Label], weights: &[f64]) -> Result<Self> {
        if truth.len() != predicted.len() || truth.len() != weights.len() {
            return Err(PipelineError::InvalidRecording(format!(
                "{} labels, {} predictions and {} weights",
                truth.len(),
                predicted.len(),
                weights.len()
            )));
        }
        let mut m = Self::default();
        for ((&t, &p), &w) in truth.iter().zip(predicted).zip(weights) {
            match (t, p) {
                (Label::NonTarget, Label::NonTarget) => m.tn += w,
                (Label::NonTarget, Label::Target) => m.fp += w,
                (Label::Target, Label::NonTarget) => m.fn_ += w,
                (Label::Target, Label::Target) => m.tp += w,
            }
        }
        let n = truth.len().max(1) as f64;
        m.tn /= n;
        m.fp /= n;
        m.fn_ /= n;
        m.tp /= n;
        Ok(m)
    }

    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.tp + self.tn, self.tp + self.tn + self.fp + self.fn_)
    }

    pub fn sensitivity(&self) -> Option<f64> {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn specificity(&self) -> Option<f64> {
        ratio(self.tn, self.tn + self.fp)
    }

    /// Positive predictive value.
    pub fn ppv(&self) -> Option<f64> {
        ratio(self.tp, self.tp + self.fp)
    }

    /// Negative predictive value.
    pub fn npv(&self) -> Option<f64> {
        ratio(self.tn, self.tn + self.fn_)
    }
}

fn ratio(num: f64, den: f64) -> Option<f64> {
    (den > 0.0).then(|| num / den)
}
