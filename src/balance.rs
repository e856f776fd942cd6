//! Class-imbalance accounting.
//!
//! A speller session has 2 target flashes out of every 12, so non-target
//! epochs outnumber targets 5 : 1.  Two quantities counter this downstream:
//!
//! * `class_ratio = N / P`: loss weight of the target class during training.
//! * `weights[j] = (P + N) / P` for targets, `(P + N) / N` otherwise: sample
//!   weights for evaluation metrics.  Both classes then carry the same total
//!   weight `P + N`, so `Σ weights = 2 (P + N)`.
use ndarray::Array1;

use crate::epoch::EpochSet;
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Balance {
    pub positive: usize,
    pub negative: usize,
    /// `negative / positive`.
    pub class_ratio: f64,
    /// One weight per epoch, in epoch order.
    pub weights: Array1<f64>,
}

/// Class ratio and per-example weights of `set`.
///
/// Fails with [`PipelineError::DegenerateDataset`] when either class is empty.
pub fn compute_balance(set: &EpochSet) -> Result<Balance> {
    let (p, n) = (set.positive_count(), set.negative_count());
    if p == 0 || n == 0 {
        return Err(PipelineError::DegenerateDataset { positive: p, negative: n });
    }
    let total = (p + n) as f64;
    let w_pos = total / p as f64;
    let w_neg = total / n as f64;
    let weights = set
        .epochs()
        .iter()
        .map(|e| if e.label.is_target() { w_pos } else { w_neg })
        .collect();

    let class_ratio = n as f64 / p as f64;
    log::info!("balance: {p} target / {n} non-target, class ratio {class_ratio:.3}");
    Ok(Balance { positive: p, negative: n, class_ratio, weights })
}
