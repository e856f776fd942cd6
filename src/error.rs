//! Error taxonomy for the epoch pipeline.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Rate mismatch, invalid channel subset, bad filter band and the like.
    /// Raised before any sample is processed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Per-trial arrays of a recording disagree in shape.
    #[error("invalid recording: {0}")]
    InvalidRecording(String),

    #[error("invalid stimulus code {code} (matrix defines codes 1..={groups})")]
    InvalidStimulusCode { code: u8, groups: usize },

    /// One of the classes is empty, so ratio and weights are undefined.
    #[error("degenerate dataset: {positive} target and {negative} non-target epochs")]
    DegenerateDataset { positive: usize, negative: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
