//! Target / non-target labels per sample.
//!
//! Two sources implement [`LabelSource`]:
//!
//! * [`ExplicitLabels`] reads recorded `stimulus_type` flags (training
//!   sessions).
//! * [`MatrixLabels`] reconstructs the flag from the trial's target
//!   character and the active stimulus code (test sessions, where the flags
//!   were not released).
//!
//! Both return `None` wherever the stimulus code is 0, so they agree on
//! every sample of a recording that carries both kinds of information.
use ndarray::ArrayView2;

use crate::error::Result;
use crate::matrix::CharacterMatrix;
use crate::recording::Recording;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    NonTarget,
    Target,
}

impl Label {
    /// Interpret a recorded `stimulus_type` flag.
    pub fn from_flag(flag: u8) -> Self {
        if flag != 0 { Label::Target } else { Label::NonTarget }
    }

    /// `1` for target, `0` for non-target.
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Target => 1,
            Label::NonTarget => 0,
        }
    }

    pub fn is_target(self) -> bool {
        self == Label::Target
    }
}

/// Label of a sample whose active stimulus is `code`, for a trial spelling
/// `target`.
///
/// Returns `Ok(None)` for `code == 0` (nothing is lit) and
/// [`InvalidStimulusCode`](crate::PipelineError::InvalidStimulusCode) for a
/// code the matrix does not define.
///
/// ```
/// use p300_epochs::{resolve_label, CharacterMatrix, Label};
/// let m = CharacterMatrix::default();
/// assert_eq!(resolve_label('C', 3, &m).unwrap(), Some(Label::Target));    // column 3
/// assert_eq!(resolve_label('C', 9, &m).unwrap(), Some(Label::NonTarget)); // row 3
/// assert_eq!(resolve_label('C', 0, &m).unwrap(), None);
/// ```
pub fn resolve_label(target: char, code: u8, matrix: &CharacterMatrix) -> Result<Option<Label>> {
    if code == 0 {
        return Ok(None);
    }
    let group = matrix.group(code)?;
    Ok(Some(if group.contains(&target) { Label::Target } else { Label::NonTarget }))
}

/// Per-sample label lookup over a whole recording.
pub trait LabelSource: Sync {
    /// Label of `(trial, sample)`, or `None` when no stimulus is active.
    fn label_for(&self, trial: usize, sample: usize) -> Result<Option<Label>>;
}

/// Labels taken from recorded `stimulus_type` flags.
#[derive(Debug, Clone, Copy)]
pub struct ExplicitLabels<'a> {
    stimulus_type: ArrayView2<'a, u8>,
    stimulus_code: ArrayView2<'a, u8>,
}

impl<'a> ExplicitLabels<'a> {
    pub fn new(stimulus_type: ArrayView2<'a, u8>, stimulus_code: ArrayView2<'a, u8>) -> Self {
        Self { stimulus_type, stimulus_code }
    }
}

impl LabelSource for ExplicitLabels<'_> {
    fn label_for(&self, trial: usize, sample: usize) -> Result<Option<Label>> {
        if self.stimulus_code[[trial, sample]] == 0 {
            return Ok(None);
        }
        Ok(Some(Label::from_flag(self.stimulus_type[[trial, sample]])))
    }
}

/// Labels reconstructed from target characters and the character matrix.
#[derive(Debug, Clone, Copy)]
pub struct MatrixLabels<'a> {
    target_chars: &'a [char],
    stimulus_code: ArrayView2<'a, u8>,
    matrix: &'a CharacterMatrix,
}

impl<'a> MatrixLabels<'a> {
    pub fn new(
        target_chars: &'a [char],
        stimulus_code: ArrayView2<'a, u8>,
        matrix: &'a CharacterMatrix,
    ) -> Self {
        Self { target_chars, stimulus_code, matrix }
    }
}

impl LabelSource for MatrixLabels<'_> {
    fn label_for(&self, trial: usize, sample: usize) -> Result<Option<Label>> {
        resolve_label(
            self.target_chars[trial],
            self.stimulus_code[[trial, sample]],
            self.matrix,
        )
    }
}

/// Pick the label source for a recording once: explicit flags when the
/// recording has them, matrix reconstruction otherwise.
pub fn label_source<'a>(
    recording: &'a Recording,
    matrix: &'a CharacterMatrix,
) -> Box<dyn LabelSource + 'a> {
    match &recording.stimulus_type {
        Some(flags) => {
            log::info!("labels: explicit stimulus_type flags");
            Box::new(ExplicitLabels::new(flags.view(), recording.stimulus_code.view()))
        }
        None => {
            log::info!("labels: reconstructed from target characters");
            Box::new(MatrixLabels::new(
                &recording.target_chars,
                recording.stimulus_code.view(),
                matrix,
            ))
        }
    }
}
