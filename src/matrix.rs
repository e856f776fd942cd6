//! The 6 × 6 speller character matrix and its stimulus groups.
//!
//! Stimulus codes follow the BCI Competition III P300 convention:
//!
//! ```text
//!            code  1   2   3   4   5   6
//!   code  7      A   B   C   D   E   F
//!   code  8      G   H   I   J   K   L
//!   code  9      M   N   O   P   Q   R
//!   code 10      S   T   U   V   W   X
//!   code 11      Y   Z   1   2   3   4
//!   code 12      5   6   7   8   9   _
//! ```
//!
//! Codes 1–6 flash columns left to right, codes 7–12 flash rows top to
//! bottom.  Code 0 means no stimulus is active.  [`CharacterMatrix::group`]
//! is the only place that encodes this bijection.
use crate::error::{PipelineError, Result};

/// Side length of the matrix.
pub const MATRIX_SIZE: usize = 6;

/// Number of stimulus groups (6 columns + 6 rows).
pub const N_GROUPS: usize = 2 * MATRIX_SIZE;

const DEFAULT_SYMBOLS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ123456789_";

/// Immutable character layout plus the 12 stimulus groups derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterMatrix {
    /// Row-major cells.
    cells: [[char; MATRIX_SIZE]; MATRIX_SIZE],
    /// `groups[code - 1]`: characters highlighted when `code` flashes.
    groups: [[char; MATRIX_SIZE]; N_GROUPS],
}

impl Default for CharacterMatrix {
    fn default() -> Self {
        // DEFAULT_SYMBOLS has 36 distinct symbols.
        match Self::from_symbols(DEFAULT_SYMBOLS) {
            Ok(m) => m,
            Err(_) => unreachable!("default speller layout is valid"),
        }
    }
}

impl CharacterMatrix {
    /// Build a matrix from 36 distinct symbols listed row by row.
    pub fn from_symbols(symbols: &str) -> Result<Self> {
        let chars: Vec<char> = symbols.chars().collect();
        if chars.len() != MATRIX_SIZE * MATRIX_SIZE {
            return Err(PipelineError::Configuration(format!(
                "character matrix needs {} symbols, got {}",
                MATRIX_SIZE * MATRIX_SIZE,
                chars.len()
            )));
        }
        let mut sorted = chars.clone();
        sorted.sort_unstable();
        if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(PipelineError::Configuration(format!(
                "character matrix symbol {:?} appears more than once",
                w[0]
            )));
        }

        let mut cells = [[' '; MATRIX_SIZE]; MATRIX_SIZE];
        for (i, &c) in chars.iter().enumerate() {
            cells[i / MATRIX_SIZE][i % MATRIX_SIZE] = c;
        }

        let mut groups = [[' '; MATRIX_SIZE]; N_GROUPS];
        for col in 0..MATRIX_SIZE {
            for row in 0..MATRIX_SIZE {
                groups[col][row] = cells[row][col];
            }
        }
        for row in 0..MATRIX_SIZE {
            groups[MATRIX_SIZE + row] = cells[row];
        }

        Ok(Self { cells, groups })
    }

    /// Characters highlighted by stimulus `code` (1..=12).
    pub fn group(&self, code: u8) -> Result<&[char]> {
        let idx = (code as usize)
            .checked_sub(1)
            .filter(|&i| i < N_GROUPS)
            .ok_or(PipelineError::InvalidStimulusCode { code, groups: N_GROUPS })?;
        Ok(&self.groups[idx])
    }

    /// Character at the intersection of a column code (1..=6) and a row code
    /// (7..=12), i.e. the selection implied by the two winning flashes.
    pub fn char_at(&self, column_code: u8, row_code: u8) -> Option<char> {
        let col = (column_code as usize).checked_sub(1).filter(|&c| c < MATRIX_SIZE)?;
        let row = (row_code as usize)
            .checked_sub(MATRIX_SIZE + 1)
            .filter(|&r| r < MATRIX_SIZE)?;
        Some(self.cells[row][col])
    }

    /// `(column_code, row_code)` of the two flashes that contain `ch`.
    pub fn codes_for(&self, ch: char) -> Option<(u8, u8)> {
        self.cells.iter().enumerate().find_map(|(row, cells)| {
            cells
                .iter()
                .position(|&c| c == ch)
                .map(|col| ((col + 1) as u8, (MATRIX_SIZE + row + 1) as u8))
        })
    }

    /// Cells in row-major order.
    pub fn symbols(&self) -> String {
        self.cells.iter().flatten().collect()
    }
}
