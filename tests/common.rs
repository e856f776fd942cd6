/// Shared helpers: synthetic speller sessions shaped like the BCI
/// Competition III P300 data (240 Hz, 12 stimulus codes, 100 ms flash +
/// 75 ms blank per stimulus).
use ndarray::{Array2, Array3};
use p300_epochs::{CharacterMatrix, Recording};

pub const SFREQ: f32 = 240.0;
/// Samples a stimulus stays lit (100 ms).
pub const FLASH: usize = 24;
/// Samples between two stimuli (75 ms).
pub const BLANK: usize = 18;
pub const PERIOD: usize = FLASH + BLANK;

/// Code flashed at position `i` of repetition `rep`: a different
/// permutation of 1..=12 in every repetition.
pub fn code_at(rep: usize, i: usize) -> u8 {
    ((i * 5 + rep * 7) % 12 + 1) as u8
}

/// Build a session spelling `word`, with `reps` repetitions of the 12
/// flashes per letter followed by `tail` blank samples.
///
/// Target flashes add a 300 ms positive deflection on every channel.
#[allow(unused)]
pub fn synthetic_recording(word: &str, reps: usize, n_ch: usize, tail: usize, with_flags: bool) -> Recording {
    let matrix = CharacterMatrix::default();
    let chars: Vec<char> = word.chars().collect();
    let n_trials = chars.len();
    let n_t = reps * 12 * PERIOD + tail;

    let mut flashing = Array2::<u8>::zeros((n_trials, n_t));
    let mut codes = Array2::<u8>::zeros((n_trials, n_t));
    let mut types = Array2::<u8>::zeros((n_trials, n_t));
    let mut signal = Array3::<f32>::from_shape_fn((n_trials, n_t, n_ch), |(tr, t, c)| {
        let x = t as f32 / SFREQ;
        (2.0 * std::f32::consts::PI * 5.0 * x + c as f32 + tr as f32).sin()
            + 0.5 * (2.0 * std::f32::consts::PI * 12.0 * x + 0.3 * c as f32).cos()
    });

    for (tr, &ch) in chars.iter().enumerate() {
        let (col, row) = matrix.codes_for(ch).expect("char in matrix");
        for rep in 0..reps {
            for i in 0..12 {
                let code = code_at(rep, i);
                let start = (rep * 12 + i) * PERIOD;
                let is_target = code == col || code == row;
                for t in start..start + FLASH {
                    flashing[[tr, t]] = 1;
                    codes[[tr, t]] = code;
                    types[[tr, t]] = is_target as u8;
                }
                if is_target {
                    // Gaussian bump centred 300 ms after onset.
                    for t in start..(start + 144).min(n_t) {
                        let dt = (t - start) as f32 / SFREQ - 0.3;
                        let bump = 3.0 * (-(dt * dt) / (2.0 * 0.05 * 0.05)).exp();
                        for c in 0..n_ch {
                            signal[[tr, t, c]] += bump;
                        }
                    }
                }
            }
        }
    }

    Recording::new(
        "synthetic",
        signal,
        flashing,
        codes,
        with_flags.then_some(types),
        chars,
        SFREQ,
    )
    .expect("consistent synthetic recording")
}

/// Population mean and standard deviation.
#[allow(unused)]
pub fn mean_std(x: impl Iterator<Item = f32>) -> (f64, f64) {
    let v: Vec<f64> = x.map(|v| v as f64).collect();
    let n = v.len() as f64;
    let m = v.iter().sum::<f64>() / n;
    let var = v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
    (m, var.sqrt())
}
