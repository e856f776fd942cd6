mod common;
use common::{mean_std, synthetic_recording, PERIOD};
use ndarray::{Array2, Array3, Axis};
use p300_epochs::{
    condition, extract, label_source, onsets, preprocess, CharacterMatrix, ExplicitLabels, InvalidCodePolicy,
    Label, LabelSource, MatrixLabels, PipelineConfig, PipelineError, Recording,
};

fn cfg(n_ch: usize) -> PipelineConfig {
    PipelineConfig {
        channels: (0..n_ch).collect(),
        ..PipelineConfig::default()
    }
}

#[test]
fn decimation_keeps_timelines_aligned() {
    let rec = synthetic_recording("AQ_", 2, 3, 201, true);
    let n_before = rec.n_samples();
    let rec = condition(rec, &cfg(3)).unwrap();

    let n = rec.n_samples();
    assert_eq!(n, (n_before - 1).div_ceil(2));
    assert_eq!(rec.flashing.ncols(), n);
    assert_eq!(rec.stimulus_code.ncols(), n);
    assert_eq!(rec.stimulus_type.as_ref().unwrap().ncols(), n);
    // A flash starts every PERIOD / 2 decimated samples.
    for tr in 0..rec.n_trials() {
        for j in 0..24 {
            assert_eq!(rec.flashing[[tr, j * PERIOD / 2]], 1);
            assert_ne!(rec.stimulus_code[[tr, j * PERIOD / 2]], 0);
        }
    }
}

#[test]
fn onsets_are_strictly_increasing_from_zero() {
    let rec = condition(synthetic_recording("HELLO", 3, 2, 300, false), &cfg(2)).unwrap();
    for tr in 0..rec.n_trials() {
        let row = rec.flashing.row(tr).to_vec();
        let on: Vec<usize> = onsets(&row).collect();
        assert_eq!(on[0], 0);
        assert!(on.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(on.len(), 3 * 12);
    }
}

#[test]
fn explicit_flags_and_matrix_agree_on_every_sample() {
    let rec = condition(synthetic_recording("P300_SPELL", 2, 1, 200, true), &cfg(1)).unwrap();
    let matrix = CharacterMatrix::default();
    let flags = rec.stimulus_type.as_ref().unwrap();
    let explicit = ExplicitLabels::new(flags.view(), rec.stimulus_code.view());
    let derived = MatrixLabels::new(&rec.target_chars, rec.stimulus_code.view(), &matrix);

    let mut compared = 0;
    for tr in 0..rec.n_trials() {
        for s in 0..rec.n_samples() {
            if rec.stimulus_code[[tr, s]] == 0 {
                continue;
            }
            let a = explicit.label_for(tr, s).unwrap();
            let b = derived.label_for(tr, s).unwrap();
            assert!(a.is_some());
            assert_eq!(a, b, "trial {tr} sample {s}");
            compared += 1;
        }
    }
    assert!(compared > 0);
}

#[test]
fn both_label_paths_give_identical_epoch_sets() {
    let cfg = cfg(2);
    let matrix = CharacterMatrix::default();
    let with_flags = preprocess(synthetic_recording("ABC", 2, 2, 200, true), &cfg, &matrix).unwrap();
    let without = preprocess(synthetic_recording("ABC", 2, 2, 200, false), &cfg, &matrix).unwrap();
    assert_eq!(with_flags.epochs, without.epochs);
    assert_eq!(with_flags.balance, without.balance);
}

#[test]
fn windowing_completeness_without_tail() {
    // No blank tail: the last onsets of each trial cannot fit 78 samples.
    let reps = 2;
    let rec = condition(synthetic_recording("AB", reps, 1, 0, false), &cfg(1)).unwrap();
    let matrix = CharacterMatrix::default();
    let labels = MatrixLabels::new(&rec.target_chars, rec.stimulus_code.view(), &matrix);
    let set = extract(&rec, &labels, 650.0, InvalidCodePolicy::Fail).unwrap();

    let n_onsets = 2 * reps * 12;
    // Decimated trial length 21·24 = 504; onsets 21·j need 21·j + 78 <= 504,
    // so j = 21, 22, 23 fall off the end of each trial.
    assert_eq!(set.dropped(), 2 * 3);
    assert_eq!(set.unlabeled(), 0);
    assert_eq!(set.len(), n_onsets - set.dropped());
    assert_eq!(set.positive_count() + set.dropped_positive(), 2 * 2 * reps);
    for e in set.epochs() {
        assert_eq!(e.data.dim(), (78, 1));
    }
}

#[test]
fn class_counts_and_balance() {
    let reps = 3;
    let ds = preprocess(synthetic_recording("BCI", reps, 2, 200, true), &cfg(2), &CharacterMatrix::default())
        .unwrap();
    let (p, n) = (2 * reps * 3, 10 * reps * 3);
    assert_eq!(ds.epochs.positive_count(), p);
    assert_eq!(ds.epochs.negative_count(), n);
    approx::assert_abs_diff_eq!(ds.balance.class_ratio, n as f64 / p as f64, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(ds.balance.weights.sum(), 2.0 * (p + n) as f64, epsilon = 1e-9);

    assert_eq!(ds.summary.trials, 3);
    assert_eq!(ds.summary.spelled_word, "BCI");
    assert_eq!(ds.summary.epochs, p + n);
    assert_eq!(ds.summary.window_samples, 78);
    assert_eq!(ds.summary.dropped, 0);
}

#[test]
fn epochs_are_normalised_per_channel() {
    let ds = preprocess(synthetic_recording("Z9", 2, 3, 200, false), &cfg(3), &CharacterMatrix::default())
        .unwrap();
    for e in ds.epochs.epochs() {
        for c in 0..3 {
            let (m, s) = mean_std(e.data.column(c).iter().copied());
            assert!(m.abs() < 1e-5, "mean {m}");
            approx::assert_abs_diff_eq!(s, 1.0, epsilon = 1e-4);
        }
    }
}

#[test]
fn target_epochs_carry_the_evoked_response() {
    // Averaged over epochs, targets peak around 300 ms (sample 36 at 120 Hz).
    let ds = preprocess(synthetic_recording("MN", 5, 1, 200, false), &cfg(1), &CharacterMatrix::default())
        .unwrap();
    let avg = |label: Label| {
        let sel: Vec<_> = ds.epochs.epochs().iter().filter(|e| e.label == label).collect();
        (0..78)
            .map(|t| sel.iter().map(|e| e.data[[t, 0]]).sum::<f32>() / sel.len() as f32)
            .collect::<Vec<f32>>()
    };
    let target = avg(Label::Target);
    let other = avg(Label::NonTarget);
    assert!(target[36] > other[36] + 0.5, "target {} vs non-target {}", target[36], other[36]);
}

/// Single trial, 240 → 120 Hz, decimated flashing `[1,1,0,1,1,0,…]`,
/// codes `[3,3,0,9,9,0,…]`, target in column 3 but not row 9.
#[test]
fn two_flash_scenario() {
    let n_raw = 200;
    let mut flashing = vec![0u8; n_raw];
    let mut codes = vec![0u8; n_raw];
    for t in 0..4 {
        flashing[t] = 1;
        codes[t] = 3;
        flashing[6 + t] = 1;
        codes[6 + t] = 9;
    }
    let rec = Recording::new(
        "scenario",
        Array3::from_shape_fn((1, n_raw, 1), |(_, t, _)| (t as f32 * 0.37).sin()),
        Array2::from_shape_vec((1, n_raw), flashing).unwrap(),
        Array2::from_shape_vec((1, n_raw), codes).unwrap(),
        None,
        vec!['C'],
        240.0,
    )
    .unwrap();

    let cfg = cfg(1);
    let conditioned = condition(rec.clone(), &cfg).unwrap();
    assert_eq!(&conditioned.flashing.row(0).to_vec()[..6], &[1, 1, 0, 1, 1, 0]);
    assert_eq!(&conditioned.stimulus_code.row(0).to_vec()[..6], &[3, 3, 0, 9, 9, 0]);

    let ds = preprocess(rec, &cfg, &CharacterMatrix::default()).unwrap();
    assert_eq!(ds.epochs.windows().shape(), &[2, 78, 1]);
    let onsets: Vec<usize> = ds.epochs.epochs().iter().map(|e| e.onset).collect();
    assert_eq!(onsets, vec![0, 3]);
    assert_eq!(ds.epochs.labels().to_vec(), vec![1, 0]);
    assert_eq!(ds.epochs.stimulus_codes().to_vec(), vec![3, 9]);
    approx::assert_abs_diff_eq!(ds.balance.class_ratio, 1.0, epsilon = 1e-12);
}

#[test]
fn single_class_dataset_is_degenerate() {
    // Only code 1 (first column) ever flashes; 'Z' sits in column 2.
    let n_raw = 400;
    let flashing: Vec<u8> = (0..n_raw).map(|t| ((t % 42) < 24) as u8).collect();
    let codes = flashing.clone();
    let rec = Recording::new(
        "degenerate",
        Array3::from_shape_fn((1, n_raw, 1), |(_, t, _)| (t as f32 * 0.21).cos()),
        Array2::from_shape_vec((1, n_raw), flashing).unwrap(),
        Array2::from_shape_vec((1, n_raw), codes).unwrap(),
        None,
        vec!['Z'],
        240.0,
    )
    .unwrap();
    let err = preprocess(rec, &cfg(1), &CharacterMatrix::default());
    assert!(matches!(err, Err(PipelineError::DegenerateDataset { positive: 0, .. })));
}

#[test]
fn configuration_errors_surface_before_processing() {
    let rec = synthetic_recording("A", 1, 2, 100, false);
    let bad_rate = PipelineConfig { target_sfreq: 70.0, ..cfg(2) };
    assert!(matches!(
        preprocess(rec.clone(), &bad_rate, &CharacterMatrix::default()),
        Err(PipelineError::Configuration(_))
    ));
    let bad_channels = PipelineConfig { channels: vec![0, 5], ..cfg(2) };
    assert!(matches!(
        preprocess(rec, &bad_channels, &CharacterMatrix::default()),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn trials_are_processed_independently() {
    let cfg = cfg(2);
    let matrix = CharacterMatrix::default();
    let a = synthetic_recording("AB", 2, 2, 200, true);
    // Same first trial; second trial has another target, other codes and a
    // rescaled signal.
    let mut b = synthetic_recording("AZ", 2, 2, 200, true);
    b.signal.index_axis_mut(Axis(0), 1).mapv_inplace(|v| -3.0 * v + 7.0);
    b.stimulus_code.row_mut(1).mapv_inplace(|c| if c == 0 { 0 } else { c % 12 + 1 });
    assert_eq!(a.signal.index_axis(Axis(0), 0), b.signal.index_axis(Axis(0), 0));

    let a = condition(a, &cfg).unwrap();
    let b = condition(b, &cfg).unwrap();
    let bits = |r: &Recording| -> Vec<u32> {
        r.signal.index_axis(Axis(0), 0).iter().map(|v| v.to_bits()).collect()
    };
    assert_eq!(bits(&a), bits(&b));
    assert_eq!(a.flashing.row(0), b.flashing.row(0));
    assert_eq!(a.stimulus_code.row(0), b.stimulus_code.row(0));

    let first_trial = |r: &Recording| {
        let labels = label_source(r, &matrix);
        let set = extract(r, labels.as_ref(), cfg.window_ms, cfg.on_invalid_code).unwrap();
        set.epochs().iter().filter(|e| e.trial == 0).cloned().collect::<Vec<_>>()
    };
    let (ea, eb) = (first_trial(&a), first_trial(&b));
    assert!(!ea.is_empty());
    assert_eq!(ea, eb);
}
