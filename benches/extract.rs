use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use ndarray::{Array2, Array3};
use p300_epochs::{condition, extract, label_source, preprocess, CharacterMatrix, PipelineConfig, Recording};

/// 10 letters × 15 repetitions × 12 flashes, 64 channels at 240 Hz.
fn session() -> Recording {
    let (n_trials, n_ch) = (10, 64);
    let n_t = 15 * 12 * 42 + 240;
    let mut flashing = Array2::<u8>::zeros((n_trials, n_t));
    let mut codes = Array2::<u8>::zeros((n_trials, n_t));
    for tr in 0..n_trials {
        for j in 0..15 * 12 {
            for t in j * 42..j * 42 + 24 {
                flashing[[tr, t]] = 1;
                codes[[tr, t]] = ((j * 5 + tr) % 12 + 1) as u8;
            }
        }
    }
    let signal = Array3::from_shape_fn((n_trials, n_t, n_ch), |(tr, t, c)| {
        ((t as f32 * 0.13 + c as f32) * (1.0 + tr as f32 * 0.01)).sin()
    });
    Recording::new("bench", signal, flashing, codes, None, "BENCHMARKS".chars().collect(), 240.0).unwrap()
}

fn bench_condition(c: &mut Criterion) {
    let rec = session();
    let cfg = PipelineConfig::default();
    c.bench_function("condition [10×7800×64] → [10×3900×8]", |b| {
        b.iter(|| {
            let out = condition(black_box(rec.clone()), &cfg).unwrap();
            black_box(out.n_samples())
        })
    });
}

fn bench_extract(c: &mut Criterion) {
    let cfg = PipelineConfig::default();
    let matrix = CharacterMatrix::default();
    let rec = condition(session(), &cfg).unwrap();
    let labels = label_source(&rec, &matrix);
    c.bench_function("extract 1800 epochs [78×8]", |b| {
        b.iter(|| {
            let set = extract(black_box(&rec), labels.as_ref(), cfg.window_ms, cfg.on_invalid_code).unwrap();
            black_box(set.len())
        })
    });
}

fn bench_preprocess(c: &mut Criterion) {
    let rec = session();
    let cfg = PipelineConfig::default();
    let matrix = CharacterMatrix::default();
    c.bench_function("preprocess (full pipeline)", |b| {
        b.iter(|| {
            let ds = preprocess(black_box(rec.clone()), &cfg, &matrix).unwrap();
            black_box(ds.balance.class_ratio)
        })
    });
}

criterion_group!(benches, bench_condition, bench_extract, bench_preprocess);
criterion_main!(benches);
