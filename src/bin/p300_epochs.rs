use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use p300_epochs::{
    io::{load_recording, write_epochs},
    preprocess, CharacterMatrix, InvalidCodePolicy, PipelineConfig,
};

#[derive(Parser)]
#[command(name = "p300-epochs", about = "P300 speller epoch extraction")]
struct Args {
    /// recording.safetensors (signal, flashing, stimulus_code, target_chars, sfreq)
    #[arg(long)]
    input: PathBuf,

    /// epochs.safetensors output path
    #[arg(long)]
    output: PathBuf,

    /// Write the dataset summary as JSON to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Channel indices to keep, comma-separated (default: Fz Cz Pz P3 P4 PO7 PO8 Oz)
    #[arg(long, default_value = "10,33,48,50,52,55,59,61")]
    channels: String,

    /// Sampling rate after decimation in Hz
    #[arg(long, default_value_t = 120.0)]
    target_sfreq: f32,

    /// Post-onset window in milliseconds
    #[arg(long, default_value_t = 650.0)]
    window_ms: f32,

    /// Bandpass low cutoff in Hz
    #[arg(long, default_value_t = 0.1)]
    l_freq: f32,

    /// Bandpass high cutoff in Hz
    #[arg(long, default_value_t = 20.0)]
    h_freq: f32,

    /// 36 matrix symbols, row by row
    #[arg(long, default_value = "ABCDEFGHIJKLMNOPQRSTUVWXYZ123456789_")]
    matrix: String,

    /// Fail on unknown stimulus codes instead of skipping the trial
    #[arg(long)]
    strict: bool,
}

fn parse_channels(s: &str) -> Result<Vec<usize>> {
    s.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| c.parse::<usize>().with_context(|| format!("bad channel index '{c}'")))
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let recording = load_recording(&args.input)?;
    log::info!(
        "loaded {} trials × {} samples × {} channels @ {} Hz",
        recording.n_trials(),
        recording.n_samples(),
        recording.n_channels(),
        recording.sfreq
    );

    let cfg = PipelineConfig {
        channels: parse_channels(&args.channels)?,
        native_sfreq: recording.sfreq,
        target_sfreq: args.target_sfreq,
        l_freq: args.l_freq,
        h_freq: args.h_freq,
        window_ms: args.window_ms,
        on_invalid_code: if args.strict { InvalidCodePolicy::Fail } else { InvalidCodePolicy::SkipTrial },
        ..PipelineConfig::default()
    };
    let matrix = CharacterMatrix::from_symbols(&args.matrix)?;

    let dataset = preprocess(recording, &cfg, &matrix)?;
    println!("{}", dataset.summary);

    write_epochs(&dataset.epochs, Some(&dataset.balance), &args.output)?;
    println!("Written → {}", args.output.display());

    if let Some(path) = &args.summary {
        let json = serde_json::to_string_pretty(&dataset.summary.to_json())?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
