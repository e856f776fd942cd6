//! Safetensors I/O.
//!
//! Reader: `recording.safetensors` holding one speller session
//! (see [`load_recording`] for the expected keys).
//! Writer/reader pair for extracted epoch sets ([`write_epochs`] /
//! [`read_epochs`]); the pairing window ↔ label ↔ stimulus code, the drop
//! counters and the class balance survive the round trip exactly.
use anyhow::{bail, ensure, Context, Result};
use ndarray::{Array1, Array2, Array3};
use std::collections::HashMap;
use std::path::Path;

use crate::balance::Balance;
use crate::epoch::{AbortedTrial, Epoch, EpochSet};
use crate::label::Label;
use crate::recording::Recording;

// ── Low-level safetensors parser (raw bytes → flat vectors). ──────────────────

type Header = HashMap<String, serde_json::Value>;

fn parse_header(bytes: &[u8]) -> Result<(Header, usize)> {
    ensure!(bytes.len() >= 8, "safetensors file too small");
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let end = usize::try_from(u64::from_le_bytes(len))
        .ok()
        .and_then(|n| n.checked_add(8))
        .context("safetensors header length overflows")?;
    ensure!(bytes.len() >= end, "safetensors header runs past end of file");
    let mut header: Header =
        serde_json::from_slice(&bytes[8..end]).context("failed to parse safetensors header")?;
    header.remove("__metadata__");
    Ok((header, end))
}

fn tensor_bytes<'a>(bytes: &'a [u8], data_start: usize, entry: &serde_json::Value) -> Result<&'a [u8]> {
    let offsets = entry["data_offsets"].as_array().context("missing data_offsets")?;
    ensure!(offsets.len() == 2, "data_offsets must have two entries");
    let s = offsets[0].as_u64().context("bad data offset")? as usize;
    let e = offsets[1].as_u64().context("bad data offset")? as usize;
    let start = data_start.checked_add(s).context("data offset overflows")?;
    let end = data_start.checked_add(e).context("data offset overflows")?;
    bytes
        .get(start..end)
        .context("tensor data runs past end of file")
}

fn shape_of(entry: &serde_json::Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .context("missing shape")?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).context("bad shape dimension"))
        .collect()
}

fn dtype_of(entry: &serde_json::Value) -> Result<&str> {
    entry["dtype"].as_str().context("missing dtype")
}

fn entry<'h>(header: &'h Header, key: &str) -> Result<&'h serde_json::Value> {
    header.get(key).with_context(|| format!("missing '{key}' key"))
}

/// Any numeric tensor, widened to f64.
fn read_numeric(bytes: &[u8], data_start: usize, entry: &serde_json::Value) -> Result<Vec<f64>> {
    let raw = tensor_bytes(bytes, data_start, entry)?;
    let out: Vec<f64> = match dtype_of(entry)? {
        "F32" => raw.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64).collect(),
        "F64" => raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect(),
        "I32" => raw.chunks_exact(4).map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64).collect(),
        "I64" => raw
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64)
            .collect(),
        "U8" => raw.iter().map(|&b| b as f64).collect(),
        other => bail!("unsupported dtype {other}"),
    };
    Ok(out)
}

fn read_f32(bytes: &[u8], data_start: usize, entry: &serde_json::Value) -> Result<Vec<f32>> {
    if dtype_of(entry)? == "F32" {
        let raw = tensor_bytes(bytes, data_start, entry)?;
        return Ok(raw.chunks_exact(4).map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])).collect());
    }
    Ok(read_numeric(bytes, data_start, entry)?.into_iter().map(|v| v as f32).collect())
}

fn read_u8(bytes: &[u8], data_start: usize, entry: &serde_json::Value) -> Result<Vec<u8>> {
    read_numeric(bytes, data_start, entry)?
        .into_iter()
        .map(|v| {
            ensure!(v >= 0.0 && v <= 255.0 && v.fract() == 0.0, "value {v} is not a u8");
            Ok(v as u8)
        })
        .collect()
}

fn read_usize(bytes: &[u8], data_start: usize, entry: &serde_json::Value) -> Result<Vec<usize>> {
    read_numeric(bytes, data_start, entry)?
        .into_iter()
        .map(|v| {
            ensure!(v >= 0.0 && v.fract() == 0.0, "value {v} is not an index");
            Ok(v as usize)
        })
        .collect()
}

fn read_timeline(bytes: &[u8], data_start: usize, header: &Header, key: &str) -> Result<Array2<u8>> {
    let e = entry(header, key)?;
    let shape = shape_of(e)?;
    ensure!(shape.len() == 2, "'{key}' must be 2-D, got shape {shape:?}");
    let v = read_u8(bytes, data_start, e).with_context(|| format!("reading '{key}'"))?;
    Ok(Array2::from_shape_vec((shape[0], shape[1]), v)?)
}

// ── Recording loader ──────────────────────────────────────────────────────────

/// Load one speller session from a safetensors file.
///
/// | key             | shape                        | dtype            |
/// |-----------------|------------------------------|------------------|
/// | `signal`        | `[trials, samples, channels]`| F32 / F64        |
/// | `flashing`      | `[trials, samples]`          | any numeric, 0/1 |
/// | `stimulus_code` | `[trials, samples]`          | any numeric      |
/// | `stimulus_type` | `[trials, samples]` optional | any numeric, 0/1 |
/// | `target_chars`  | `[trials]`                   | U8 (ASCII)       |
/// | `sfreq`         | `[1]`                        | any numeric      |
///
/// The subject identifier is the file stem.
pub fn load_recording(path: &Path) -> Result<Recording> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let (header, data_start) = parse_header(&bytes)?;

    let sig_entry = entry(&header, "signal")?;
    let sig_shape = shape_of(sig_entry)?;
    ensure!(sig_shape.len() == 3, "'signal' must be 3-D, got shape {sig_shape:?}");
    let signal = Array3::from_shape_vec(
        (sig_shape[0], sig_shape[1], sig_shape[2]),
        read_f32(&bytes, data_start, sig_entry)?,
    )?;

    let flashing = read_timeline(&bytes, data_start, &header, "flashing")?;
    let stimulus_code = read_timeline(&bytes, data_start, &header, "stimulus_code")?;
    // Stimulus type is optional (absent in test sessions).
    let stimulus_type = if header.contains_key("stimulus_type") {
        Some(read_timeline(&bytes, data_start, &header, "stimulus_type")?)
    } else {
        None
    };

    let target_chars = read_u8(&bytes, data_start, entry(&header, "target_chars")?)?
        .into_iter()
        .map(char::from)
        .collect();

    let sfreq = *read_numeric(&bytes, data_start, entry(&header, "sfreq")?)?
        .first()
        .context("'sfreq' is empty")? as f32;

    let subject = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Recording::new(subject, signal, flashing, stimulus_code, stimulus_type, target_chars, sfreq)?)
}

// ── Generic safetensors builder ───────────────────────────────────────────────

/// Simple safetensors file writer that handles F32, F64, I32 and U8 tensors.
///
/// Usage:
/// ```rust,no_run
/// use p300_epochs::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f32("signal", &[1.0f32, 2.0, 3.0], &[1, 3]);
/// w.add_u8("labels", &[0, 1, 0], &[3]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f32(&mut self, name: &str, data: &[f32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F32", shape.to_vec()));
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    pub fn add_u8(&mut self, name: &str, data: &[u8], shape: &[usize]) {
        self.entries.push((name.to_string(), data.to_vec(), "U8", shape.to_vec()));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Epoch set writer / reader ─────────────────────────────────────────────────

fn to_i32(v: usize) -> Result<i32> {
    i32::try_from(v).with_context(|| format!("{v} does not fit in I32"))
}

/// Write an epoch set to `epochs.safetensors`.
///
/// Keys: `windows [E, W, C] F32`, `labels [E] U8`, `stimulus_codes [E] U8`,
/// `trials [E] I32`, `onsets [E] I32`,
/// `counters [3] I32` (dropped target, dropped non-target, unlabeled),
/// `aborted_trials [A, 2] I32` (trial, code), and with `balance`:
/// `class_ratio [1] F64`, `weights [E] F64`.
pub fn write_epochs(set: &EpochSet, balance: Option<&Balance>, path: &Path) -> Result<()> {
    let (e, w, c) = (set.len(), set.window_samples(), set.n_channels());
    let mut st = StWriter::new();

    let windows: Vec<f32> = set.windows().iter().copied().collect();
    st.add_f32("windows", &windows, &[e, w, c]);
    st.add_u8("labels", set.labels().as_slice().unwrap_or(&[]), &[e]);
    st.add_u8("stimulus_codes", set.stimulus_codes().as_slice().unwrap_or(&[]), &[e]);

    let trials = set.epochs().iter().map(|ep| to_i32(ep.trial)).collect::<Result<Vec<_>>>()?;
    let onsets = set.epochs().iter().map(|ep| to_i32(ep.onset)).collect::<Result<Vec<_>>>()?;
    st.add_i32("trials", &trials, &[e]);
    st.add_i32("onsets", &onsets, &[e]);

    let counters = [set.dropped_positive(), set.dropped_negative(), set.unlabeled()]
        .into_iter()
        .map(to_i32)
        .collect::<Result<Vec<_>>>()?;
    st.add_i32("counters", &counters, &[3]);

    let mut aborted = Vec::with_capacity(2 * set.aborted_trials().len());
    for a in set.aborted_trials() {
        aborted.push(to_i32(a.trial)?);
        aborted.push(a.code as i32);
    }
    st.add_i32("aborted_trials", &aborted, &[set.aborted_trials().len(), 2]);

    if let Some(b) = balance {
        ensure!(b.weights.len() == e, "{} weights for {e} epochs", b.weights.len());
        st.add_f64("class_ratio", &[b.class_ratio], &[1]);
        st.add_f64("weights", &b.weights.to_vec(), &[e]);
    }
    st.write(path)
}

/// Read an epoch set written by [`write_epochs`], with its [`Balance`] when
/// the file carries one.
pub fn read_epochs(path: &Path) -> Result<(EpochSet, Option<Balance>)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let (header, data_start) = parse_header(&bytes)?;

    let win_entry = entry(&header, "windows")?;
    let shape = shape_of(win_entry)?;
    ensure!(shape.len() == 3, "'windows' must be 3-D, got shape {shape:?}");
    let (n_e, n_w, n_c) = (shape[0], shape[1], shape[2]);
    let windows = Array3::from_shape_vec((n_e, n_w, n_c), read_f32(&bytes, data_start, win_entry)?)?;

    let labels = read_u8(&bytes, data_start, entry(&header, "labels")?)?;
    let codes = read_u8(&bytes, data_start, entry(&header, "stimulus_codes")?)?;
    let trials = read_usize(&bytes, data_start, entry(&header, "trials")?)?;
    let onsets = read_usize(&bytes, data_start, entry(&header, "onsets")?)?;
    for (name, len) in [("labels", labels.len()), ("stimulus_codes", codes.len()),
                        ("trials", trials.len()), ("onsets", onsets.len())] {
        ensure!(len == n_e, "'{name}' has {len} entries for {n_e} windows");
    }

    let mut set = EpochSet::new(n_w, n_c);
    for (i, window) in windows.outer_iter().enumerate() {
        set.push(Epoch {
            data: window.to_owned(),
            label: Label::from_flag(labels[i]),
            stimulus_code: codes[i],
            trial: trials[i],
            onset: onsets[i],
        })?;
    }

    let counters = read_usize(&bytes, data_start, entry(&header, "counters")?)?;
    ensure!(counters.len() == 3, "'counters' must have 3 entries");
    set.dropped_positive = counters[0];
    set.dropped_negative = counters[1];
    set.unlabeled = counters[2];

    let ab_entry = entry(&header, "aborted_trials")?;
    let ab_shape = shape_of(ab_entry)?;
    ensure!(
        ab_shape.len() == 2 && ab_shape[1] == 2,
        "'aborted_trials' must have shape [A, 2], got {ab_shape:?}"
    );
    let aborted = read_usize(&bytes, data_start, ab_entry)?;
    ensure!(aborted.len() == 2 * ab_shape[0], "'aborted_trials' holds {} values", aborted.len());
    set.aborted_trials = aborted
        .chunks_exact(2)
        .map(|p| {
            let code = u8::try_from(p[1])
                .with_context(|| format!("aborted trial {}: code {} is not a u8", p[0], p[1]))?;
            Ok(AbortedTrial { trial: p[0], code })
        })
        .collect::<Result<_>>()?;

    let balance = match (header.get("class_ratio"), header.get("weights")) {
        (Some(ratio), Some(weights)) => {
            let class_ratio = *read_numeric(&bytes, data_start, ratio)?
                .first()
                .context("'class_ratio' is empty")?;
            let weights = Array1::from(read_numeric(&bytes, data_start, weights)?);
            ensure!(weights.len() == n_e, "{} weights for {n_e} epochs", weights.len());
            Some(Balance {
                positive: set.positive_count(),
                negative: set.negative_count(),
                class_ratio,
                weights,
            })
        }
        (None, None) => None,
        _ => bail!("'class_ratio' and 'weights' must be stored together"),
    };

    Ok((set, balance))
}
