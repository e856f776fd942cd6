//! Butterworth bandpass design and zero-phase application.
//!
//! - [`design`]: order-N Butterworth bandpass as second-order sections,
//!   matching `scipy.signal.butter(N, [lo, hi], 'bandpass', output='sos', fs=fs)`.
//! - [`apply`]: forward-backward (`sosfiltfilt`) application along the sample
//!   axis of one trial, channel by channel.

pub mod apply;
pub mod design;

pub use apply::{filtfilt_1d, filtfilt_trial_inplace, min_filter_len};
pub use design::design_bandpass;
