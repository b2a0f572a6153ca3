//! ppgcheck replays the fixed-point PPG processing chain of a hardware heart
//! rate monitor in software and checks it against traces recorded from the
//! hardware. The chain is a first-order high-pass filter followed by a
//! first-order low-pass filter, both in Q15 arithmetic with saturation to the
//! hardware sample width, a downsampler, a peak detector with a refractory
//! period, and a BPM estimator.
//!
//! The comparison resolves whether the hardware trace was recorded before or
//! after downsampling, matches the software and hardware peaks within a
//! tolerance, and compares the BPM series.

#![warn(missing_docs)]

pub mod alignment;
pub mod app;
pub mod args;
pub mod bpm;
pub mod config;
pub mod downsample;
pub mod error;
pub mod filter;
pub mod matcher;
pub mod peaks;
pub mod pipeline;
pub mod report;
pub mod trace;
