//! ppgcheck CLI arguments.
//!
//! This module contains the definition of the CLI arguments for the ppgcheck
//! application.

use crate::config::PipelineConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ppgcheck CLI arguments.
#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// JSON file with the pipeline configuration
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Pipeline settings overriding the configuration file
    #[clap(flatten)]
    pub overrides: ConfigOverrides,
    /// Operation to run
    #[clap(subcommand)]
    pub command: Command,
}

/// ppgcheck subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replay the pipeline on a reference trace and compare the results
    Compare {
        /// Reference trace CSV (ppg_in, ppg_filt, peak_pulse, bpm_value)
        trace: PathBuf,
        /// Write the JSON report to this file instead of stdout
        #[clap(long)]
        report: Option<PathBuf>,
        /// Write the aligned per-sample series to this CSV file
        #[clap(long)]
        series: Option<PathBuf>,
    },
    /// Filter a raw input vector with the fixed-point filters
    Filter {
        /// Input CSV with a PPG column
        input: PathBuf,
        /// Write the Input,Output CSV to this file instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Compare a peak detector dump (index, value, flag) with the software
    /// peak detector
    Peaks {
        /// Peak detector dump CSV, without header
        dump: PathBuf,
        /// Write the JSON report to this file instead of stdout
        #[clap(long)]
        report: Option<PathBuf>,
    },
}

/// Pipeline settings given on the command line.
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Input sample rate in Hz
    #[clap(long, global = true)]
    pub sample_rate: Option<f64>,
    /// Downsample factor
    #[clap(long, global = true)]
    pub downsample: Option<usize>,
    /// Sample width in bits
    #[clap(long, global = true)]
    pub width: Option<u32>,
    /// High-pass coefficient numerator
    #[clap(long, global = true)]
    pub hpf_alpha: Option<i32>,
    /// Low-pass coefficient numerator
    #[clap(long, global = true)]
    pub lpf_alpha: Option<i32>,
    /// Peak detection threshold
    #[clap(long, global = true, allow_hyphen_values = true)]
    pub threshold: Option<i32>,
    /// Refractory period in samples (downsampled domain)
    #[clap(long, global = true)]
    pub refractory: Option<usize>,
    /// Peak matching tolerance in samples
    #[clap(long, global = true)]
    pub tolerance: Option<usize>,
}

impl ConfigOverrides {
    /// Applies the settings that were given to a configuration.
    pub fn apply(&self, config: &mut PipelineConfig) {
        macro_rules! set {
            ($($field:ident => $($target:ident).+),*) => {
                $(
                    if let Some(value) = self.$field {
                        config.$($target).+ = value;
                    }
                )*
            }
        }
        set!(sample_rate => sample_rate,
             downsample => downsample,
             width => width,
             hpf_alpha => high_pass.alpha_q,
             lpf_alpha => low_pass.alpha_q,
             threshold => threshold,
             refractory => refractory,
             tolerance => tolerance);
    }
}
