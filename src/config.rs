//! Pipeline configuration.
//!
//! This module contains [`PipelineConfig`], which gathers all the constants of
//! the hardware pipeline that the software replay needs to know. The defaults
//! correspond to the hardware design: 50 Hz input, 10-bit samples, Q15 filter
//! coefficients and downsampling by two. The configuration can be read from a
//! JSON file, in which missing fields take their default values.

use crate::{
    alignment::DomainRates,
    error::{Error, Result},
    filter::{Cascade, Coefficient, HighPass, LowPass, SampleWidth},
};
use serde::{Deserialize, Serialize};

/// Fixed-point coefficient settings.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct CoefficientConfig {
    /// Coefficient numerator.
    pub alpha_q: i32,
    /// Coefficient scale in bits.
    pub scale: u32,
}

impl CoefficientConfig {
    /// Builds the validated coefficient.
    pub fn coefficient(&self) -> Result<Coefficient> {
        Coefficient::new(self.alpha_q, self.scale)
    }
}

/// Pipeline configuration.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input sample rate in Hz.
    pub sample_rate: f64,
    /// Downsample factor applied after the low-pass filter.
    pub downsample: usize,
    /// Sample width in bits.
    pub width: u32,
    /// High-pass filter coefficient.
    pub high_pass: CoefficientConfig,
    /// Low-pass filter coefficient.
    pub low_pass: CoefficientConfig,
    /// Peak detection threshold.
    pub threshold: i32,
    /// Refractory period in samples, in the downsampled domain.
    pub refractory: usize,
    /// Peak matching tolerance in samples.
    pub tolerance: usize,
}

impl Default for PipelineConfig {
    fn default() -> PipelineConfig {
        PipelineConfig {
            sample_rate: 50.0,
            downsample: 2,
            width: 10,
            high_pass: CoefficientConfig {
                alpha_q: 30831,
                scale: 15,
            },
            low_pass: CoefficientConfig {
                alpha_q: 12629,
                scale: 15,
            },
            threshold: 50,
            refractory: 8,
            tolerance: 1,
        }
    }
}

impl PipelineConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<PipelineConfig> {
        serde_json::from_str(json)
    }

    /// Checks that all the parameters are usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(Error::InvalidSampleRate(self.sample_rate));
        }
        if self.downsample == 0 {
            return Err(Error::InvalidDownsampleFactor);
        }
        self.sample_width()?;
        self.high_pass.coefficient()?;
        self.low_pass.coefficient()?;
        Ok(())
    }

    /// Gives the validated sample width.
    pub fn sample_width(&self) -> Result<SampleWidth> {
        SampleWidth::new(self.width)
    }

    /// Builds the high-pass and low-pass filters in series, with zero state.
    pub fn filter_chain(&self) -> Result<Cascade<HighPass, LowPass>> {
        let width = self.sample_width()?;
        Ok(Cascade(
            HighPass::new(self.high_pass.coefficient()?, width),
            LowPass::new(self.low_pass.coefficient()?, width),
        ))
    }

    /// Gives the sampling parameters used for the alignment.
    pub fn rates(&self) -> DomainRates {
        DomainRates {
            sample_rate: self.sample_rate,
            downsample: self.downsample,
            refractory: self.refractory,
        }
    }
}
