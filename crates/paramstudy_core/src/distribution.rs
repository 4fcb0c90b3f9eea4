//! Distributions for bounded parameters
//!
//! Continuous samplers draw points in the unit hypercube and push each
//! coordinate through the quantile function of the parameter's distribution,
//! restricted to its `[lower, upper]` bounds.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::SchemaError;

/// Distribution tag of a bounded parameter
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Uniform over the bounds
    #[default]
    Uniform,
    /// Normal distribution truncated to the bounds
    Normal { mean: f64, std_dev: f64 },
    /// Uniform in log space, requires a positive lower bound
    LogUniform,
}

impl Distribution {
    pub fn name(&self) -> &'static str {
        match self {
            Distribution::Uniform => "uniform",
            Distribution::Normal { .. } => "normal",
            Distribution::LogUniform => "log_uniform",
        }
    }
}

/// Quantile function of a distribution restricted to fixed bounds
#[derive(Debug, Clone)]
pub enum QuantileMap {
    Uniform {
        lower: f64,
        width: f64,
    },
    LogUniform {
        ln_lower: f64,
        ln_width: f64,
    },
    TruncatedNormal {
        normal: Normal,
        cdf_lower: f64,
        cdf_upper: f64,
        lower: f64,
        upper: f64,
    },
}

impl QuantileMap {
    /// Prepare the quantile function, validating distribution parameters.
    ///
    /// Bounds are assumed finite and ordered.
    pub fn new(
        parameter: &str,
        distribution: Distribution,
        lower: f64,
        upper: f64,
    ) -> Result<Self, SchemaError> {
        let invalid = |reason| SchemaError::InvalidDistribution {
            parameter: parameter.to_string(),
            distribution: distribution.name(),
            reason,
        };

        match distribution {
            Distribution::Uniform => Ok(QuantileMap::Uniform {
                lower,
                width: upper - lower,
            }),
            Distribution::LogUniform => {
                if lower <= 0.0 {
                    return Err(invalid("lower bound must be positive"));
                }
                let ln_lower = lower.ln();
                Ok(QuantileMap::LogUniform {
                    ln_lower,
                    ln_width: upper.ln() - ln_lower,
                })
            }
            Distribution::Normal { mean, std_dev } => {
                if !mean.is_finite() {
                    return Err(invalid("mean must be finite"));
                }
                if !(std_dev.is_finite() && std_dev > 0.0) {
                    return Err(invalid("std_dev must be positive and finite"));
                }
                let normal =
                    Normal::new(mean, std_dev).map_err(|_| invalid("rejected parameters"))?;
                let cdf_lower = normal.cdf(lower);
                let cdf_upper = normal.cdf(upper);
                if cdf_upper <= cdf_lower {
                    return Err(invalid("bounds carry no probability mass"));
                }
                Ok(QuantileMap::TruncatedNormal {
                    normal,
                    cdf_lower,
                    cdf_upper,
                    lower,
                    upper,
                })
            }
        }
    }

    /// Map a unit-interval coordinate into the parameter's bounds
    pub fn quantile(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        match self {
            QuantileMap::Uniform { lower, width } => lower + u * width,
            QuantileMap::LogUniform { ln_lower, ln_width } => (ln_lower + u * ln_width).exp(),
            QuantileMap::TruncatedNormal {
                normal,
                cdf_lower,
                cdf_upper,
                lower,
                upper,
            } => {
                let p = cdf_lower + u * (cdf_upper - cdf_lower);
                normal.inverse_cdf(p).clamp(*lower, *upper)
            }
        }
    }
}
