//! Sampling strategies
//!
//! Every strategy turns a [`ParameterSchema`] into a [`SampleMatrix`]: ordered
//! rows of parameter values in schema column order, plus the bookkeeping a
//! later merge or analysis step needs.
//!
//! | Strategy          | Descriptors             | Rows                       |
//! |-------------------|-------------------------|----------------------------|
//! | `CartesianProduct`| discrete                | product of list sizes      |
//! | `LatinHypercube`  | bounded                 | `num_samples`              |
//! | `SobolSequence`   | bounded                 | `num_samples`              |
//! | `Saltelli`        | bounded                 | `N (d + 2)` or `N (2d + 2)`|
//! | `Morris`          | bounded                 | `N (d + 1)`                |

mod cartesian;
mod latin_hypercube;
mod sensitivity;
mod sobol;

pub use cartesian::{CartesianProduct, MAX_CARTESIAN_SETS};
pub use latin_hypercube::LatinHypercube;
pub use sensitivity::{DEFAULT_MORRIS_LEVELS, Morris, Saltelli};
pub use sobol::{MAX_DIMENSIONS, SobolSampler, SobolSequence};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SampleCountError};
use crate::schema::{ContinuousParameter, DomainKind, ParameterSchema};
use crate::study::Column;
use crate::value::{ParameterValue, ValueKind};

/// A sample design algorithm
pub trait Sampler {
    /// Stable identifier recorded in study metadata
    fn name(&self) -> &'static str;

    /// Generate the ordered sample rows for `schema`
    fn generate(&self, schema: &ParameterSchema) -> Result<SampleMatrix>;
}

/// Structure a sensitivity analysis needs to interpret sample rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SensitivityDesign {
    /// Sobol-index design: each base sample expands into `resamples_per_base`
    /// consecutive rows (`A`, `AB_i`, optionally `BA_i`, `B`)
    Saltelli {
        base_samples: usize,
        resamples_per_base: usize,
        calc_second_order: bool,
        skip: u32,
    },
    /// Elementary-effects design: consecutive trajectories of
    /// `points_per_trajectory` rows, one factor moving by `delta` per step
    Morris {
        trajectories: usize,
        levels: usize,
        points_per_trajectory: usize,
        delta: f64,
    },
}

/// Bookkeeping produced alongside the sample rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerMetadata {
    pub sampler: String,
    /// Requested sample count (base samples or trajectories for sensitivity designs)
    pub sample_count: usize,
    /// Seed actually used, recorded even when it was drawn from entropy
    pub seed: Option<u64>,
    pub design: Option<SensitivityDesign>,
}

impl SamplerMetadata {
    pub fn new(sampler: &str, sample_count: usize) -> Self {
        Self {
            sampler: sampler.to_string(),
            sample_count,
            seed: None,
            design: None,
        }
    }
}

/// Output of a sampler: ordered rows in schema column order
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<ParameterValue>>,
    pub metadata: SamplerMetadata,
}

impl SampleMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sampler selection and options, as written in a study configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplerConfig {
    #[default]
    CartesianProduct,
    LatinHypercube {
        num_samples: usize,
        #[serde(default)]
        seed: Option<u64>,
    },
    SobolSequence {
        num_samples: usize,
        #[serde(default)]
        skip: u32,
    },
    Saltelli {
        num_samples: usize,
        #[serde(default = "default_calc_second_order")]
        calc_second_order: bool,
        #[serde(default)]
        skip: u32,
    },
    Morris {
        num_trajectories: usize,
        #[serde(default = "default_morris_levels")]
        num_levels: usize,
        #[serde(default)]
        seed: Option<u64>,
    },
}

fn default_calc_second_order() -> bool {
    true
}

fn default_morris_levels() -> usize {
    DEFAULT_MORRIS_LEVELS
}

impl SamplerConfig {
    /// Instantiate the configured sampler
    pub fn build(&self) -> Box<dyn Sampler> {
        match self {
            SamplerConfig::CartesianProduct => Box::new(CartesianProduct),
            SamplerConfig::LatinHypercube { num_samples, seed } => {
                Box::new(LatinHypercube::new(*num_samples, *seed))
            }
            SamplerConfig::SobolSequence { num_samples, skip } => {
                Box::new(SobolSampler::new(*num_samples).skip(*skip))
            }
            SamplerConfig::Saltelli {
                num_samples,
                calc_second_order,
                skip,
            } => Box::new(
                Saltelli::new(*num_samples)
                    .second_order(*calc_second_order)
                    .skip(*skip),
            ),
            SamplerConfig::Morris {
                num_trajectories,
                num_levels,
                seed,
            } => Box::new(Morris::new(*num_trajectories, *num_levels, *seed)),
        }
    }
}

/// Reject a zero sample count
pub(crate) fn require_samples(sampler: &'static str, count: usize) -> Result<()> {
    if count == 0 {
        return Err(SampleCountError::Zero { sampler }.into());
    }
    Ok(())
}

/// Use the explicit seed, or draw one from entropy so it can be recorded
pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::rng().random())
}

/// Columns for a sampler producing floats from bounded descriptors
pub(crate) fn bounded_columns(
    params: &[ContinuousParameter],
    schema: &ParameterSchema,
) -> Vec<Column> {
    params
        .iter()
        .map(|p| Column {
            name: p.name.clone(),
            kind: ValueKind::Float,
            domain: schema
                .get(&p.name)
                .map(|d| d.kind())
                .unwrap_or(DomainKind::Bounded),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_config_from_json() {
        let config: SamplerConfig =
            serde_json::from_str(r#"{"kind": "latin_hypercube", "num_samples": 8, "seed": 3}"#)
                .unwrap();
        assert_eq!(
            config,
            SamplerConfig::LatinHypercube {
                num_samples: 8,
                seed: Some(3)
            }
        );
        assert_eq!(config.build().name(), "latin_hypercube");

        let morris: SamplerConfig =
            serde_json::from_str(r#"{"kind": "morris", "num_trajectories": 4}"#).unwrap();
        assert_eq!(
            morris,
            SamplerConfig::Morris {
                num_trajectories: 4,
                num_levels: DEFAULT_MORRIS_LEVELS,
                seed: None
            }
        );
    }

    #[test]
    fn test_design_metadata_serializes_with_method_tag() {
        let design = SensitivityDesign::Saltelli {
            base_samples: 4,
            resamples_per_base: 6,
            calc_second_order: true,
            skip: 0,
        };
        let json = serde_json::to_value(&design).unwrap();
        assert_eq!(json["method"], "saltelli");
        assert_eq!(json["resamples_per_base"], 6);
    }
}
