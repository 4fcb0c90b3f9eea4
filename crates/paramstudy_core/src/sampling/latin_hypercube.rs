//! Latin hypercube sampling
//!
//! Each parameter's unit interval is split into `N` equal-probability strata.
//! For every parameter, in declaration order, the generator draws a random
//! permutation of the strata followed by one uniform jitter per row, so row
//! `i` takes `u = (stratum_i + jitter_i) / N` which is then pushed through the
//! parameter's quantile function. The draw order is fixed, which makes the
//! output a pure function of the schema, `N` and the seed.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::schema::ParameterSchema;
use crate::value::ParameterValue;

use super::{
    SampleMatrix, Sampler, SamplerMetadata, bounded_columns, require_samples, resolve_seed,
};

const NAME: &str = "latin_hypercube";

/// Stratified random sampling over bounded parameters
#[derive(Debug, Clone, Copy)]
pub struct LatinHypercube {
    num_samples: usize,
    seed: Option<u64>,
}

impl LatinHypercube {
    pub fn new(num_samples: usize, seed: Option<u64>) -> Self {
        Self { num_samples, seed }
    }
}

impl Sampler for LatinHypercube {
    fn name(&self) -> &'static str {
        NAME
    }

    fn generate(&self, schema: &ParameterSchema) -> Result<SampleMatrix> {
        require_samples(NAME, self.num_samples)?;
        let params = schema.continuous_domains(NAME)?;

        let seed = resolve_seed(self.seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let n = self.num_samples;

        let columns: Vec<Vec<ParameterValue>> = params
            .iter()
            .map(|param| {
                let mut strata: Vec<usize> = (0..n).collect();
                strata.shuffle(&mut rng);
                strata
                    .into_iter()
                    .map(|stratum| {
                        let jitter: f64 = rng.random();
                        param.value_at((stratum as f64 + jitter) / n as f64)
                    })
                    .collect()
            })
            .collect();

        let rows = (0..n)
            .map(|i| columns.iter().map(|column| column[i].clone()).collect())
            .collect();

        let mut metadata = SamplerMetadata::new(NAME, n);
        metadata.seed = Some(seed);
        tracing::debug!(samples = n, seed, "latin hypercube generated");

        Ok(SampleMatrix {
            columns: bounded_columns(&params, schema),
            rows,
            metadata,
        })
    }
}
