//! Exhaustive cartesian product of discrete candidate lists
//!
//! Rows are produced in row-major order over the schema's declaration order:
//! the last declared parameter varies fastest, the first slowest. For
//! `{a: [1, 2], b: [x, y]}` the rows are `(1,x) (1,y) (2,x) (2,y)`.

use crate::error::{Result, SampleCountError};
use crate::schema::{DomainKind, ParameterSchema};
use crate::study::Column;
use crate::value::ParameterValue;

use super::{SampleMatrix, Sampler, SamplerMetadata};

const NAME: &str = "cartesian_product";

/// Largest product the sampler will enumerate
pub const MAX_CARTESIAN_SETS: u64 = 1 << 24;

/// Full cross product of every parameter's candidate values
#[derive(Debug, Clone, Copy, Default)]
pub struct CartesianProduct;

impl Sampler for CartesianProduct {
    fn name(&self) -> &'static str {
        NAME
    }

    fn generate(&self, schema: &ParameterSchema) -> Result<SampleMatrix> {
        let domains = schema.discrete_domains(NAME)?;

        let requested = domains
            .iter()
            .fold(1u64, |acc, (_, values)| acc.saturating_mul(values.len() as u64));
        if requested > MAX_CARTESIAN_SETS {
            return Err(SampleCountError::TooLarge {
                sampler: NAME,
                requested,
                max: MAX_CARTESIAN_SETS,
            }
            .into());
        }
        let total = requested as usize;

        let columns = domains
            .iter()
            .map(|(name, values)| Column {
                name: name.to_string(),
                kind: values[0].kind(),
                domain: DomainKind::Discrete,
            })
            .collect();

        let lists: Vec<&[ParameterValue]> = domains.iter().map(|(_, values)| *values).collect();
        let rows = product_rows(&lists, total);

        Ok(SampleMatrix {
            columns,
            rows,
            metadata: SamplerMetadata::new(NAME, total),
        })
    }
}

/// Enumerate the product by counting in a mixed radix, least significant
/// digit last.
fn product_rows(lists: &[&[ParameterValue]], total: usize) -> Vec<Vec<ParameterValue>> {
    let mut rows = Vec::with_capacity(total);
    let mut indices = vec![0usize; lists.len()];

    loop {
        rows.push(
            indices
                .iter()
                .zip(lists)
                .map(|(&idx, values)| values[idx].clone())
                .collect(),
        );

        let mut carry = true;
        for (index, values) in indices.iter_mut().zip(lists).rev() {
            *index += 1;
            if *index >= values.len() {
                *index = 0;
            } else {
                carry = false;
                break;
            }
        }

        if carry {
            break;
        }
    }

    rows
}
