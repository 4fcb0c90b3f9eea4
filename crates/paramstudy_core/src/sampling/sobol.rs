//! Sobol low-discrepancy sequence
//!
//! Gray-code construction with 32-bit direction numbers. Dimension 0 is the
//! van der Corput sequence in base 2; dimensions 1.. use the Joe and Kuo
//! primitive polynomials and initial direction numbers. Point `n` is the XOR
//! of the direction numbers selected by the bits of `gray(n) = n ^ (n >> 1)`,
//! so the sequence starts at the origin followed by `0.5` in every dimension.
//!
//! For any `k`, the first `2^k` points place exactly one coordinate in each
//! interval `[j / 2^k, (j + 1) / 2^k)` of every dimension.

use crate::error::{Result, SampleCountError, SamplerError};
use crate::schema::ParameterSchema;

use super::{SampleMatrix, Sampler, SamplerMetadata, bounded_columns, require_samples};

/// Highest supported dimension count
pub const MAX_DIMENSIONS: usize = 21;

const BITS: usize = 32;

const NAME: &str = "sobol_sequence";

/// `(degree, interior coefficients, initial direction numbers)` for
/// dimensions 1..MAX_DIMENSIONS
const JOE_KUO: [(usize, u32, &[u32]); MAX_DIMENSIONS - 1] = [
    (1, 0, &[1]),
    (2, 1, &[1, 3]),
    (3, 1, &[1, 3, 1]),
    (3, 2, &[1, 1, 1]),
    (4, 1, &[1, 1, 3, 3]),
    (4, 4, &[1, 3, 5, 13]),
    (5, 2, &[1, 1, 5, 5, 17]),
    (5, 4, &[1, 1, 5, 5, 5]),
    (5, 7, &[1, 1, 7, 11, 19]),
    (5, 11, &[1, 1, 5, 1, 1]),
    (5, 13, &[1, 1, 1, 3, 11]),
    (5, 14, &[1, 3, 5, 5, 31]),
    (6, 1, &[1, 3, 3, 9, 7, 49]),
    (6, 13, &[1, 1, 1, 15, 21, 21]),
    (6, 16, &[1, 3, 1, 13, 27, 49]),
    (6, 19, &[1, 1, 1, 15, 7, 5]),
    (6, 22, &[1, 3, 1, 15, 13, 25]),
    (6, 25, &[1, 1, 5, 5, 19, 61]),
    (7, 1, &[1, 3, 7, 11, 23, 15, 103]),
    (7, 4, &[1, 3, 7, 13, 13, 15, 69]),
];

fn van_der_corput() -> [u32; BITS] {
    let mut v = [0u32; BITS];
    for (c, slot) in v.iter_mut().enumerate() {
        *slot = 1u32 << (31 - c);
    }
    v
}

/// Expand initial direction numbers with the polynomial recurrence
/// `v[c] = v[c-s] ^ (v[c-s] >> s) ^ XOR_k a_k v[c-k]`.
fn joe_kuo_directions(degree: usize, coefficients: u32, initial: &[u32]) -> [u32; BITS] {
    let mut v = [0u32; BITS];
    for (c, m) in initial.iter().enumerate() {
        v[c] = m << (31 - c);
    }
    for c in degree..BITS {
        let mut value = v[c - degree] ^ (v[c - degree] >> degree);
        for k in 1..degree {
            if (coefficients >> (degree - 1 - k)) & 1 == 1 {
                value ^= v[c - k];
            }
        }
        v[c] = value;
    }
    v
}

/// Deterministic Sobol point generator over `[0, 1)^d`
#[derive(Debug, Clone)]
pub struct SobolSequence {
    directions: Vec<[u32; BITS]>,
}

impl SobolSequence {
    /// Generator for `dimensions` coordinates, `None` outside `1..=MAX_DIMENSIONS`
    pub fn new(dimensions: usize) -> Option<Self> {
        if dimensions == 0 || dimensions > MAX_DIMENSIONS {
            return None;
        }
        let mut directions = Vec::with_capacity(dimensions);
        directions.push(van_der_corput());
        for &(degree, coefficients, initial) in JOE_KUO.iter().take(dimensions - 1) {
            directions.push(joe_kuo_directions(degree, coefficients, initial));
        }
        Some(Self { directions })
    }

    pub fn dimensions(&self) -> usize {
        self.directions.len()
    }

    /// The point at `index` in Gray-code order
    pub fn point(&self, index: u32) -> Vec<f64> {
        let gray = index ^ (index >> 1);
        self.directions
            .iter()
            .map(|v| {
                let mut x = 0u32;
                let mut bits = gray;
                while bits != 0 {
                    let c = bits.trailing_zeros() as usize;
                    x ^= v[c];
                    bits &= bits - 1;
                }
                f64::from(x) / 4_294_967_296.0
            })
            .collect()
    }

    /// `count` consecutive points starting at index `skip`
    pub fn points(&self, skip: u32, count: u32) -> impl Iterator<Item = Vec<f64>> + '_ {
        (skip..skip.saturating_add(count)).map(move |i| self.point(i))
    }
}

/// Validate a point range for a sampler and return the point count as `u32`
pub(crate) fn point_range(sampler: &'static str, skip: u32, count: usize) -> Result<u32> {
    let max = u64::from(u32::MAX) - u64::from(skip);
    match u32::try_from(count) {
        Ok(n) if u64::from(n) <= max => Ok(n),
        _ => Err(SampleCountError::TooLarge {
            sampler,
            requested: count as u64,
            max,
        }
        .into()),
    }
}

/// Build a sequence or report the dimension limit for `sampler`
pub(crate) fn sequence_for(sampler: &'static str, dimensions: usize) -> Result<SobolSequence> {
    SobolSequence::new(dimensions).ok_or_else(|| {
        SamplerError::TooManyDimensions {
            sampler,
            requested: dimensions,
            max: MAX_DIMENSIONS,
        }
        .into()
    })
}

/// First `num_samples` Sobol points mapped onto the parameter bounds
#[derive(Debug, Clone, Copy)]
pub struct SobolSampler {
    num_samples: usize,
    skip: u32,
}

impl SobolSampler {
    pub fn new(num_samples: usize) -> Self {
        Self {
            num_samples,
            skip: 0,
        }
    }

    /// Start the sequence at index `skip`
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }
}

impl Sampler for SobolSampler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn generate(&self, schema: &ParameterSchema) -> Result<SampleMatrix> {
        require_samples(NAME, self.num_samples)?;
        let params = schema.continuous_domains(NAME)?;
        let sequence = sequence_for(NAME, params.len())?;
        let count = point_range(NAME, self.skip, self.num_samples)?;

        let rows = sequence
            .points(self.skip, count)
            .map(|point| {
                point
                    .iter()
                    .zip(&params)
                    .map(|(&u, param)| param.value_at(u))
                    .collect()
            })
            .collect();

        Ok(SampleMatrix {
            columns: bounded_columns(&params, schema),
            rows,
            metadata: SamplerMetadata::new(NAME, self.num_samples),
        })
    }
}
