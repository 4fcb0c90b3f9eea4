//! Sample designs for global sensitivity analysis
//!
//! Both designs emit rows in blocks that a downstream analysis reads back by
//! position, so the block layout is recorded in [`SensitivityDesign`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SamplerError};
use crate::schema::{ContinuousParameter, ParameterSchema};
use crate::value::ParameterValue;

use super::sobol::{MAX_DIMENSIONS, point_range, sequence_for};
use super::{
    SampleMatrix, Sampler, SamplerMetadata, SensitivityDesign, bounded_columns, require_samples,
    resolve_seed,
};

/// Grid levels used by the Morris design when none are configured
pub const DEFAULT_MORRIS_LEVELS: usize = 4;

const SALTELLI: &str = "saltelli";
const MORRIS: &str = "morris";

fn map_point(params: &[ContinuousParameter], point: &[f64]) -> Vec<ParameterValue> {
    point
        .iter()
        .zip(params)
        .map(|(&u, param)| param.value_at(u))
        .collect()
}

// ============================================================================
// Saltelli
// ============================================================================

/// Saltelli extension of a Sobol sequence for first, total and optionally
/// second order indices.
///
/// Each base point of a `2d`-dimensional Sobol sequence is split into two
/// matrices `A` (first `d` coordinates) and `B` (last `d`). The base expands
/// into the block `A, AB_1..AB_d, [BA_1..BA_d,] B` where `AB_k` is `A` with
/// column `k` taken from `B`.
#[derive(Debug, Clone, Copy)]
pub struct Saltelli {
    base_samples: usize,
    calc_second_order: bool,
    skip: u32,
}

impl Saltelli {
    pub fn new(base_samples: usize) -> Self {
        Self {
            base_samples,
            calc_second_order: true,
            skip: 0,
        }
    }

    /// Include the `BA_k` rows needed for second order indices
    pub fn second_order(mut self, enabled: bool) -> Self {
        self.calc_second_order = enabled;
        self
    }

    /// Start the underlying Sobol sequence at index `skip`
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    fn resamples_per_base(&self, dimensions: usize) -> usize {
        if self.calc_second_order {
            2 * dimensions + 2
        } else {
            dimensions + 2
        }
    }
}

impl Sampler for Saltelli {
    fn name(&self) -> &'static str {
        SALTELLI
    }

    fn generate(&self, schema: &ParameterSchema) -> Result<SampleMatrix> {
        require_samples(SALTELLI, self.base_samples)?;
        let params = schema.continuous_domains(SALTELLI)?;
        let d = params.len();
        if 2 * d > MAX_DIMENSIONS {
            return Err(SamplerError::TooManyDimensions {
                sampler: SALTELLI,
                requested: d,
                max: MAX_DIMENSIONS / 2,
            }
            .into());
        }
        if !self.base_samples.is_power_of_two() {
            tracing::warn!(
                base_samples = self.base_samples,
                "saltelli base sample count is not a power of two, convergence may suffer"
            );
        }

        let sequence = sequence_for(SALTELLI, 2 * d)?;
        let count = point_range(SALTELLI, self.skip, self.base_samples)?;
        let per_base = self.resamples_per_base(d);

        let mut rows = Vec::with_capacity(self.base_samples * per_base);
        for base in sequence.points(self.skip, count) {
            let (a, b) = base.split_at(d);
            rows.push(map_point(&params, a));
            for k in 0..d {
                let mut ab = a.to_vec();
                ab[k] = b[k];
                rows.push(map_point(&params, &ab));
            }
            if self.calc_second_order {
                for k in 0..d {
                    let mut ba = b.to_vec();
                    ba[k] = a[k];
                    rows.push(map_point(&params, &ba));
                }
            }
            rows.push(map_point(&params, b));
        }

        let mut metadata = SamplerMetadata::new(SALTELLI, self.base_samples);
        metadata.design = Some(SensitivityDesign::Saltelli {
            base_samples: self.base_samples,
            resamples_per_base: per_base,
            calc_second_order: self.calc_second_order,
            skip: self.skip,
        });
        tracing::debug!(rows = rows.len(), per_base, "saltelli design generated");

        Ok(SampleMatrix {
            columns: bounded_columns(&params, schema),
            rows,
            metadata,
        })
    }
}

// ============================================================================
// Morris
// ============================================================================

/// Morris elementary-effects trajectories on a `p`-level grid.
///
/// Each trajectory has `d + 1` points. Starting from a random grid point, one
/// factor per step moves by `delta = p / (2 (p - 1))` in a random direction,
/// visiting the factors in a random order, so consecutive points differ in
/// exactly one coordinate.
#[derive(Debug, Clone, Copy)]
pub struct Morris {
    trajectories: usize,
    levels: usize,
    seed: Option<u64>,
}

impl Morris {
    pub fn new(trajectories: usize, levels: usize, seed: Option<u64>) -> Self {
        Self {
            trajectories,
            levels,
            seed,
        }
    }

    fn delta(&self) -> f64 {
        self.levels as f64 / (2.0 * (self.levels as f64 - 1.0))
    }

    /// One trajectory in unit coordinates
    fn trajectory(&self, d: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
        let step = 1.0 / (self.levels as f64 - 1.0);
        let delta = self.delta();

        let base: Vec<f64> = (0..d)
            .map(|_| rng.random_range(0..self.levels / 2) as f64 * step)
            .collect();
        let upward: Vec<bool> = (0..d).map(|_| rng.random()).collect();
        let mut order: Vec<usize> = (0..d).collect();
        order.shuffle(rng);

        let mut current: Vec<f64> = base
            .iter()
            .zip(&upward)
            .map(|(&x, &up)| if up { x } else { x + delta })
            .collect();

        let mut points = Vec::with_capacity(d + 1);
        points.push(current.clone());
        for &factor in &order {
            if upward[factor] {
                current[factor] += delta;
            } else {
                current[factor] -= delta;
            }
            points.push(current.clone());
        }
        points
    }
}

impl Sampler for Morris {
    fn name(&self) -> &'static str {
        MORRIS
    }

    fn generate(&self, schema: &ParameterSchema) -> Result<SampleMatrix> {
        if self.levels < 2 || self.levels % 2 != 0 {
            return Err(SamplerError::InvalidOption {
                sampler: MORRIS,
                option: "num_levels",
                reason: format!("must be an even number of at least 2, got {}", self.levels),
            }
            .into());
        }
        require_samples(MORRIS, self.trajectories)?;
        let params = schema.continuous_domains(MORRIS)?;
        let d = params.len();

        let seed = resolve_seed(self.seed);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut rows = Vec::with_capacity(self.trajectories * (d + 1));
        for _ in 0..self.trajectories {
            for point in self.trajectory(d, &mut rng) {
                rows.push(map_point(&params, &point));
            }
        }

        let mut metadata = SamplerMetadata::new(MORRIS, self.trajectories);
        metadata.seed = Some(seed);
        metadata.design = Some(SensitivityDesign::Morris {
            trajectories: self.trajectories,
            levels: self.levels,
            points_per_trajectory: d + 1,
            delta: self.delta(),
        });
        tracing::debug!(rows = rows.len(), seed, "morris trajectories generated");

        Ok(SampleMatrix {
            columns: bounded_columns(&params, schema),
            rows,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SampleCountError, StudyError};
    use crate::schema::SchemaBuilder;

    fn unit_schema(d: usize) -> ParameterSchema {
        (0..d)
            .fold(SchemaBuilder::new(), |b, i| b.bounded(format!("x{i}"), 0.0, 1.0))
            .build()
            .unwrap()
    }

    fn floats(row: &[ParameterValue]) -> Vec<f64> {
        row.iter().map(|v| v.as_f64().unwrap()).collect()
    }

    #[test]
    fn test_saltelli_row_count() {
        let schema = unit_schema(3);
        let with_second = Saltelli::new(8).generate(&schema).unwrap();
        assert_eq!(with_second.len(), 8 * (2 * 3 + 2));

        let first_only = Saltelli::new(8).second_order(false).generate(&schema).unwrap();
        assert_eq!(first_only.len(), 8 * (3 + 2));
        assert_eq!(
            first_only.metadata.design,
            Some(SensitivityDesign::Saltelli {
                base_samples: 8,
                resamples_per_base: 5,
                calc_second_order: false,
                skip: 0,
            })
        );
    }

    #[test]
    fn test_saltelli_block_structure() {
        let d = 2;
        let samples = Saltelli::new(4).skip(3).generate(&unit_schema(d)).unwrap();
        let per_base = 2 * d + 2;
        for block in samples.rows.chunks(per_base) {
            let a = floats(&block[0]);
            let b = floats(&block[per_base - 1]);
            for k in 0..d {
                let ab = floats(&block[1 + k]);
                let ba = floats(&block[1 + d + k]);
                for j in 0..d {
                    assert_eq!(ab[j], if j == k { b[j] } else { a[j] });
                    assert_eq!(ba[j], if j == k { a[j] } else { b[j] });
                }
            }
        }
    }

    #[test]
    fn test_saltelli_dimension_limit() {
        let err = Saltelli::new(4).generate(&unit_schema(11)).unwrap_err();
        assert_eq!(
            err,
            StudyError::Sampler(SamplerError::TooManyDimensions {
                sampler: SALTELLI,
                requested: 11,
                max: 10,
            })
        );
    }

    #[test]
    fn test_morris_trajectories_move_one_factor() {
        let d = 3;
        let samples = Morris::new(5, 4, Some(11)).generate(&unit_schema(d)).unwrap();
        assert_eq!(samples.len(), 5 * (d + 1));
        let delta = 4.0 / 6.0;

        for trajectory in samples.rows.chunks(d + 1) {
            let mut moved = Vec::new();
            for pair in trajectory.windows(2) {
                let before = floats(&pair[0]);
                let after = floats(&pair[1]);
                let changed: Vec<usize> = (0..d).filter(|&j| before[j] != after[j]).collect();
                assert_eq!(changed.len(), 1);
                let j = changed[0];
                assert!(((after[j] - before[j]).abs() - delta).abs() < 1e-12);
                moved.push(j);
            }
            moved.sort_unstable();
            assert_eq!(moved, (0..d).collect::<Vec<_>>());
            for row in trajectory {
                assert!(floats(row).iter().all(|x| (0.0..=1.0).contains(x)));
            }
        }
        assert_eq!(samples.metadata.seed, Some(11));
    }

    #[test]
    fn test_morris_is_reproducible() {
        let schema = unit_schema(2);
        let a = Morris::new(3, 6, Some(5)).generate(&schema).unwrap();
        let b = Morris::new(3, 6, Some(5)).generate(&schema).unwrap();
        assert_eq!(a.rows, b.rows);
    }

    #[test]
    fn test_morris_rejects_odd_levels() {
        let err = Morris::new(2, 3, Some(1))
            .generate(&unit_schema(2))
            .unwrap_err();
        assert!(matches!(
            err,
            StudyError::Sampler(SamplerError::InvalidOption {
                option: "num_levels",
                ..
            })
        ));

        let err = Morris::new(0, 4, Some(1))
            .generate(&unit_schema(2))
            .unwrap_err();
        assert!(matches!(
            err,
            StudyError::SampleCount(SampleCountError::Zero { .. })
        ));
    }
}
