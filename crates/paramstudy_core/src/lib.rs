//! Parametric study generation engine
//!
//! This crate turns a declarative parameter schema into a reproducible,
//! identity-stable collection of named parameter sets. It supports:
//! - Discrete and bounded parameter domains with uniform, truncated normal
//!   and log-uniform distributions
//! - Cartesian product, Latin hypercube and Sobol sampling
//! - Saltelli and Morris designs for sensitivity analysis
//! - Merging a new generation into a previous study without renaming or
//!   altering any set that already exists
//!
//! The crate performs no I/O; persistence lives in the `paramstudy` crate.
//!
//! ```ignore
//! use paramstudy_core::{CartesianProduct, MergeOptions, Sampler, SchemaBuilder, merge_study};
//!
//! let schema = SchemaBuilder::new()
//!     .discrete("width", [1.0])
//!     .discrete("global_seed", [1.0, 0.5, 0.25, 0.125])
//!     .build()?;
//! let samples = CartesianProduct.generate(&schema)?;
//! let outcome = merge_study(None, &samples, &MergeOptions::default())?;
//! for set in outcome.study.query().iter() {
//!     println!("{}: {:?}", set.name(), set.get("global_seed"));
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod identity;
pub mod query;
pub mod sampling;
pub mod study;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod distribution;
pub mod schema;
pub mod value;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use distribution::Distribution;
pub use error::{
    CorruptStudyError, DuplicateNameError, NameIndexExhaustedError, Result, SampleCountError,
    SamplerError, SchemaConflictError, SchemaError, StudyError,
};
pub use identity::{
    DEFAULT_FLOAT_TOLERANCE, DEFAULT_SET_NAME_TEMPLATE, IdentityAssigner, MergeOptions,
    MergeOutcome, NamingTemplate, SET_NUMBER_PLACEHOLDER, merge_study,
};
pub use query::{ParameterSetView, StudyView};
pub use sampling::{
    CartesianProduct, LatinHypercube, Morris, SampleMatrix, Sampler, SamplerConfig,
    SamplerMetadata, Saltelli, SensitivityDesign, SobolSampler, SobolSequence,
};
pub use schema::{Domain, DomainKind, ParameterSchema, RawSchema, SchemaBuilder};
pub use study::{Column, ParameterSet, ParameterStudy, QuantityColumn, StudyMetadata};
pub use value::{ParameterValue, ValueKind};
