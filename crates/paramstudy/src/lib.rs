//! Parametric study generator
//!
//! This crate wraps the `paramstudy_core` engine with everything that
//! touches the outside world:
//! - YAML study configuration (`config`)
//! - The versioned JSON study file with atomic writes (`store`)
//! - The generate → merge → write pipeline (`generator`)
//! - `tracing` subscriber setup (`logging`)
//!
//! ```ignore
//! use paramstudy::{ParameterGenerator, StudyConfig};
//!
//! let config = StudyConfig::load(Path::new("study.yaml"))?;
//! let generated = ParameterGenerator::new(config).generate()?;
//! generated.write_if_changed(Path::new("study.json"), false)?;
//! for set in generated.query().iter() {
//!     println!("{}", set.name());
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod store;
pub mod util;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::StudyConfig;
pub use error::{Error, Result};
pub use generator::{DEFAULT_SET_FILE_TEMPLATE, GeneratedStudy, ParameterGenerator};
pub use paramstudy_core as core;
