//! Scenario tests for the parameter study engine
//!
//! Tests are organized by topic:
//! - `merge` - Idempotent and monotonic merges against a previous study
//! - `samplers` - Sampler determinism and cross-sampler behavior
//! - `properties` - Property-based merge invariants

mod merge;
