//! Tests for merging new generations into a previous study
//!
//! These tests verify:
//! - The `global_seed` extension scenario
//! - Idempotent regeneration
//! - Schema conflicts leave the previous study untouched
//! - Quantities of interest survive merges
//! - An exhausted naming index is reported, not wrapped

use crate::error::{NameIndexExhaustedError, SchemaConflictError, StudyError};
use crate::identity::{MergeOptions, merge_study};
use crate::sampling::{CartesianProduct, LatinHypercube, Sampler};
use crate::schema::{ParameterSchema, SchemaBuilder};
use crate::study::{ParameterStudy, QuantityColumn};
use crate::value::ParameterValue;

fn seeds_schema(seeds: &[f64]) -> ParameterSchema {
    SchemaBuilder::new()
        .discrete("width", [1.0])
        .discrete("height", [1.0])
        .discrete("global_seed", seeds.iter().copied())
        .build()
        .unwrap()
}

fn generate(schema: &ParameterSchema, previous: Option<&ParameterStudy>) -> ParameterStudy {
    let samples = CartesianProduct.generate(schema).unwrap();
    merge_study(previous, &samples, &MergeOptions::default())
        .unwrap()
        .study
}

fn mapping(study: &ParameterStudy) -> Vec<(String, Vec<ParameterValue>)> {
    study
        .sets()
        .iter()
        .map(|s| (s.name().to_string(), s.values().to_vec()))
        .collect()
}

/// Adding a `global_seed` value appends exactly one set
#[test]
fn test_global_seed_extension() {
    let first = generate(&seeds_schema(&[1.0, 0.5, 0.25, 0.125]), None);
    let names: Vec<_> = first.set_names().collect();
    assert_eq!(
        names,
        vec![
            "parameter_set0",
            "parameter_set1",
            "parameter_set2",
            "parameter_set3"
        ]
    );
    for (i, seed) in [1.0, 0.5, 0.25, 0.125].into_iter().enumerate() {
        let name = format!("parameter_set{i}");
        assert_eq!(
            first.value(&name, "global_seed"),
            Some(&ParameterValue::Float(seed))
        );
        assert_eq!(first.value(&name, "width"), Some(&ParameterValue::Float(1.0)));
    }

    let second = generate(
        &seeds_schema(&[1.0, 0.5, 0.25, 0.125, 0.0625]),
        Some(&first),
    );
    assert_eq!(second.len(), 5);
    assert_eq!(mapping(&second)[..4], mapping(&first)[..]);
    assert_eq!(
        second.value("parameter_set4", "global_seed"),
        Some(&ParameterValue::Float(0.0625))
    );
}

/// Regenerating against the just-produced study assigns nothing new
#[test]
fn test_regeneration_is_idempotent() {
    let schema = SchemaBuilder::new()
        .discrete("mesh", ["coarse", "fine"])
        .discrete("load", [1, 2, 3])
        .build()
        .unwrap();
    let samples = CartesianProduct.generate(&schema).unwrap();
    let first = merge_study(None, &samples, &MergeOptions::default()).unwrap();
    let second = merge_study(Some(&first.study), &samples, &MergeOptions::default()).unwrap();

    assert!(second.new_set_names.is_empty());
    assert_eq!(second.reused, samples.len());
    assert_eq!(second.study, first.study);
}

/// Seeded Latin hypercube regenerations reuse every set
#[test]
fn test_seeded_latin_hypercube_is_idempotent() {
    let schema = SchemaBuilder::new()
        .bounded("x", 0.0, 1.0)
        .bounded("y", -5.0, 5.0)
        .build()
        .unwrap();
    let sampler = LatinHypercube::new(12, Some(2024));
    let first = merge_study(
        None,
        &sampler.generate(&schema).unwrap(),
        &MergeOptions::default(),
    )
    .unwrap();
    let second = merge_study(
        Some(&first.study),
        &sampler.generate(&schema).unwrap(),
        &MergeOptions::default(),
    )
    .unwrap();

    assert!(second.new_set_names.is_empty());
    assert_eq!(mapping(&second.study), mapping(&first.study));
    assert_eq!(second.study.metadata().seed, Some(2024));
}

/// Dropping a parameter is a conflict rather than a silent reinterpretation
#[test]
fn test_removed_parameter_conflicts() {
    let first = generate(&seeds_schema(&[1.0, 0.5]), None);
    let before = first.clone();

    let narrowed = SchemaBuilder::new()
        .discrete("width", [1.0])
        .discrete("height", [1.0])
        .build()
        .unwrap();
    let samples = CartesianProduct.generate(&narrowed).unwrap();
    let err = merge_study(Some(&first), &samples, &MergeOptions::default()).unwrap_err();

    assert_eq!(
        err,
        StudyError::SchemaConflict(SchemaConflictError::RemovedParameter(
            "global_seed".into()
        ))
    );
    assert_eq!(first, before);
}

/// Removed candidate values keep their sets and never free their index
#[test]
fn test_shrinking_candidates_keeps_existing_sets() {
    let first = generate(&seeds_schema(&[1.0, 0.5, 0.25]), None);
    let second = generate(&seeds_schema(&[0.5]), Some(&first));
    assert_eq!(mapping(&second), mapping(&first));
    assert_eq!(
        second.metadata().sample_set_names,
        vec!["parameter_set1".to_string()]
    );

    let third = generate(&seeds_schema(&[0.5, 2.0]), Some(&second));
    assert_eq!(third.set_names().last(), Some("parameter_set3"));
}

/// Downstream quantities are carried through and padded for new sets
#[test]
fn test_quantities_survive_merge() {
    let first = generate(&seeds_schema(&[1.0, 0.5]), None);
    let with_results = ParameterStudy::from_parts(
        first.columns().to_vec(),
        first.set_names().map(String::from).collect(),
        first.sets().iter().map(|s| s.values().to_vec()).collect(),
        vec![QuantityColumn {
            name: "max_stress".into(),
            values: vec![serde_json::json!(101.5), serde_json::json!(99.0)],
        }],
        first.metadata().clone(),
    )
    .unwrap();

    let second = generate(&seeds_schema(&[1.0, 0.5, 0.25]), Some(&with_results));
    let view = second.query();
    assert_eq!(
        view.get("parameter_set0").unwrap().quantity("max_stress"),
        Some(&serde_json::json!(101.5))
    );
    assert_eq!(
        view.get("parameter_set2").unwrap().quantity("max_stress"),
        Some(&serde_json::Value::Null)
    );
}

/// A previous study whose recorded index cannot advance fails the merge
/// instead of wrapping back onto existing names
#[test]
fn test_exhausted_set_index_is_an_error() {
    let schema = SchemaBuilder::new().discrete("a", [1]).build().unwrap();
    let mut previous = generate(&schema, None);
    previous.metadata.next_set_index = u64::MAX;
    let snapshot = previous.clone();

    let extended = SchemaBuilder::new().discrete("a", [1, 2, 3]).build().unwrap();
    let samples = CartesianProduct.generate(&extended).unwrap();
    let err = merge_study(Some(&previous), &samples, &MergeOptions::default()).unwrap_err();
    assert_eq!(
        err,
        StudyError::NameIndexExhausted(NameIndexExhaustedError {
            template: "parameter_set@number".into(),
            next_index: u64::MAX,
        })
    );
    assert_eq!(previous, snapshot);

    // Nothing new to name, so the merge still succeeds
    let same = CartesianProduct.generate(&schema).unwrap();
    let unchanged = merge_study(Some(&previous), &same, &MergeOptions::default()).unwrap();
    assert!(unchanged.new_set_names.is_empty());
}

/// A set name carrying the largest index also exhausts the template
#[test]
fn test_maximal_parsed_index_is_an_error() {
    let schema = SchemaBuilder::new().discrete("a", [1]).build().unwrap();
    let first = generate(&schema, None);
    let previous = ParameterStudy::from_parts(
        first.columns().to_vec(),
        vec![format!("parameter_set{}", u64::MAX)],
        vec![vec![ParameterValue::Integer(1)]],
        Vec::new(),
        first.metadata().clone(),
    )
    .unwrap();

    let extended = SchemaBuilder::new().discrete("a", [1, 2]).build().unwrap();
    let samples = CartesianProduct.generate(&extended).unwrap();
    let err = merge_study(Some(&previous), &samples, &MergeOptions::default()).unwrap_err();
    assert!(matches!(err, StudyError::NameIndexExhausted(_)));
}
