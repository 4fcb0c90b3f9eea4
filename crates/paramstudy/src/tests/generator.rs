//! Tests for the generate → merge → write pipeline
//!
//! These tests verify:
//! - The `global_seed` scenario end to end through a study file
//! - Missing previous studies
//! - Seed replay for unseeded samplers
//! - Per-set files, including names that cannot be file names

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use paramstudy_core::{ParameterValue, SamplerConfig};
use serde_json::Value;
use tempfile::tempdir;

use crate::config::StudyConfig;
use crate::error::Error;
use crate::generator::{DEFAULT_SET_FILE_TEMPLATE, ParameterGenerator};
use crate::store;

fn seeds_config(seeds: &str, previous: &Path) -> StudyConfig {
    let yaml = format!(
        "parameters:\n  width: [1.0]\n  height: [1.0]\n  global_seed: {seeds}\nprevious_study: {}\n",
        previous.display()
    );
    StudyConfig::from_yaml_str(&yaml).unwrap()
}

#[test]
fn test_global_seed_scenario_through_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("study.json");

    let first = ParameterGenerator::new(seeds_config("[1.0, 0.5, 0.25, 0.125]", &path))
        .generate()
        .unwrap();
    assert_eq!(first.new_set_names().len(), 4);
    first.write(&path).unwrap();

    let second = ParameterGenerator::new(seeds_config("[1.0, 0.5, 0.25, 0.125, 0.0625]", &path))
        .generate()
        .unwrap();
    assert_eq!(second.new_set_names(), ["parameter_set4".to_string()]);
    assert_eq!(second.reused(), 4);
    for set in first.study().sets() {
        assert_eq!(second.study().get(set.name()), Some(set));
    }
    assert_eq!(
        second.query().value("parameter_set4", "global_seed"),
        Some(&ParameterValue::Float(0.0625))
    );
}

#[test]
fn test_regeneration_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("study.json");
    let config = seeds_config("[1.0, 0.5]", &path);

    let first = ParameterGenerator::new(config.clone()).generate().unwrap();
    assert!(first.write_if_changed(&path, false).unwrap());
    let written = fs::read_to_string(&path).unwrap();

    let second = ParameterGenerator::new(config).generate().unwrap();
    assert!(second.new_set_names().is_empty());
    assert!(!second.write_if_changed(&path, false).unwrap());
    assert_eq!(fs::read_to_string(&path).unwrap(), written);

    assert!(second.write_if_changed(&path, true).unwrap());
}

#[test]
fn test_missing_previous_study() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    let mut config = seeds_config("[1.0]", &missing);
    let fresh = ParameterGenerator::new(config.clone()).generate().unwrap();
    assert_eq!(fresh.study().len(), 1);

    config.require_previous_study = true;
    let err = ParameterGenerator::new(config).generate().unwrap_err();
    assert!(matches!(err, Error::MissingPreviousStudy(p) if p == missing));
}

#[test]
fn test_unseeded_latin_hypercube_replays_recorded_seed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("study.json");

    let mut config = StudyConfig::from_yaml_str(
        "sampler: {kind: latin_hypercube, num_samples: 6}\nparameters:\n  x: {lower: 0.0, upper: 1.0}\n  y: {lower: 10.0, upper: 20.0}\n",
    )
    .unwrap();
    config.previous_study = Some(path.clone());

    let first = ParameterGenerator::new(config.clone()).generate().unwrap();
    let seed = first.study().metadata().seed;
    assert!(seed.is_some());
    first.write(&path).unwrap();

    let second = ParameterGenerator::new(config.clone()).generate().unwrap();
    assert!(second.new_set_names().is_empty());
    assert_eq!(second.study().metadata().seed, seed);

    let reseeded = StudyConfig {
        sampler: SamplerConfig::LatinHypercube {
            num_samples: 6,
            seed: seed.map(|s| s.wrapping_add(1)),
        },
        ..config
    };
    let third = ParameterGenerator::new(reseeded).generate().unwrap();
    assert_eq!(third.new_set_names().len(), 6);
    assert_eq!(third.study().len(), 12);
}

#[test]
fn test_set_files() {
    let dir = tempdir().unwrap();
    let config = StudyConfig::from_yaml_str(
        "parameters:\n  mesh: [coarse, fine]\n  load: [10]\n",
    )
    .unwrap();
    let generated = ParameterGenerator::new(config).generate().unwrap();

    let paths = generated
        .write_set_files(&dir.path().join("sets"), DEFAULT_SET_FILE_TEMPLATE)
        .unwrap();
    assert_eq!(
        paths,
        vec![
            dir.path().join("sets").join("parameter_set0.yaml"),
            dir.path().join("sets").join("parameter_set1.yaml"),
        ]
    );
    let content = fs::read_to_string(&paths[1]).unwrap();
    let values: BTreeMap<String, ParameterValue> = serde_saphyr::from_str(&content).unwrap();
    assert_eq!(values["mesh"], ParameterValue::Text("fine".into()));
    assert_eq!(values["load"], ParameterValue::Integer(10));

    let numbered = generated
        .write_set_files(dir.path(), "case_@number/input.yaml")
        .unwrap();
    assert!(numbered[0].ends_with("case_0/input.yaml"));

    assert!(matches!(
        generated.write_set_files(dir.path(), "input.yaml"),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_conflict_keeps_previous_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("study.json");
    ParameterGenerator::new(seeds_config("[1.0, 0.5]", &path))
        .generate()
        .unwrap()
        .write(&path)
        .unwrap();
    let before = fs::read(&path).unwrap();

    let narrowed = StudyConfig::from_yaml_str(&format!(
        "parameters:\n  width: [1.0]\n  height: [1.0]\nprevious_study: {}\n",
        path.display()
    ))
    .unwrap();
    let err = ParameterGenerator::new(narrowed).generate().unwrap_err();
    assert!(matches!(
        err,
        Error::Study(paramstudy_core::StudyError::SchemaConflict(_))
    ));
    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(store::read(&path).unwrap().len(), 2);
}

#[test]
fn test_set_file_names_stay_inside_dir() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("study.json");
    let config = || {
        StudyConfig::from_yaml_str(&format!(
            "parameters: {{a: [1, 2]}}\nprevious_study: {}\n",
            path.display()
        ))
        .unwrap()
    };
    ParameterGenerator::new(config())
        .generate()
        .unwrap()
        .write(&path)
        .unwrap();

    // Set names are not covered by the set hashes
    let mut document: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    document["set_names"][1] = Value::from("../escape");
    fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();

    let generated = ParameterGenerator::new(config()).generate().unwrap();
    let sets = dir.path().join("sets");
    let err = generated
        .write_set_files(&sets, DEFAULT_SET_FILE_TEMPLATE)
        .unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("../escape")));
    assert!(!sets.exists());
    assert!(!dir.path().join("escape.yaml").exists());
}
