//! YAML study description
//!
//! ```yaml
//! sampler: { kind: latin_hypercube, num_samples: 8, seed: 42 }
//! parameters:
//!   width: [1.0, 2.0]
//!   height: { lower: 0.5, upper: 1.5 }
//! set_name_template: "parameter_set@number"
//! previous_study: study.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use paramstudy_core::{
    DEFAULT_FLOAT_TOLERANCE, DEFAULT_SET_NAME_TEMPLATE, MergeOptions, NamingTemplate,
    ParameterSchema, RawSchema, SamplerConfig, SchemaError,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything needed to generate (and regenerate) a parameter study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    #[serde(default)]
    pub sampler: SamplerConfig,

    /// Parameter name to candidate list or bounds, in declaration order
    pub parameters: RawSchema,

    #[serde(default = "default_set_name_template")]
    pub set_name_template: String,

    /// Study to merge into; relative paths in a loaded file resolve against
    /// the file's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_study: Option<PathBuf>,

    /// Fail instead of starting fresh when `previous_study` does not exist
    #[serde(default)]
    pub require_previous_study: bool,

    #[serde(default = "default_float_tolerance")]
    pub float_tolerance: f64,
}

fn default_set_name_template() -> String {
    DEFAULT_SET_NAME_TEMPLATE.to_string()
}

fn default_float_tolerance() -> f64 {
    DEFAULT_FLOAT_TOLERANCE
}

impl StudyConfig {
    /// Configuration for `parameters` with every other setting at its default
    pub fn new(sampler: SamplerConfig, parameters: RawSchema) -> Self {
        Self {
            sampler,
            parameters,
            set_name_template: default_set_name_template(),
            previous_study: None,
            require_previous_study: false,
            float_tolerance: default_float_tolerance(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse study config: {}", e)))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut config = Self::from_yaml_str(&content)?;

        if let (Some(previous), Some(dir)) = (&config.previous_study, path.parent())
            && previous.is_relative()
        {
            config.previous_study = Some(dir.join(previous));
        }
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::Serialize(format!("Failed to serialize study config: {}", e)))
    }

    /// Validated parameter schema
    pub fn schema(&self) -> std::result::Result<ParameterSchema, SchemaError> {
        ParameterSchema::from_raw(self.parameters.clone())
    }

    pub fn merge_options(&self) -> std::result::Result<MergeOptions, SchemaError> {
        Ok(MergeOptions {
            template: NamingTemplate::new(&self.set_name_template)?,
            float_tolerance: self.float_tolerance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramstudy_core::{Distribution, Domain, ParameterValue};

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
sampler:
  kind: latin_hypercube
  num_samples: 8
  seed: 42
parameters:
  width: [1.0, 2.0]
  height:
    lower: 0.5
    upper: 1.5
    distribution:
      kind: normal
      mean: 1.0
      std_dev: 0.2
  material: [steel, oak]
set_name_template: "case_@number"
previous_study: study.json
float_tolerance: 1.0e-9
"#;
        let config = StudyConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.sampler,
            SamplerConfig::LatinHypercube {
                num_samples: 8,
                seed: Some(42)
            }
        );
        assert_eq!(config.previous_study, Some(PathBuf::from("study.json")));
        assert!(!config.require_previous_study);

        let schema = config.schema().unwrap();
        let names: Vec<_> = schema.names().collect();
        assert_eq!(names, vec!["width", "height", "material"]);
        assert_eq!(
            schema.get("height"),
            Some(&Domain::Bounded {
                lower: 0.5,
                upper: 1.5,
                distribution: Distribution::Normal {
                    mean: 1.0,
                    std_dev: 0.2
                },
            })
        );
        assert_eq!(
            schema.get("material"),
            Some(&Domain::Discrete(vec![
                ParameterValue::Text("steel".into()),
                ParameterValue::Text("oak".into()),
            ]))
        );
        assert_eq!(config.merge_options().unwrap().template.render(4), "case_4");
    }

    #[test]
    fn test_defaults() {
        let config = StudyConfig::from_yaml_str("parameters:\n  seed: [1, 2]\n").unwrap();
        assert_eq!(config.sampler, SamplerConfig::CartesianProduct);
        assert_eq!(config.set_name_template, DEFAULT_SET_NAME_TEMPLATE);
        assert_eq!(config.float_tolerance, DEFAULT_FLOAT_TOLERANCE);
        assert!(config.previous_study.is_none());
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = StudyConfig::from_yaml_str("parameters: {a: [1]}\nsamples: 3\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_resolves_previous_study() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("study.yaml");
        fs::write(&path, "parameters: {a: [1]}\nprevious_study: out/study.json\n").unwrap();

        let config = StudyConfig::load(&path).unwrap();
        assert_eq!(
            config.previous_study,
            Some(dir.path().join("out/study.json"))
        );
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = StudyConfig::from_yaml_str(
            "sampler: {kind: sobol_sequence, num_samples: 16}\nparameters: {x: {lower: 0.0, upper: 2.0}}\n",
        )
        .unwrap();
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(StudyConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
