//! Study generation pipeline
//!
//! schema → sampler → merge with the previous study → [`GeneratedStudy`].
//! Nothing touches the filesystem until one of the `write*` methods is
//! called, so a failed generation or merge leaves existing files untouched.

use std::fs;
use std::path::{Path, PathBuf};

use paramstudy_core::{
    ParameterStudy, Sampler, SamplerConfig, StudyView, merge_study,
};

use crate::config::StudyConfig;
use crate::error::{Error, Result};
use crate::store;
use crate::util::io::atomic_write;

/// Placeholder for the set name in per-set file templates
pub const SET_NAME_PLACEHOLDER: &str = "@set_name";

/// Placeholder for the set's position in study order in per-set file templates
pub const SET_POSITION_PLACEHOLDER: &str = "@number";

pub const DEFAULT_SET_FILE_TEMPLATE: &str = "@set_name.yaml";

/// A set name that can stand in a single path component
fn is_file_safe(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Generates parameter studies from a [`StudyConfig`]
#[derive(Debug, Clone)]
pub struct ParameterGenerator {
    config: StudyConfig,
}

impl ParameterGenerator {
    pub fn new(config: StudyConfig) -> Self {
        Self { config }
    }

    /// Generator for a YAML configuration file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(StudyConfig::load(path)?))
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    fn load_previous(&self) -> Result<Option<ParameterStudy>> {
        let Some(path) = &self.config.previous_study else {
            return Ok(None);
        };
        if !path.exists() {
            if self.config.require_previous_study {
                return Err(Error::MissingPreviousStudy(path.clone()));
            }
            tracing::warn!(
                path = %path.display(),
                "previous study not found, starting a fresh study"
            );
            return Ok(None);
        }
        store::read(path).map(Some)
    }

    /// Sampler for this run. A seeded sampler without an explicit seed
    /// replays the seed recorded by the previous study of the same sampler,
    /// so an unchanged configuration regenerates the same sets.
    fn sampler(&self, previous: Option<&ParameterStudy>) -> Box<dyn Sampler> {
        let recorded = previous
            .map(|p| p.metadata())
            .filter(|m| m.sampler == self.config.sampler.build().name())
            .and_then(|m| m.seed);

        let config = match (&self.config.sampler, recorded) {
            (SamplerConfig::LatinHypercube { num_samples, seed: None }, Some(seed)) => {
                tracing::debug!(seed, "reusing seed of previous study");
                SamplerConfig::LatinHypercube {
                    num_samples: *num_samples,
                    seed: Some(seed),
                }
            }
            (
                SamplerConfig::Morris {
                    num_trajectories,
                    num_levels,
                    seed: None,
                },
                Some(seed),
            ) => {
                tracing::debug!(seed, "reusing seed of previous study");
                SamplerConfig::Morris {
                    num_trajectories: *num_trajectories,
                    num_levels: *num_levels,
                    seed: Some(seed),
                }
            }
            (config, _) => config.clone(),
        };
        config.build()
    }

    /// Sample, merge with the previous study and return the result in memory
    pub fn generate(&self) -> Result<GeneratedStudy> {
        let schema = self.config.schema()?;
        let options = self.config.merge_options()?;
        let previous = self.load_previous()?;

        let sampler = self.sampler(previous.as_ref());
        let samples = sampler.generate(&schema)?;
        let outcome = merge_study(previous.as_ref(), &samples, &options)?;

        tracing::info!(
            sampler = sampler.name(),
            sets = outcome.study.len(),
            new = outcome.new_set_names.len(),
            "parameter study generated"
        );

        Ok(GeneratedStudy {
            study: outcome.study,
            new_set_names: outcome.new_set_names,
            reused: outcome.reused,
        })
    }
}

/// A merged study ready to be queried or written
#[derive(Debug, Clone)]
pub struct GeneratedStudy {
    study: ParameterStudy,
    new_set_names: Vec<String>,
    reused: usize,
}

impl GeneratedStudy {
    pub fn study(&self) -> &ParameterStudy {
        &self.study
    }

    pub fn into_study(self) -> ParameterStudy {
        self.study
    }

    pub fn query(&self) -> StudyView<'_> {
        self.study.query()
    }

    /// Names assigned by this generation
    pub fn new_set_names(&self) -> &[String] {
        &self.new_set_names
    }

    /// Sample rows that matched a set of the previous study
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Write the study, replacing any file at `path`
    pub fn write(&self, path: &Path) -> Result<()> {
        store::write(&self.study, path)
    }

    /// Write the study unless `path` already holds it, see [`store::write_if_changed`]
    pub fn write_if_changed(&self, path: &Path, overwrite: bool) -> Result<bool> {
        store::write_if_changed(&self.study, path, overwrite)
    }

    /// Write one YAML file of parameter values per set into `dir`.
    ///
    /// `template` names each file; `@set_name` is replaced by the set name and
    /// `@number` by the set's position in study order. Files whose content is
    /// unchanged are not rewritten. Returns the path of every set file in
    /// study order. A set name that is empty or contains a path separator is
    /// rejected before anything is written.
    pub fn write_set_files(&self, dir: &Path, template: &str) -> Result<Vec<PathBuf>> {
        if !template.contains(SET_NAME_PLACEHOLDER) && !template.contains(SET_POSITION_PLACEHOLDER)
        {
            return Err(Error::Config(format!(
                "set file template `{template}` must contain {SET_NAME_PLACEHOLDER} or {SET_POSITION_PLACEHOLDER}"
            )));
        }

        if let Some(name) = self.study.set_names().find(|name| !is_file_safe(name)) {
            return Err(Error::Config(format!(
                "set name `{name}` cannot be used in a set file name"
            )));
        }

        let mut paths = Vec::with_capacity(self.study.len());
        let mut written = 0;
        for set in self.study.query().iter() {
            let file_name = template
                .replace(SET_NAME_PLACEHOLDER, set.name())
                .replace(SET_POSITION_PLACEHOLDER, &set.position().to_string());
            let path = dir.join(file_name);

            let yaml = serde_saphyr::to_string(&set)
                .map_err(|e| Error::Serialize(format!("Failed to serialize set: {}", e)))?;
            let unchanged = fs::read_to_string(&path).is_ok_and(|existing| existing == yaml);
            if !unchanged {
                atomic_write(&path, &yaml).map_err(|e| Error::io(&path, e))?;
                written += 1;
            }
            paths.push(path);
        }

        tracing::info!(dir = %dir.display(), sets = paths.len(), written, "set files written");
        Ok(paths)
    }
}
