//! Stable set identities across regenerations
//!
//! [`merge_study`] reconciles freshly sampled rows against a previously
//! persisted study:
//!
//! 1. the previous study seeds the result, its columns rearranged into the new
//!    schema order after a compatibility check;
//! 2. every sampled row equal to a set already in the growing result reuses
//!    that set's name;
//! 3. every other row receives the next name rendered by the naming template,
//!    continuing after the highest index ever used.
//!
//! Previous sets keep their order and come first, new sets follow in sampler
//! order. Merging the same samples twice is a no-op and the set of names
//! only ever grows.

use rustc_hash::FxHashMap;

use crate::error::{
    DuplicateNameError, NameIndexExhaustedError, Result, SchemaConflictError, SchemaError,
};
use crate::sampling::SampleMatrix;
use crate::study::{Column, ParameterStudy, StudyMetadata};

/// Placeholder replaced by the running set index
pub const SET_NUMBER_PLACEHOLDER: &str = "@number";

pub const DEFAULT_SET_NAME_TEMPLATE: &str = "parameter_set@number";

/// Absolute tolerance for float comparisons; `0.0` means exact equality
pub const DEFAULT_FLOAT_TOLERANCE: f64 = 0.0;

/// Set name template such as `parameter_set@number`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    prefix: String,
    suffix: String,
}

impl NamingTemplate {
    /// Parse a template, appending the placeholder when it is absent
    pub fn new(template: &str) -> std::result::Result<Self, SchemaError> {
        let (prefix, suffix) = match template.split_once(SET_NUMBER_PLACEHOLDER) {
            Some((prefix, suffix)) => (prefix, suffix),
            None => (template, ""),
        };
        if suffix.contains(SET_NUMBER_PLACEHOLDER) {
            return Err(SchemaError::InvalidTemplate {
                template: template.to_string(),
                reason: "placeholder `@number` appears more than once",
            });
        }
        if suffix.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(SchemaError::InvalidTemplate {
                template: template.to_string(),
                reason: "placeholder must not be followed by a digit",
            });
        }
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    pub fn render(&self, index: u64) -> String {
        format!("{}{}{}", self.prefix, index, self.suffix)
    }

    /// Index encoded in `name`, if the name was rendered by this template
    pub fn parse(&self, name: &str) -> Option<u64> {
        let digits = name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl Default for NamingTemplate {
    fn default() -> Self {
        Self {
            prefix: "parameter_set".to_string(),
            suffix: String::new(),
        }
    }
}

impl std::fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.prefix, SET_NUMBER_PLACEHOLDER, self.suffix)
    }
}

/// Options controlling a merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    pub template: NamingTemplate,
    /// Negative or NaN values are treated as `0.0`
    pub float_tolerance: f64,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            template: NamingTemplate::default(),
            float_tolerance: DEFAULT_FLOAT_TOLERANCE,
        }
    }
}

impl MergeOptions {
    fn tolerance(&self) -> f64 {
        if self.float_tolerance > 0.0 {
            self.float_tolerance
        } else {
            0.0
        }
    }
}

/// Hands out set names from an explicit running index
#[derive(Debug, Clone)]
pub struct IdentityAssigner {
    template: NamingTemplate,
    next_index: u64,
}

impl IdentityAssigner {
    pub fn new(template: NamingTemplate) -> Self {
        Self {
            template,
            next_index: 0,
        }
    }

    /// Continue after every index `previous` has used or recorded
    pub fn seeded_from(template: NamingTemplate, previous: &ParameterStudy) -> Self {
        let parsed = previous
            .set_names()
            .filter_map(|name| template.parse(name))
            .max()
            .map_or(0, |max| max.saturating_add(1));
        Self {
            next_index: parsed.max(previous.metadata().next_set_index),
            template,
        }
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Render the next name and advance the index.
    ///
    /// `u64::MAX` is never handed out, so a recorded `next_index` always
    /// names an unused index.
    pub fn assign(&mut self) -> std::result::Result<String, NameIndexExhaustedError> {
        let advanced = self
            .next_index
            .checked_add(1)
            .ok_or_else(|| NameIndexExhaustedError {
                template: self.template.to_string(),
                next_index: self.next_index,
            })?;
        let name = self.template.render(self.next_index);
        self.next_index = advanced;
        Ok(name)
    }
}

/// Result of merging samples into a study
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub study: ParameterStudy,
    /// Names assigned in this merge, in sampler order
    pub new_set_names: Vec<String>,
    /// Sample rows that matched a set of the previous study
    pub reused: usize,
}

/// Check `previous` against the new columns and rearrange it into their order
fn align_previous(previous: &ParameterStudy, columns: &[Column]) -> Result<ParameterStudy> {
    let positions: FxHashMap<&str, usize> = previous
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), i))
        .collect();

    if let Some(removed) = previous
        .columns()
        .iter()
        .find(|c| !columns.iter().any(|n| n.name == c.name))
    {
        return Err(SchemaConflictError::RemovedParameter(removed.name.clone()).into());
    }

    let mut source = Vec::with_capacity(columns.len());
    for column in columns {
        let Some(&i) = positions.get(column.name.as_str()) else {
            return Err(SchemaConflictError::AddedParameter(column.name.clone()).into());
        };
        let old = &previous.columns()[i];
        if old.kind != column.kind || old.domain != column.domain {
            return Err(SchemaConflictError::KindChanged {
                parameter: column.name.clone(),
                previous: format!("{} {}", old.domain, old.kind),
                current: format!("{} {}", column.domain, column.kind),
            }
            .into());
        }
        source.push(i);
    }

    Ok(previous.reordered(columns.to_vec(), &source))
}

/// Merge freshly sampled rows into an optional previous study
pub fn merge_study(
    previous: Option<&ParameterStudy>,
    samples: &SampleMatrix,
    options: &MergeOptions,
) -> Result<MergeOutcome> {
    let (mut study, mut assigner) = match previous {
        Some(previous) => (
            align_previous(previous, &samples.columns)?,
            IdentityAssigner::seeded_from(options.template.clone(), previous),
        ),
        None => (
            ParameterStudy::empty(samples.columns.clone()),
            IdentityAssigner::new(options.template.clone()),
        ),
    };

    let tolerance = options.tolerance();
    let previous_len = study.len();
    let mut new_set_names = Vec::new();
    let mut sample_set_names = Vec::with_capacity(samples.len());
    let mut reused = 0;

    for row in &samples.rows {
        if let Some(position) = study.find_equal(row, tolerance) {
            let name = study.sets()[position].name().to_string();
            if position < previous_len {
                reused += 1;
            }
            tracing::debug!(set = %name, "sample matches existing set");
            sample_set_names.push(name);
            continue;
        }

        let name = assigner.assign()?;
        if study.get(&name).is_some() {
            return Err(DuplicateNameError { name }.into());
        }
        study.push_set(name.clone(), row.clone())?;
        tracing::debug!(set = %name, "new parameter set");
        new_set_names.push(name.clone());
        sample_set_names.push(name);
    }

    study.metadata = StudyMetadata {
        sampler: samples.metadata.sampler.clone(),
        sample_count: samples.metadata.sample_count,
        seed: samples.metadata.seed,
        design: samples.metadata.design.clone(),
        set_name_template: options.template.to_string(),
        next_set_index: assigner.next_index(),
        sample_set_names,
    };

    tracing::info!(
        sampler = %samples.metadata.sampler,
        total = study.len(),
        new = new_set_names.len(),
        reused,
        "parameter study merged"
    );

    Ok(MergeOutcome {
        study,
        new_set_names,
        reused,
    })
}
