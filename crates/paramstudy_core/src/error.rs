use std::path::PathBuf;

use crate::value::ValueKind;

/// Errors raised while validating a parameter schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("parameter schema is empty")]
    Empty,

    #[error("parameter names must not be empty")]
    EmptyName,

    #[error("parameter `{0}` is declared more than once")]
    DuplicateParameter(String),

    #[error("parameter `{parameter}` has no candidate values")]
    NoValues { parameter: String },

    #[error("parameter `{parameter}` mixes {first} and {second} values")]
    MixedKinds {
        parameter: String,
        first: ValueKind,
        second: ValueKind,
    },

    #[error("parameter `{parameter}` contains a non-finite value")]
    NonFinite { parameter: String },

    #[error("parameter `{parameter}` has inverted bounds (lower={lower}, upper={upper})")]
    InvertedBounds {
        parameter: String,
        lower: f64,
        upper: f64,
    },

    #[error("parameter `{parameter}` is missing required key `{key}`")]
    MissingKey {
        parameter: String,
        key: &'static str,
    },

    #[error("parameter `{parameter}` has an invalid {distribution} distribution: {reason}")]
    InvalidDistribution {
        parameter: String,
        distribution: &'static str,
        reason: &'static str,
    },

    #[error("invalid set name template `{template}`: {reason}")]
    InvalidTemplate {
        template: String,
        reason: &'static str,
    },

    #[error("failed to parse parameter schema: {0}")]
    Parse(String),
}

/// Schema and sampler family mismatch, or invalid sampler options
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplerError {
    #[error("{sampler} does not support the {kind} descriptor of parameter `{parameter}`")]
    UnsupportedDescriptor {
        sampler: &'static str,
        parameter: String,
        kind: &'static str,
    },

    #[error("{sampler} supports at most {max} dimensions, schema requires {requested}")]
    TooManyDimensions {
        sampler: &'static str,
        requested: usize,
        max: usize,
    },

    #[error("{sampler} option `{option}` is invalid: {reason}")]
    InvalidOption {
        sampler: &'static str,
        option: &'static str,
        reason: String,
    },
}

/// Invalid requested sample count
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleCountError {
    #[error("{sampler} requires a positive sample count")]
    Zero { sampler: &'static str },

    #[error("{sampler} cannot produce {requested} samples (maximum {max})")]
    TooLarge {
        sampler: &'static str,
        requested: u64,
        max: u64,
    },
}

/// A previous study cannot be merged with the current schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaConflictError {
    #[error("previous study has parameter `{0}` which the current schema lacks")]
    RemovedParameter(String),

    #[error("current schema adds parameter `{0}` which the previous study lacks")]
    AddedParameter(String),

    #[error("parameter `{parameter}` changed from {previous} to {current}")]
    KindChanged {
        parameter: String,
        previous: String,
        current: String,
    },
}

/// A persisted study does not match the expected layout
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("corrupt parameter study{}: {reason}", .path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
pub struct CorruptStudyError {
    pub path: Option<PathBuf>,
    pub reason: String,
}

impl CorruptStudyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            path: None,
            reason: reason.into(),
        }
    }

    pub fn at(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// The naming template produced a name already bound to other values.
///
/// Never expected when names are assigned through [`crate::identity::IdentityAssigner`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("set name `{name}` is already assigned to a different parameter set")]
pub struct DuplicateNameError {
    pub name: String,
}

/// The naming template has no index left that was never rendered
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("set name template `{template}` has exhausted its index range (next index {next_index})")]
pub struct NameIndexExhaustedError {
    pub template: String,
    pub next_index: u64,
}

/// Any error raised by the parameter study engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StudyError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error(transparent)]
    SampleCount(#[from] SampleCountError),

    #[error(transparent)]
    SchemaConflict(#[from] SchemaConflictError),

    #[error(transparent)]
    CorruptStudy(#[from] CorruptStudyError),

    #[error(transparent)]
    DuplicateName(#[from] DuplicateNameError),

    #[error(transparent)]
    NameIndexExhausted(#[from] NameIndexExhaustedError),
}

pub type Result<T> = std::result::Result<T, StudyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_study_display_with_path() {
        let err = CorruptStudyError::new("bad magic").at("study.json");
        assert_eq!(
            err.to_string(),
            "corrupt parameter study at study.json: bad magic"
        );
        assert_eq!(
            CorruptStudyError::new("bad magic").to_string(),
            "corrupt parameter study: bad magic"
        );
    }

    #[test]
    fn test_study_error_is_transparent() {
        let err: StudyError = SampleCountError::Zero {
            sampler: "latin_hypercube",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "latin_hypercube requires a positive sample count"
        );
    }
}
