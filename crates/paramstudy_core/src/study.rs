//! Parameter study table
//!
//! A [`ParameterStudy`] is a 2-D table indexed by `(set name, parameter name)`.
//! Rows are [`ParameterSet`]s in the order they were first introduced; columns
//! are the schema parameters plus any opaque quantity-of-interest columns
//! appended by downstream tools. Downstream entries that are not per-set
//! columns ride along untouched as opaque variables.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{CorruptStudyError, DuplicateNameError};
use crate::sampling::SensitivityDesign;
use crate::schema::DomainKind;
use crate::value::{ParameterValue, ValueKind};

/// A parameter column of a study
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ValueKind,
    pub domain: DomainKind,
}

/// One named assignment of values to every parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    name: String,
    hash: String,
    values: Vec<ParameterValue>,
}

impl ParameterSet {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// BLAKE3 content digest of the values, independent of column order
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Values in study column order
    pub fn values(&self) -> &[ParameterValue] {
        &self.values
    }
}

/// A per-set column owned by downstream post-processing
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityColumn {
    pub name: String,
    pub values: Vec<serde_json::Value>,
}

/// How the latest generation of a study was produced
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StudyMetadata {
    pub sampler: String,
    pub sample_count: usize,
    pub seed: Option<u64>,
    pub design: Option<SensitivityDesign>,
    pub set_name_template: String,
    /// Lowest index the naming template has never rendered
    pub next_set_index: u64,
    /// Set name of every raw sample row, in sampler order
    pub sample_set_names: Vec<String>,
}

/// Content digest of a parameter set.
///
/// The `(name, value)` pairs are hashed in name order so the digest survives
/// column reordering. `-0.0` hashes like `0.0`.
pub fn compute_set_hash(columns: &[Column], values: &[ParameterValue]) -> String {
    let mut pairs: Vec<(&str, &ParameterValue)> = columns
        .iter()
        .map(|c| c.name.as_str())
        .zip(values)
        .collect();
    pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut buf = Vec::with_capacity(pairs.len() * 24);
    for (name, value) in pairs {
        buf.extend_from_slice(&(name.len() as u64).to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        value.write_canonical(&mut buf);
    }
    blake3::hash(&buf).to_hex().to_string()
}

/// Named parameter sets sharing one column layout
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStudy {
    pub(crate) columns: Vec<Column>,
    pub(crate) sets: Vec<ParameterSet>,
    pub(crate) by_name: FxHashMap<String, usize>,
    pub(crate) by_hash: FxHashMap<String, usize>,
    pub(crate) quantities: Vec<QuantityColumn>,
    pub(crate) opaque_vars: serde_json::Map<String, serde_json::Value>,
    pub(crate) metadata: StudyMetadata,
}

impl ParameterStudy {
    /// A study with the given columns and no sets
    pub fn empty(columns: Vec<Column>) -> Self {
        Self {
            columns,
            sets: Vec::new(),
            by_name: FxHashMap::default(),
            by_hash: FxHashMap::default(),
            quantities: Vec::new(),
            opaque_vars: serde_json::Map::new(),
            metadata: StudyMetadata::default(),
        }
    }

    /// Assemble a study from persisted parts, validating the table shape
    pub fn from_parts(
        columns: Vec<Column>,
        set_names: Vec<String>,
        rows: Vec<Vec<ParameterValue>>,
        quantities: Vec<QuantityColumn>,
        metadata: StudyMetadata,
    ) -> Result<Self, CorruptStudyError> {
        if set_names.len() != rows.len() {
            return Err(CorruptStudyError::new(format!(
                "{} set names for {} rows",
                set_names.len(),
                rows.len()
            )));
        }

        let mut seen = FxHashSet::default();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CorruptStudyError::new(format!(
                    "parameter column `{}` appears more than once",
                    column.name
                )));
            }
        }

        let mut study = Self::empty(columns);
        for (name, values) in set_names.into_iter().zip(rows) {
            if name.is_empty() {
                return Err(CorruptStudyError::new("a parameter set has an empty name"));
            }
            if values.len() != study.columns.len() {
                return Err(CorruptStudyError::new(format!(
                    "set `{name}` has {} values for {} parameters",
                    values.len(),
                    study.columns.len()
                )));
            }
            for (value, column) in values.iter().zip(&study.columns) {
                if value.kind() != column.kind || !value.is_finite() {
                    return Err(CorruptStudyError::new(format!(
                        "set `{name}` holds {value} in {} column `{}`",
                        column.kind, column.name
                    )));
                }
            }
            study
                .push_set(name, values)
                .map_err(|e| CorruptStudyError::new(e.to_string()))?;
        }

        for quantity in &quantities {
            if quantity.values.len() != study.sets.len() {
                return Err(CorruptStudyError::new(format!(
                    "quantity `{}` has {} entries for {} sets",
                    quantity.name,
                    quantity.values.len(),
                    study.sets.len()
                )));
            }
        }
        study.quantities = quantities;
        study.metadata = metadata;
        Ok(study)
    }

    /// Attach downstream variables that are not per-set columns.
    ///
    /// A name already used by a parameter or quantity column is corrupt.
    pub fn with_opaque_vars(
        mut self,
        vars: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, CorruptStudyError> {
        if let Some(name) = vars.keys().find(|name| {
            self.column_index(name).is_some() || self.quantity(name).is_some()
        }) {
            return Err(CorruptStudyError::new(format!(
                "variable `{name}` shadows a study column"
            )));
        }
        self.opaque_vars = vars;
        Ok(self)
    }

    /// Append a set; quantity columns receive `null` for it
    pub(crate) fn push_set(
        &mut self,
        name: String,
        values: Vec<ParameterValue>,
    ) -> Result<&ParameterSet, DuplicateNameError> {
        if self.by_name.contains_key(&name) {
            return Err(DuplicateNameError { name });
        }
        let hash = compute_set_hash(&self.columns, &values);
        let position = self.sets.len();
        self.by_name.insert(name.clone(), position);
        self.by_hash.entry(hash.clone()).or_insert(position);
        for quantity in &mut self.quantities {
            quantity.values.push(serde_json::Value::Null);
        }
        self.sets.push(ParameterSet { name, hash, values });
        Ok(&self.sets[position])
    }

    /// Copy of the study with its columns rearranged.
    ///
    /// `source[i]` is the current position of the column placed at `i`.
    pub(crate) fn reordered(&self, columns: Vec<Column>, source: &[usize]) -> Self {
        let sets = self
            .sets
            .iter()
            .map(|set| ParameterSet {
                name: set.name.clone(),
                hash: set.hash.clone(),
                values: source.iter().map(|&i| set.values[i].clone()).collect(),
            })
            .collect();
        Self {
            columns,
            sets,
            by_name: self.by_name.clone(),
            by_hash: self.by_hash.clone(),
            quantities: self.quantities.clone(),
            opaque_vars: self.opaque_vars.clone(),
            metadata: self.metadata.clone(),
        }
    }

    /// Position of a set value-equal to `values` (in column order).
    ///
    /// A tolerance of zero looks the set up by hash; a positive tolerance
    /// scans every set comparing floats by absolute difference.
    pub fn find_equal(&self, values: &[ParameterValue], tolerance: f64) -> Option<usize> {
        if tolerance > 0.0 {
            return self.sets.iter().position(|set| {
                set.values
                    .iter()
                    .zip(values)
                    .all(|(a, b)| a.matches(b, tolerance))
            });
        }
        self.by_hash
            .get(&compute_set_hash(&self.columns, values))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index(&self, parameter: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == parameter)
    }

    pub fn sets(&self) -> &[ParameterSet] {
        &self.sets
    }

    pub fn set_names(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|s| s.name.as_str())
    }

    pub fn get(&self, set_name: &str) -> Option<&ParameterSet> {
        self.by_name.get(set_name).map(|&i| &self.sets[i])
    }

    /// Value at `(set name, parameter name)`
    pub fn value(&self, set_name: &str, parameter: &str) -> Option<&ParameterValue> {
        let column = self.column_index(parameter)?;
        self.get(set_name).map(|set| &set.values[column])
    }

    pub fn quantities(&self) -> &[QuantityColumn] {
        &self.quantities
    }

    pub fn quantity(&self, name: &str) -> Option<&QuantityColumn> {
        self.quantities.iter().find(|q| q.name == name)
    }

    /// Downstream variables kept verbatim, keyed by name
    pub fn opaque_vars(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.opaque_vars
    }

    pub fn metadata(&self) -> &StudyMetadata {
        &self.metadata
    }
}
