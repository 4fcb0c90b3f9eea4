//! Persistent study file format
//!
//! A study is stored as a pretty-printed, schema-versioned JSON document:
//!
//! ```text
//! format      "paramstudy"                  magic
//! version     1
//! coordinate  "set_name"
//! set_names   [name, ...]                   study order
//! set_hashes  [blake3 hex, ...]             one per set
//! parameters  [{name, dtype, domain, values}, ...]
//! data_vars   {quantity: [value, ...]}      owned by downstream tools
//! attrs       {sampler, sample_count, seed, design, set_name_template,
//!              next_set_index, sample_set_names, written_at}
//! ```
//!
//! Reading checks the layout structurally before any value is trusted, and
//! recomputes every set hash so values edited out of band are detected.
//! Foreign `data_vars` holding one entry per set become quantity columns;
//! any other entry is carried through verbatim.

use std::fs;
use std::path::Path;

use paramstudy_core::{
    Column, CorruptStudyError, DomainKind, ParameterStudy, ParameterValue, QuantityColumn,
    SensitivityDesign, StudyMetadata, ValueKind,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::util::io::atomic_write_bytes;

/// Magic string identifying a study file
pub const FORMAT_MAGIC: &str = "paramstudy";

/// Current file format version
pub const FORMAT_VERSION: u64 = 1;

/// Name of the set coordinate
pub const COORDINATE: &str = "set_name";

#[derive(Debug, Serialize, Deserialize)]
struct StudyFile {
    format: String,
    version: u64,
    coordinate: String,
    set_names: Vec<String>,
    set_hashes: Vec<String>,
    parameters: Vec<ParameterColumnFile>,
    #[serde(default)]
    data_vars: serde_json::Map<String, Value>,
    attrs: StudyAttrs,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParameterColumnFile {
    name: String,
    dtype: String,
    domain: String,
    values: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StudyAttrs {
    sampler: String,
    sample_count: usize,
    seed: Option<u64>,
    design: Option<SensitivityDesign>,
    set_name_template: String,
    next_set_index: u64,
    #[serde(default)]
    sample_set_names: Vec<String>,
    #[serde(default)]
    written_at: Option<jiff::Timestamp>,
}

impl From<StudyAttrs> for StudyMetadata {
    fn from(attrs: StudyAttrs) -> Self {
        StudyMetadata {
            sampler: attrs.sampler,
            sample_count: attrs.sample_count,
            seed: attrs.seed,
            design: attrs.design,
            set_name_template: attrs.set_name_template,
            next_set_index: attrs.next_set_index,
            sample_set_names: attrs.sample_set_names,
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

fn to_file(study: &ParameterStudy) -> StudyFile {
    let parameters = study
        .columns()
        .iter()
        .enumerate()
        .map(|(i, column)| ParameterColumnFile {
            name: column.name.clone(),
            dtype: column.kind.dtype().to_string(),
            domain: column.domain.name().to_string(),
            values: study
                .sets()
                .iter()
                .map(|set| value_to_json(&set.values()[i]))
                .collect(),
        })
        .collect();

    let mut data_vars: serde_json::Map<String, Value> = study
        .quantities()
        .iter()
        .map(|q| (q.name.clone(), Value::Array(q.values.clone())))
        .collect();
    data_vars.extend(
        study
            .opaque_vars()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone())),
    );

    let metadata = study.metadata();
    StudyFile {
        format: FORMAT_MAGIC.to_string(),
        version: FORMAT_VERSION,
        coordinate: COORDINATE.to_string(),
        set_names: study.set_names().map(String::from).collect(),
        set_hashes: study.sets().iter().map(|s| s.hash().to_string()).collect(),
        parameters,
        data_vars,
        attrs: StudyAttrs {
            sampler: metadata.sampler.clone(),
            sample_count: metadata.sample_count,
            seed: metadata.seed,
            design: metadata.design.clone(),
            set_name_template: metadata.set_name_template.clone(),
            next_set_index: metadata.next_set_index,
            sample_set_names: metadata.sample_set_names.clone(),
            written_at: Some(jiff::Timestamp::now()),
        },
    }
}

fn value_to_json(value: &ParameterValue) -> Value {
    match value {
        ParameterValue::Bool(b) => Value::Bool(*b),
        ParameterValue::Integer(i) => Value::from(*i),
        ParameterValue::Float(x) => Value::from(*x),
        ParameterValue::Text(s) => Value::String(s.clone()),
    }
}

/// Serialize a study to the pretty-printed file representation
pub fn to_json(study: &ParameterStudy) -> Result<String> {
    let mut json = serde_json::to_string_pretty(&to_file(study))
        .map_err(|e| Error::Serialize(format!("Failed to serialize study: {}", e)))?;
    json.push('\n');
    Ok(json)
}

// ============================================================================
// Decoding
// ============================================================================

fn corrupt(reason: impl Into<String>) -> CorruptStudyError {
    CorruptStudyError::new(reason)
}

fn check_header(document: &Value) -> std::result::Result<(), CorruptStudyError> {
    let Some(object) = document.as_object() else {
        return Err(corrupt("document is not a JSON object"));
    };
    match object.get("format").and_then(Value::as_str) {
        Some(FORMAT_MAGIC) => {}
        Some(other) => return Err(corrupt(format!("unexpected format `{other}`"))),
        None => return Err(corrupt("missing format marker")),
    }
    match object.get("version").and_then(Value::as_u64) {
        Some(FORMAT_VERSION) => {}
        Some(other) => return Err(corrupt(format!("unsupported version {other}"))),
        None => return Err(corrupt("missing format version")),
    }
    match object.get("coordinate").and_then(Value::as_str) {
        Some(COORDINATE) => Ok(()),
        other => Err(corrupt(format!(
            "expected coordinate `{COORDINATE}`, found {other:?}"
        ))),
    }
}

fn value_from_json(kind: ValueKind, value: &Value) -> Option<ParameterValue> {
    match (kind, value) {
        (ValueKind::Bool, Value::Bool(b)) => Some(ParameterValue::Bool(*b)),
        (ValueKind::Integer, Value::Number(n)) => n.as_i64().map(ParameterValue::Integer),
        (ValueKind::Float, Value::Number(n)) => n.as_f64().map(ParameterValue::Float),
        (ValueKind::Text, Value::String(s)) => Some(ParameterValue::Text(s.clone())),
        _ => None,
    }
}

fn decode_columns(
    parameters: &[ParameterColumnFile],
    set_count: usize,
) -> std::result::Result<(Vec<Column>, Vec<Vec<ParameterValue>>), CorruptStudyError> {
    let mut columns = Vec::with_capacity(parameters.len());
    let mut rows = vec![Vec::with_capacity(parameters.len()); set_count];

    for parameter in parameters {
        let kind = ValueKind::from_dtype(&parameter.dtype).ok_or_else(|| {
            corrupt(format!(
                "parameter `{}` has unknown dtype `{}`",
                parameter.name, parameter.dtype
            ))
        })?;
        let domain = DomainKind::from_name(&parameter.domain).ok_or_else(|| {
            corrupt(format!(
                "parameter `{}` has unknown domain `{}`",
                parameter.name, parameter.domain
            ))
        })?;
        if parameter.values.len() != set_count {
            return Err(corrupt(format!(
                "parameter `{}` has {} values for {} sets",
                parameter.name,
                parameter.values.len(),
                set_count
            )));
        }

        for (row, cell) in rows.iter_mut().zip(&parameter.values) {
            let value = value_from_json(kind, cell).ok_or_else(|| {
                corrupt(format!(
                    "parameter `{}` holds {cell} which is not {kind}",
                    parameter.name
                ))
            })?;
            row.push(value);
        }

        columns.push(Column {
            name: parameter.name.clone(),
            kind,
            domain,
        });
    }

    Ok((columns, rows))
}

type DataVars = (Vec<QuantityColumn>, serde_json::Map<String, Value>);

/// Split `data_vars` into per-set quantity columns and opaque entries
fn decode_data_vars(
    data_vars: serde_json::Map<String, Value>,
    columns: &[Column],
    set_count: usize,
) -> std::result::Result<DataVars, CorruptStudyError> {
    let mut quantities = Vec::with_capacity(data_vars.len());
    let mut opaque = serde_json::Map::new();
    for (name, value) in data_vars {
        if columns.iter().any(|c| c.name == name) {
            return Err(corrupt(format!(
                "data variable `{name}` shadows a parameter column"
            )));
        }
        match value {
            Value::Array(values) if values.len() == set_count => {
                quantities.push(QuantityColumn { name, values });
            }
            other => {
                tracing::warn!(
                    data_var = %name,
                    "data variable has no entry per parameter set, keeping it unchanged"
                );
                opaque.insert(name, other);
            }
        }
    }
    Ok((quantities, opaque))
}

/// Parse and validate a study from its file representation
pub fn from_json(bytes: &[u8]) -> std::result::Result<ParameterStudy, CorruptStudyError> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| corrupt(format!("invalid JSON: {e}")))?;
    check_header(&document)?;

    let file: StudyFile = serde_json::from_value(document)
        .map_err(|e| corrupt(format!("unexpected layout: {e}")))?;

    let set_count = file.set_names.len();
    if file.set_hashes.len() != set_count {
        return Err(corrupt(format!(
            "{} set hashes for {} sets",
            file.set_hashes.len(),
            set_count
        )));
    }

    let (columns, rows) = decode_columns(&file.parameters, set_count)?;
    let (quantities, opaque) = decode_data_vars(file.data_vars, &columns, set_count)?;
    let study = ParameterStudy::from_parts(
        columns,
        file.set_names,
        rows,
        quantities,
        file.attrs.into(),
    )?
    .with_opaque_vars(opaque)?;

    for (set, expected) in study.sets().iter().zip(&file.set_hashes) {
        if set.hash() != expected {
            return Err(corrupt(format!(
                "values of set `{}` do not match its recorded hash",
                set.name()
            )));
        }
    }

    Ok(study)
}

// ============================================================================
// File operations
// ============================================================================

/// Read a study file
pub fn read(path: &Path) -> Result<ParameterStudy> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let study = from_json(&bytes).map_err(|e| e.at(path))?;
    tracing::debug!(path = %path.display(), sets = study.len(), "parameter study read");
    Ok(study)
}

/// Write a study file atomically, replacing any existing file
pub fn write(study: &ParameterStudy, path: &Path) -> Result<()> {
    let json = to_json(study)?;
    atomic_write_bytes(path, json.as_bytes()).map_err(|e| Error::io(path, e))?;
    tracing::info!(path = %path.display(), sets = study.len(), "parameter study written");
    Ok(())
}

/// Write a study unless `path` already holds the same study.
///
/// The `written_at` timestamp is ignored when comparing, so an unchanged
/// regeneration keeps the file's modification time. An unreadable existing
/// file is replaced. Returns whether the file was written.
pub fn write_if_changed(study: &ParameterStudy, path: &Path, overwrite: bool) -> Result<bool> {
    if !overwrite && path.exists() {
        match read(path) {
            Ok(existing) if existing == *study => {
                tracing::debug!(path = %path.display(), "parameter study unchanged, skipping write");
                return Ok(false);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "replacing unreadable study file");
            }
        }
    }
    write(study, path)?;
    Ok(true)
}
