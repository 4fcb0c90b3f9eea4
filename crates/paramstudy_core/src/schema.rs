//! Parameter schema model
//!
//! A schema is an ordered mapping from parameter name to a [`Domain`]. The
//! declaration order is significant: it fixes the column order of generated
//! studies and the nesting order of the cartesian product.
//!
//! Schemas are built either from a [`RawSchema`] (deserialized from YAML or
//! JSON, preserving mapping order) or programmatically:
//!
//! ```ignore
//! let schema = SchemaBuilder::new()
//!     .discrete("width", [1.0, 2.0])
//!     .bounded("height", 0.5, 1.5)
//!     .build()?;
//! ```

use std::fmt;

use rustc_hash::FxHashSet;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::distribution::{Distribution, QuantileMap};
use crate::error::{SamplerError, SchemaError, StudyError};
use crate::value::{ParameterValue, ValueKind};

/// Domain descriptor of one parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    /// Explicit ordered candidate values, all of one kind
    Discrete(Vec<ParameterValue>),
    /// Continuous range with a distribution over it
    Bounded {
        lower: f64,
        upper: f64,
        distribution: Distribution,
    },
}

impl Domain {
    pub fn kind(&self) -> DomainKind {
        match self {
            Domain::Discrete(_) => DomainKind::Discrete,
            Domain::Bounded { .. } => DomainKind::Bounded,
        }
    }

    /// Kind of the values this domain produces
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Domain::Discrete(values) => values
                .first()
                .map(ParameterValue::kind)
                .unwrap_or(ValueKind::Float),
            Domain::Bounded { .. } => ValueKind::Float,
        }
    }
}

/// Descriptor family of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Discrete,
    Bounded,
}

impl DomainKind {
    pub fn name(self) -> &'static str {
        match self {
            DomainKind::Discrete => "discrete",
            DomainKind::Bounded => "bounded",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "discrete" => Some(DomainKind::Discrete),
            "bounded" => Some(DomainKind::Bounded),
            _ => None,
        }
    }
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unvalidated bounds descriptor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(default)]
    pub distribution: Distribution,
}

/// Unvalidated domain descriptor: a list of values or a bounds mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDomain {
    Values(Vec<ParameterValue>),
    Bounds(RawBounds),
}

/// Unvalidated schema, an ordered list of `(name, descriptor)` pairs.
///
/// Deserializes from a mapping and keeps the mapping's order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSchema(pub Vec<(String, RawDomain)>);

impl Serialize for RawSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, domain) in &self.0 {
            map.serialize_entry(name, domain)?;
        }
        map.end()
    }
}

struct RawSchemaVisitor;

impl<'de> Visitor<'de> for RawSchemaVisitor {
    type Value = RawSchema;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping from parameter name to values or bounds")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut parameters = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, domain)) = map.next_entry::<String, RawDomain>()? {
            parameters.push((name, domain));
        }
        Ok(RawSchema(parameters))
    }
}

impl<'de> Deserialize<'de> for RawSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawSchemaVisitor)
    }
}

/// A bounded parameter prepared for a continuous sampler
#[derive(Debug, Clone)]
pub struct ContinuousParameter {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub distribution: Distribution,
    quantile: QuantileMap,
}

impl ContinuousParameter {
    /// Map a unit-interval coordinate to a parameter value
    pub fn value_at(&self, u: f64) -> ParameterValue {
        ParameterValue::Float(self.quantile.quantile(u))
    }
}

/// Validated parameter schema
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSchema {
    parameters: Vec<(String, Domain)>,
}

impl ParameterSchema {
    /// Validate a raw schema
    pub fn from_raw(raw: RawSchema) -> Result<Self, SchemaError> {
        if raw.0.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = FxHashSet::default();
        let mut parameters = Vec::with_capacity(raw.0.len());
        for (name, raw_domain) in raw.0 {
            if name.is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if !seen.insert(name.clone()) {
                return Err(SchemaError::DuplicateParameter(name));
            }
            let domain = match raw_domain {
                RawDomain::Values(values) => Domain::Discrete(validate_values(&name, values)?),
                RawDomain::Bounds(bounds) => validate_bounds(&name, bounds)?,
            };
            parameters.push((name, domain));
        }

        Ok(Self { parameters })
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Parameter names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Domain)> {
        self.parameters
            .iter()
            .map(|(name, domain)| (name.as_str(), domain))
    }

    pub fn get(&self, name: &str) -> Option<&Domain> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, domain)| domain)
    }

    /// Candidate lists for a sampler that only handles discrete descriptors
    pub fn discrete_domains(
        &self,
        sampler: &'static str,
    ) -> Result<Vec<(&str, &[ParameterValue])>, StudyError> {
        self.parameters
            .iter()
            .map(|(name, domain)| match domain {
                Domain::Discrete(values) => Ok((name.as_str(), values.as_slice())),
                Domain::Bounded { .. } => Err(SamplerError::UnsupportedDescriptor {
                    sampler,
                    parameter: name.clone(),
                    kind: DomainKind::Bounded.name(),
                }
                .into()),
            })
            .collect()
    }

    /// Bounded parameters for a continuous sampler.
    ///
    /// A discrete list of exactly two numbers is read as `[lower, upper]`
    /// with a uniform distribution.
    pub fn continuous_domains(
        &self,
        sampler: &'static str,
    ) -> Result<Vec<ContinuousParameter>, StudyError> {
        let mut out = Vec::with_capacity(self.parameters.len());
        for (name, domain) in &self.parameters {
            let (lower, upper, distribution) = match domain {
                Domain::Bounded {
                    lower,
                    upper,
                    distribution,
                } => (*lower, *upper, *distribution),
                Domain::Discrete(values) => {
                    let pair = match values.as_slice() {
                        [a, b] => a.as_f64().zip(b.as_f64()),
                        _ => None,
                    };
                    let Some((lower, upper)) = pair else {
                        return Err(SamplerError::UnsupportedDescriptor {
                            sampler,
                            parameter: name.clone(),
                            kind: DomainKind::Discrete.name(),
                        }
                        .into());
                    };
                    check_ordered(name, lower, upper)?;
                    (lower, upper, Distribution::Uniform)
                }
            };
            let quantile = QuantileMap::new(name, distribution, lower, upper)?;
            out.push(ContinuousParameter {
                name: name.clone(),
                lower,
                upper,
                distribution,
                quantile,
            });
        }
        Ok(out)
    }
}

fn validate_values(
    parameter: &str,
    values: Vec<ParameterValue>,
) -> Result<Vec<ParameterValue>, SchemaError> {
    let Some(first) = values.first() else {
        return Err(SchemaError::NoValues {
            parameter: parameter.to_string(),
        });
    };
    if values.iter().any(|v| !v.is_finite()) {
        return Err(SchemaError::NonFinite {
            parameter: parameter.to_string(),
        });
    }

    let first_kind = first.kind();
    let mut promote = false;
    for value in &values {
        let kind = value.kind();
        if kind == first_kind {
            continue;
        }
        match (first_kind, kind) {
            (ValueKind::Integer, ValueKind::Float) | (ValueKind::Float, ValueKind::Integer) => {
                promote = true;
            }
            _ => {
                return Err(SchemaError::MixedKinds {
                    parameter: parameter.to_string(),
                    first: first_kind,
                    second: kind,
                });
            }
        }
    }

    if !promote {
        return Ok(values);
    }
    Ok(values
        .into_iter()
        .map(|v| match v {
            ParameterValue::Integer(i) => ParameterValue::Float(i as f64),
            other => other,
        })
        .collect())
}

fn validate_bounds(parameter: &str, bounds: RawBounds) -> Result<Domain, SchemaError> {
    let missing = |key| SchemaError::MissingKey {
        parameter: parameter.to_string(),
        key,
    };
    let lower = bounds.lower.ok_or_else(|| missing("lower"))?;
    let upper = bounds.upper.ok_or_else(|| missing("upper"))?;
    check_ordered(parameter, lower, upper)?;
    QuantileMap::new(parameter, bounds.distribution, lower, upper)?;
    Ok(Domain::Bounded {
        lower,
        upper,
        distribution: bounds.distribution,
    })
}

fn check_ordered(parameter: &str, lower: f64, upper: f64) -> Result<(), SchemaError> {
    if !lower.is_finite() || !upper.is_finite() {
        return Err(SchemaError::NonFinite {
            parameter: parameter.to_string(),
        });
    }
    if lower >= upper {
        return Err(SchemaError::InvertedBounds {
            parameter: parameter.to_string(),
            lower,
            upper,
        });
    }
    Ok(())
}

/// Fluent builder for [`ParameterSchema`]
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    raw: RawSchema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter with explicit candidate values
    pub fn discrete<V: Into<ParameterValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.raw.0.push((name.into(), RawDomain::Values(values)));
        self
    }

    /// Add a uniformly distributed bounded parameter
    pub fn bounded(self, name: impl Into<String>, lower: f64, upper: f64) -> Self {
        self.distributed(name, lower, upper, Distribution::Uniform)
    }

    /// Add a bounded parameter with an explicit distribution
    pub fn distributed(
        mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        distribution: Distribution,
    ) -> Self {
        self.raw.0.push((
            name.into(),
            RawDomain::Bounds(RawBounds {
                lower: Some(lower),
                upper: Some(upper),
                distribution,
            }),
        ));
        self
    }

    pub fn build(self) -> Result<ParameterSchema, SchemaError> {
        ParameterSchema::from_raw(self.raw)
    }
}
