//! Read-only views for build-configuration code
//!
//! [`StudyView`] iterates sets in study order and serializes as an ordered
//! `{set name: {parameter: value}}` mapping.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::study::{Column, ParameterSet, ParameterStudy};
use crate::value::ParameterValue;

/// Ordered set name → parameter values view of a study
#[derive(Debug, Clone, Copy)]
pub struct StudyView<'a> {
    study: &'a ParameterStudy,
}

/// One parameter set seen as a parameter name → value mapping
#[derive(Debug, Clone, Copy)]
pub struct ParameterSetView<'a> {
    study: &'a ParameterStudy,
    position: usize,
}

impl ParameterStudy {
    pub fn query(&self) -> StudyView<'_> {
        StudyView { study: self }
    }
}

impl<'a> StudyView<'a> {
    pub fn len(&self) -> usize {
        self.study.len()
    }

    pub fn is_empty(&self) -> bool {
        self.study.is_empty()
    }

    pub fn set_names(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.study.set_names()
    }

    pub fn iter(&self) -> impl Iterator<Item = ParameterSetView<'a>> + use<'a> {
        let study = self.study;
        (0..study.len()).map(move |position| ParameterSetView { study, position })
    }

    pub fn get(&self, set_name: &str) -> Option<ParameterSetView<'a>> {
        let position = *self.study.by_name.get(set_name)?;
        Some(ParameterSetView {
            study: self.study,
            position,
        })
    }

    pub fn value(&self, set_name: &str, parameter: &str) -> Option<&'a ParameterValue> {
        self.get(set_name)?.get(parameter)
    }
}

impl<'a> ParameterSetView<'a> {
    fn set(&self) -> &'a ParameterSet {
        &self.study.sets[self.position]
    }

    pub fn name(&self) -> &'a str {
        self.set().name()
    }

    /// Position of the set in study order
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn get(&self, parameter: &str) -> Option<&'a ParameterValue> {
        let column = self.study.column_index(parameter)?;
        self.set().values().get(column)
    }

    /// `(parameter, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a ParameterValue)> + use<'a> {
        let columns: &'a [Column] = self.study.columns();
        columns
            .iter()
            .map(|c| c.name.as_str())
            .zip(self.set().values())
    }

    /// Downstream quantity recorded for this set
    pub fn quantity(&self, name: &str) -> Option<&'a serde_json::Value> {
        self.study
            .quantity(name)
            .and_then(|q| q.values.get(self.position))
    }
}

impl Serialize for StudyView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for set in self.iter() {
            map.serialize_entry(set.name(), &set)?;
        }
        map.end()
    }
}

impl Serialize for ParameterSetView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.study.columns().len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
