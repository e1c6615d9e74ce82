// kestrel_core/src/parameters.rs

//! Named, typed tunables.
//!
//! Every `Measurement` publishes its tunables (and its model's) as a
//! [`ParameterSet`]. External configuration loading produces a `ParameterSet`
//! of overrides, which is applied back with `Measurement::configure`.

use num_traits::NumCast;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ParameterError;

/// The value of a single tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Number(f64),
    Vector(Vec<f64>),
    Text(String),
}

impl ParameterValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParameterValue::Bool(_) => "bool",
            ParameterValue::Number(_) => "number",
            ParameterValue::Vector(_) => "vector",
            ParameterValue::Text(_) => "text",
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Bool(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Number(value)
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(value: Vec<f64>) -> Self {
        ParameterValue::Vector(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Text(value.to_string())
    }
}

/// An ordered collection of named parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ParameterValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Copies every entry of `other` into `self`, overwriting duplicates.
    pub fn extend(&mut self, other: ParameterSet) {
        self.values.extend(other.values);
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ParameterError> {
        match self.require(name)? {
            ParameterValue::Bool(b) => Ok(*b),
            other => Err(type_mismatch(name, "bool", other)),
        }
    }

    pub fn get_number(&self, name: &str) -> Result<f64, ParameterError> {
        match self.require(name)? {
            ParameterValue::Number(n) => Ok(*n),
            other => Err(type_mismatch(name, "number", other)),
        }
    }

    /// Reads a numeric parameter and converts it to `T`, failing if the value
    /// does not fit (e.g. a negative number read as `usize`).
    pub fn get_as<T: NumCast>(&self, name: &str) -> Result<T, ParameterError> {
        number_as(name, self.require(name)?)
    }

    pub fn get_vector(&self, name: &str) -> Result<&[f64], ParameterError> {
        match self.require(name)? {
            ParameterValue::Vector(v) => Ok(v.as_slice()),
            other => Err(type_mismatch(name, "vector", other)),
        }
    }

    fn require(&self, name: &str) -> Result<&ParameterValue, ParameterError> {
        self.values
            .get(name)
            .ok_or_else(|| ParameterError::Unknown(name.to_string()))
    }
}

pub(crate) fn type_mismatch(
    name: &str,
    expected: &'static str,
    found: &ParameterValue,
) -> ParameterError {
    ParameterError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.type_name(),
    }
}

/// Converts a numeric parameter to `T`, rejecting values outside its range.
pub(crate) fn number_as<T: NumCast>(name: &str, value: &ParameterValue) -> Result<T, ParameterError> {
    match value {
        ParameterValue::Number(n) => <T as NumCast>::from(*n).ok_or_else(|| ParameterError::OutOfRange {
            name: name.to_string(),
            value: *n,
            reason: "value does not fit the target type",
        }),
        other => Err(type_mismatch(name, "number", other)),
    }
}

/// Extracts a non-negative number, the common case for intervals and standard deviations.
pub(crate) fn non_negative(name: &str, value: &ParameterValue) -> Result<f64, ParameterError> {
    match value {
        ParameterValue::Number(n) if *n >= 0.0 && n.is_finite() => Ok(*n),
        ParameterValue::Number(n) => Err(ParameterError::OutOfRange {
            name: name.to_string(),
            value: *n,
            reason: "must be a finite, non-negative number",
        }),
        other => Err(type_mismatch(name, "number", other)),
    }
}
