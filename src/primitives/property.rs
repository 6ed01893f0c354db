//! The `Property` variant: a small tagged union attached to atoms, residues,
//! and frames for open-ended metadata (titles, per-atom annotations, ...).

use super::vector::Vector3D;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single property value. Exactly one of {bool, double, string, Vector3D}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    Bool(bool),
    Double(f64),
    String(String),
    Vector3D(Vector3D),
}

impl Property {
    fn kind(&self) -> &'static str {
        match self {
            Property::Bool(_) => "bool",
            Property::Double(_) => "double",
            Property::String(_) => "string",
            Property::Vector3D(_) => "Vector3D",
        }
    }

    fn wrong_kind(&self, expected: &str) -> Error {
        Error::configuration(format!(
            "property is a {}, not a {}",
            self.kind(),
            expected
        ))
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Property::Bool(b) => Ok(*b),
            other => Err(other.wrong_kind("bool")),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match self {
            Property::Double(d) => Ok(*d),
            other => Err(other.wrong_kind("double")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Property::String(s) => Ok(s.as_str()),
            other => Err(other.wrong_kind("string")),
        }
    }

    pub fn as_vector3d(&self) -> Result<Vector3D> {
        match self {
            Property::Vector3D(v) => Ok(*v),
            other => Err(other.wrong_kind("Vector3D")),
        }
    }
}

impl From<bool> for Property {
    fn from(b: bool) -> Self {
        Property::Bool(b)
    }
}

impl From<f64> for Property {
    fn from(d: f64) -> Self {
        Property::Double(d)
    }
}

impl From<String> for Property {
    fn from(s: String) -> Self {
        Property::String(s)
    }
}

impl From<&str> for Property {
    fn from(s: &str) -> Self {
        Property::String(s.to_string())
    }
}

impl From<Vector3D> for Property {
    fn from(v: Vector3D) -> Self {
        Property::Vector3D(v)
    }
}
