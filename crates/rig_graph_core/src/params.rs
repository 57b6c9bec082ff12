//! Structured parameters carried by hierarchy entries and stored on the graph as
//! MessagePack bytes.

use bevy_math::Vec3;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{RigError, RigResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Str(String),
    Vec3([f32; 3]),
    List(Vec<ParamValue>),
    Map(IndexMap<String, ParamValue>),
}

impl Default for ParamValue {
    fn default() -> Self {
        Self::Map(IndexMap::new())
    }
}

impl ParamValue {
    pub fn map() -> Self {
        Self::default()
    }

    /// Builder-style insert. Turns a non-map value into a map first.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        if !matches!(self, Self::Map(_)) {
            *self = Self::map();
        }
        if let Self::Map(map) = self {
            map.insert(key.into(), value.into());
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Map(map) => map.is_empty(),
            Self::List(list) => list.is_empty(),
            _ => false,
        }
    }

    /// Keys of `overlay` win. Nested maps are merged recursively.
    #[must_use]
    pub fn merged(&self, overlay: &ParamValue) -> ParamValue {
        match (self, overlay) {
            (Self::Map(base), Self::Map(top)) => {
                let mut out = base.clone();
                for (key, value) in top {
                    let value = match out.get(key) {
                        Some(existing) => existing.merged(value),
                        None => value.clone(),
                    };
                    out.insert(key.clone(), value);
                }
                Self::Map(out)
            }
            _ => overlay.clone(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// A vector, or a uniform vector from a single number.
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(Vec3::from_array(*v)),
            _ => self.as_float().map(Vec3::splat),
        }
    }

    pub fn to_bytes(&self) -> RigResult<Vec<u8>> {
        rmp_serde::to_vec_named(self).map_err(|err| RigError::Payload(err.to_string()))
    }

    /// Empty input decodes to an empty map, which is what an unset payload attribute
    /// holds.
    pub fn from_bytes(bytes: &[u8]) -> RigResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::map());
        }
        rmp_serde::from_slice(bytes).map_err(|err| RigError::Payload(err.to_string()))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec3> for ParamValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value.to_array())
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(value: Vec<ParamValue>) -> Self {
        Self::List(value)
    }
}
