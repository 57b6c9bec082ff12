use bevy_math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::errors::{GraphError, GraphResult};

/// Semantic type of an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrType {
    Bool,
    Int,
    Float,
    /// Enum with its ordered field names.
    Enum(Vec<String>),
    String,
    Matrix,
    Vector3,
    /// Value-less pointer attribute, only ever connected.
    Message,
    /// Structured byte payload.
    Payload,
    Compound,
}

impl AttrType {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Enum(_) => "enum",
            Self::String => "string",
            Self::Matrix => "matrix",
            Self::Vector3 => "vector3",
            Self::Message => "message",
            Self::Payload => "payload",
            Self::Compound => "compound",
        }
    }

    pub fn default_value(&self) -> Option<AttrValue> {
        match self {
            Self::Bool => Some(AttrValue::Bool(false)),
            Self::Int => Some(AttrValue::Int(0)),
            Self::Float => Some(AttrValue::Float(0.)),
            Self::Enum(_) => Some(AttrValue::Enum(0)),
            Self::String => Some(AttrValue::String(String::new())),
            Self::Matrix => Some(AttrValue::Matrix(Mat4::IDENTITY)),
            Self::Vector3 => Some(AttrValue::Vector3(Vec3::ZERO)),
            Self::Payload => Some(AttrValue::Payload(Vec::new())),
            Self::Message | Self::Compound => None,
        }
    }

    pub fn holds_value(&self) -> bool {
        !matches!(self, Self::Message | Self::Compound)
    }

    /// Converts `value` into this type where the conversion is lossless enough to be
    /// accepted by a connection or a set.
    pub fn coerce(&self, value: AttrValue) -> GraphResult<AttrValue> {
        let coerced = match (self, value) {
            (Self::Bool, AttrValue::Bool(v)) => AttrValue::Bool(v),
            (Self::Bool, AttrValue::Int(v)) => AttrValue::Bool(v != 0),
            (Self::Int, AttrValue::Int(v)) => AttrValue::Int(v),
            (Self::Int, AttrValue::Enum(v)) => AttrValue::Int(v as i64),
            (Self::Int, AttrValue::Bool(v)) => AttrValue::Int(v as i64),
            (Self::Float, AttrValue::Float(v)) => AttrValue::Float(v),
            (Self::Float, AttrValue::Int(v)) => AttrValue::Float(v as f32),
            (Self::Enum(_), AttrValue::Enum(v)) => AttrValue::Enum(v),
            (Self::Enum(_), AttrValue::Int(v)) if v >= 0 => AttrValue::Enum(v as usize),
            (Self::String, AttrValue::String(v)) => AttrValue::String(v),
            (Self::Matrix, AttrValue::Matrix(v)) => AttrValue::Matrix(v),
            (Self::Vector3, AttrValue::Vector3(v)) => AttrValue::Vector3(v),
            (Self::Payload, AttrValue::Payload(v)) => AttrValue::Payload(v),
            (ty, value) => {
                return Err(GraphError::MismatchedDataType(
                    ty.type_name().into(),
                    value.type_name().into(),
                ));
            }
        };
        Ok(coerced)
    }

    /// Whether a connection from `source` into this type may be made.
    pub fn accepts_connection_from(&self, source: &AttrType) -> bool {
        use AttrType::*;
        match (self, source) {
            (Message, Message) => true,
            (Message, _) | (_, Message) => false,
            (Compound, Compound) => true,
            (Compound, _) | (_, Compound) => false,
            (Bool | Int | Float | Enum(_), Bool | Int | Float | Enum(_)) => true,
            (a, b) => a.type_name() == b.type_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Enum(usize),
    String(String),
    Matrix(Mat4),
    Vector3(Vec3),
    Payload(Vec<u8>),
}

impl AttrValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Enum(_) => "enum",
            Self::String(_) => "string",
            Self::Matrix(_) => "matrix",
            Self::Vector3(_) => "vector3",
            Self::Payload(_) => "payload",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Int(v) => Some(*v != 0),
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

    /// Integer-like values (ints and enum indices).
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Enum(v) => Some(*v),
            Self::Int(v) if *v >= 0 => Some(*v as usize),
            Self::Bool(v) => Some(*v as usize),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Enum(v) => Some(*v as i64),
            Self::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<Mat4> {
        match self {
            Self::Matrix(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_payload(&self) -> Option<&[u8]> {
        match self {
            Self::Payload(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Mat4> for AttrValue {
    fn from(value: Mat4) -> Self {
        Self::Matrix(value)
    }
}

impl From<Vec3> for AttrValue {
    fn from(value: Vec3) -> Self {
        Self::Vector3(value)
    }
}

/// Serialization proxy for [`AttrValue`], keeping math types as plain arrays.
#[derive(Serialize, Deserialize)]
enum AttrValueSerial {
    Bool(bool),
    Int(i64),
    Float(f32),
    Enum(usize),
    String(String),
    Matrix([f32; 16]),
    Vector3([f32; 3]),
    Payload(Vec<u8>),
}

impl AttrValueSerial {
    fn from_value(value: &AttrValue) -> Self {
        match value {
            AttrValue::Bool(v) => Self::Bool(*v),
            AttrValue::Int(v) => Self::Int(*v),
            AttrValue::Float(v) => Self::Float(*v),
            AttrValue::Enum(v) => Self::Enum(*v),
            AttrValue::String(v) => Self::String(v.clone()),
            AttrValue::Matrix(v) => Self::Matrix(v.to_cols_array()),
            AttrValue::Vector3(v) => Self::Vector3(v.to_array()),
            AttrValue::Payload(v) => Self::Payload(v.clone()),
        }
    }

    fn to_value(self) -> AttrValue {
        match self {
            Self::Bool(v) => AttrValue::Bool(v),
            Self::Int(v) => AttrValue::Int(v),
            Self::Float(v) => AttrValue::Float(v),
            Self::Enum(v) => AttrValue::Enum(v),
            Self::String(v) => AttrValue::String(v),
            Self::Matrix(v) => AttrValue::Matrix(Mat4::from_cols_array(&v)),
            Self::Vector3(v) => AttrValue::Vector3(Vec3::from_array(v)),
            Self::Payload(v) => AttrValue::Payload(v),
        }
    }
}

impl Serialize for AttrValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        AttrValueSerial::from_value(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        AttrValueSerial::deserialize(deserializer).map(AttrValueSerial::to_value)
    }
}

/// Definition of an attribute living on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrDef {
    pub name: String,
    pub ty: AttrType,
    pub parent: Option<String>,
    pub multi: bool,
    pub locked: bool,
    pub keyable: bool,
    pub alias: Option<String>,
    pub default: Option<AttrValue>,
    /// Added after node creation rather than provided by the node type.
    pub dynamic: bool,
}

impl AttrDef {
    pub fn new(name: impl Into<String>, ty: AttrType) -> Self {
        Self {
            name: name.into(),
            ty,
            parent: None,
            multi: false,
            locked: false,
            keyable: false,
            alias: None,
            default: None,
            dynamic: true,
        }
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<AttrValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub(crate) fn builtin(mut self) -> Self {
        self.dynamic = false;
        self
    }

    pub fn default_value(&self) -> Option<AttrValue> {
        self.default.clone().or_else(|| self.ty.default_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coercion_accepts_numeric_widening() {
        let ty = AttrType::Float;
        assert_eq!(ty.coerce(AttrValue::Int(3)), Ok(AttrValue::Float(3.)));
        let ty = AttrType::Enum(vec!["a".into(), "b".into()]);
        assert_eq!(ty.coerce(AttrValue::Int(1)), Ok(AttrValue::Enum(1)));
        assert!(AttrType::Matrix.coerce(AttrValue::Float(1.)).is_err());
    }

    #[test]
    fn messages_only_connect_to_messages() {
        assert!(AttrType::Message.accepts_connection_from(&AttrType::Message));
        assert!(!AttrType::Message.accepts_connection_from(&AttrType::Matrix));
        assert!(AttrType::Enum(vec![]).accepts_connection_from(&AttrType::Int));
        assert!(!AttrType::Matrix.accepts_connection_from(&AttrType::Vector3));
    }

    #[test]
    fn value_serializes_through_ron() {
        let value = AttrValue::Matrix(Mat4::from_translation(Vec3::new(1., 2., 3.)));
        let text = ron::to_string(&value).unwrap();
        let back: AttrValue = ron::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}
