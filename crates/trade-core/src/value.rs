//! Typed field values.

use chrono::{DateTime, SubsecRound, Utc};

use crate::schema::{FieldDefault, FieldKind};

/// The logical value of one message field.
///
/// `Unset` is what an empty optional field decodes to, and what a
/// freshly created message holds before it is populated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Unset,
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Time(DateTime<Utc>),
}

impl FieldValue {
    pub fn is_unset(&self) -> bool {
        matches!(self, FieldValue::Unset)
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Unset => "unset",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::Bool(_) => "bool",
            FieldValue::Time(_) => "time",
        }
    }

    /// Whether this value can be stored in a field of `kind`.
    ///
    /// Integers are accepted by float fields (see [`FieldValue::coerce`]).
    pub fn fits(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (FieldValue::Unset, _)
                | (FieldValue::Int(_), FieldKind::Int | FieldKind::Float)
                | (FieldValue::Float(_), FieldKind::Float)
                | (FieldValue::Str(_), FieldKind::Str)
                | (FieldValue::Bool(_), FieldKind::Bool)
                | (FieldValue::Time(_), FieldKind::Epoch | FieldKind::DateTime)
        )
    }

    /// Convert an accepted value into the canonical variant for `kind`.
    ///
    /// Timestamps are truncated to whole seconds, the finest precision
    /// either wire form carries.
    pub fn coerce(self, kind: FieldKind) -> Self {
        match (self, kind) {
            (FieldValue::Int(v), FieldKind::Float) => FieldValue::Float(v as f64),
            (FieldValue::Time(t), FieldKind::Epoch | FieldKind::DateTime) => FieldValue::Time(t.trunc_subsecs(0)),
            (value, _) => value,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Time(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<FieldDefault> for FieldValue {
    fn from(d: FieldDefault) -> Self {
        match d {
            FieldDefault::Int(v) => FieldValue::Int(v),
            FieldDefault::Float(v) => FieldValue::Float(v),
            FieldDefault::Str(v) => FieldValue::Str(v.to_string()),
            FieldDefault::Bool(v) => FieldValue::Bool(v),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Time(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}
