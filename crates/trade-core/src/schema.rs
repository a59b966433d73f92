//! Declarative field schemas.
//!
//! Every wire message kind is described by a [`Schema`]: a stable
//! numeric tag, a direction, and an ordered list of [`FieldSpec`]s.
//! Fields are positional on the wire, so declaration order matters.
//!
//! Each field carries an inclusive protocol-version window
//! (`since..=until`). At a negotiated version `v` only the fields whose
//! window contains `v` exist on the wire; the rest are skipped by both
//! the encoder and the decoder.
//!
//! Schemas are plain `const` data so a catalogue can be written as a
//! table of `static` items:
//!
//! ```
//! use trade_core::schema::{int, Schema};
//! use trade_core::Direction;
//!
//! static CANCEL: Schema = Schema {
//!     name: "CancelMktData",
//!     direction: Direction::Outbound,
//!     tag: 2,
//!     fields: &[int("version").with_default_int(2), int("req_id")],
//!     request_id_field: Some("req_id"),
//! };
//!
//! assert_eq!(CANCEL.field_index("req_id"), Some(1));
//! ```

use crate::direction::Direction;

/// Wire representation of a single field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Signed decimal integer.
    Int,
    /// Decimal floating point.
    Float,
    /// Free text (must not contain NUL).
    Str,
    /// `0` / `1`.
    Bool,
    /// Timestamp as decimal seconds since the Unix epoch.
    Epoch,
    /// Timestamp as `yyyyMMdd HH:mm:ss`, optional trailing zone ignored.
    DateTime,
}

/// Value written when a field is left unset on encode.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FieldDefault {
    Int(i64),
    Float(f64),
    Str(&'static str),
    Bool(bool),
}

/// One positional field of a message.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Optional fields may be empty on the wire (decoded as `Unset`)
    /// and may be left unset on encode.
    pub optional: bool,
    pub default: Option<FieldDefault>,
    /// First protocol version carrying this field.
    pub since: u32,
    /// Last protocol version carrying this field.
    pub until: u32,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec {
            name,
            kind,
            optional: false,
            default: None,
            since: 0,
            until: u32::MAX,
        }
    }

    pub const fn optional(self) -> Self {
        FieldSpec {
            optional: true,
            ..self
        }
    }

    pub const fn since(self, version: u32) -> Self {
        FieldSpec {
            since: version,
            ..self
        }
    }

    pub const fn until(self, version: u32) -> Self {
        FieldSpec {
            until: version,
            ..self
        }
    }

    pub const fn with_default(self, default: FieldDefault) -> Self {
        FieldSpec {
            default: Some(default),
            ..self
        }
    }

    pub const fn with_default_int(self, value: i64) -> Self {
        self.with_default(FieldDefault::Int(value))
    }

    pub const fn with_default_bool(self, value: bool) -> Self {
        self.with_default(FieldDefault::Bool(value))
    }

    /// True if the field is on the wire at `version`.
    pub fn is_active(&self, version: u32) -> bool {
        self.since <= version && version <= self.until
    }
}

pub const fn int(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Int)
}

pub const fn float(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Float)
}

pub const fn string(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Str)
}

pub const fn boolean(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Bool)
}

pub const fn epoch(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::Epoch)
}

pub const fn datetime(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, FieldKind::DateTime)
}

/// Field layout of one message kind.
#[derive(Debug)]
pub struct Schema {
    /// Human-readable name, used in logs and errors.
    pub name: &'static str,
    pub direction: Direction,
    /// Numeric tag written as the first field of every frame.
    pub tag: u32,
    /// Every field across all versions, in wire order.
    pub fields: &'static [FieldSpec],
    /// Name of the field echoing the caller's request id, if any.
    pub request_id_field: Option<&'static str>,
}

impl Schema {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields present on the wire at `version`, with their index into
    /// [`Schema::fields`].
    pub fn active_fields(&self, version: u32) -> impl Iterator<Item = (usize, &FieldSpec)> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter(move |(_, f)| f.is_active(version))
    }

    /// Minimum number of fields (after the tag) a frame must carry at
    /// `version`: everything up to and including the last non-optional
    /// active field. Trailing optional fields may be omitted.
    pub fn required_count(&self, version: u32) -> usize {
        let mut count = 0;
        for (position, (_, field)) in self.active_fields(version).enumerate() {
            if !field.optional {
                count = position + 1;
            }
        }
        count
    }

    pub fn request_id_index(&self) -> Option<usize> {
        self.request_id_field.and_then(|name| self.field_index(name))
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.direction == other.direction && self.tag == other.tag
    }
}
