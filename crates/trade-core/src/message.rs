//! Schema-driven wire messages.
//!
//! A [`Message`] is a schema plus one [`FieldValue`] per declared field.
//! Concrete request and reply kinds are not separate Rust types: the
//! catalogue of kinds is data (see [`crate::schema`]), and a message is
//! populated and read by field name.
//!
//! ```
//! use trade_core::schema::{int, string, Schema};
//! use trade_core::{Direction, Message, RequestId};
//!
//! static REQ: Schema = Schema {
//!     name: "ReqSomething",
//!     direction: Direction::Outbound,
//!     tag: 99,
//!     fields: &[int("req_id"), string("symbol")],
//!     request_id_field: Some("req_id"),
//! };
//!
//! let mut msg = Message::new(&REQ).with("symbol", "AUD").unwrap();
//! msg.set_request_id(RequestId(7)).unwrap();
//! assert_eq!(msg.request_id(), Some(RequestId(7)));
//! assert_eq!(msg.str("symbol"), Some("AUD"));
//! ```

use chrono::{DateTime, Utc};

use crate::direction::Direction;
use crate::error::MessageError;
use crate::request_id::RequestId;
use crate::schema::Schema;
use crate::value::FieldValue;

/// One decoded or to-be-encoded wire message.
#[derive(Debug, Clone)]
pub struct Message {
    schema: &'static Schema,
    values: Vec<FieldValue>,
}

impl Message {
    /// An empty message of the given kind: every field `Unset`.
    pub fn new(schema: &'static Schema) -> Self {
        Message {
            schema,
            values: vec![FieldValue::Unset; schema.fields.len()],
        }
    }

    /// Build a message from one value per schema field, in declaration
    /// order. Used by decoders.
    pub fn from_values(
        schema: &'static Schema,
        values: Vec<FieldValue>,
    ) -> Result<Self, MessageError> {
        if values.len() != schema.fields.len() {
            return Err(MessageError::Arity {
                message: schema.name,
                expected: schema.fields.len(),
                got: values.len(),
            });
        }
        Ok(Message { schema, values })
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    pub fn tag(&self) -> u32 {
        self.schema.tag
    }

    pub fn direction(&self) -> Direction {
        self.schema.direction
    }

    /// All values, aligned with `schema().fields`.
    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// Set a field by name.
    ///
    /// An empty string stored into an optional field becomes `Unset`,
    /// since both have the same wire form.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<&mut Self, MessageError> {
        let index = self
            .schema
            .field_index(name)
            .ok_or_else(|| MessageError::UnknownField {
                message: self.schema.name,
                field: name.to_string(),
            })?;
        let spec = &self.schema.fields[index];
        let value = value.into();

        if !value.fits(spec.kind) {
            return Err(MessageError::KindMismatch {
                message: self.schema.name,
                field: spec.name,
                expected: spec.kind,
                got: value.kind_name(),
            });
        }

        let value = match value {
            FieldValue::Str(s) if s.is_empty() && spec.optional => FieldValue::Unset,
            other => other.coerce(spec.kind),
        };
        self.values[index] = value;
        Ok(self)
    }

    /// Builder form of [`Message::set`].
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Result<Self, MessageError> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema.field_index(name).map(|i| &self.values[i])
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_float)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    pub fn time(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(FieldValue::as_time)
    }

    /// The request id echoed by this message, if its kind carries one
    /// and it is populated.
    pub fn request_id(&self) -> Option<RequestId> {
        let index = self.schema.request_id_index()?;
        self.values[index].as_int().map(RequestId)
    }

    pub fn set_request_id(&mut self, id: RequestId) -> Result<&mut Self, MessageError> {
        let name = self
            .schema
            .request_id_field
            .ok_or(MessageError::NoRequestId {
                message: self.schema.name,
            })?;
        self.set(name, id.0)
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.values == other.values
    }
}
