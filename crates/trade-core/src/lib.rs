//! trade-core
//!
//! Pure session data model:
//! - message direction and field schemas
//! - typed field values and schema-driven messages
//! - request-id allocation
//! - engine lifecycle state

pub mod direction;
pub mod schema;
pub mod value;
pub mod message;
pub mod request_id;
pub mod state;
pub mod error;

pub use direction::Direction;

pub use schema::{FieldDefault, FieldKind, FieldSpec, Schema};
pub use value::FieldValue;
pub use message::Message;

pub use request_id::{RequestId, RequestIdAllocator};
pub use state::EngineState;
pub use error::MessageError;
