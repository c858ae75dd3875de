mod schema;
mod traits;

pub use schema::{FieldError, FieldType, ObjectSchema, Schema, SchemaError};
pub use traits::{Args, Context, EventStream, Operation};
