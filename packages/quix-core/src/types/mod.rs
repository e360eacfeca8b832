//! Value, row and schema types shared by every storage component.

mod record;
mod schema;
mod value;

pub use record::{Record, RowId};
pub use schema::Schema;
pub use value::{ColumnType, Row, Value};
