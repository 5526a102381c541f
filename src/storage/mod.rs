mod cell;
mod schema;
mod tuple;

pub use cell::Cell;
pub use schema::{Field, Schema, Type, STRING_LEN};
pub use tuple::{RecordId, Tuple};
