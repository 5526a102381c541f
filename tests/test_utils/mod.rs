#![allow(dead_code)]

mod data_rw;
mod setup;
mod tuple_iter;

pub use data_rw::*;
pub use setup::*;
pub use tuple_iter::TupleIterator;
