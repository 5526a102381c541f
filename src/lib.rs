pub mod buffer_pool;
pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod heap;
pub mod operator;
pub mod storage;
pub mod transaction;
pub mod types;
pub mod utils;

mod io;
mod log;

pub use buffer_pool::BufferPool;
pub use catalog::Catalog;
pub use config::Config;
pub use database::Database;
pub use error::SmallError;
pub use heap::{HeapFile, HeapPage, HeapPageID};
pub use operator::{Op, OpIterator, Predicate};
pub use storage::{Cell, Field, RecordId, Schema, Tuple, Type};
pub use transaction::{Lock, Permission, Transaction};
