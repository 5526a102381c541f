mod delete;
mod filter;
mod insert;
mod join;
mod seq_scan;

use std::fmt;

pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use join::Join;
pub use seq_scan::SeqScan;

use crate::{
    error::SmallError,
    storage::{Cell, Schema, Tuple},
    types::SmallResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    Like,
    NotEquals,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Op::Equals => "=",
            Op::GreaterThan => ">",
            Op::GreaterThanOrEq => ">=",
            Op::LessThan => "<",
            Op::LessThanOrEq => "<=",
            Op::Like => "LIKE",
            Op::NotEquals => "<>",
        };
        write!(f, "{}", s)
    }
}

/// Compares a field of a tuple against a constant.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field_index: usize,
    pub op: Op,
    pub cell: Cell,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, cell: Cell) -> Self {
        Self {
            field_index,
            op,
            cell,
        }
    }

    pub fn filter(&self, tuple: &Tuple) -> bool {
        tuple.get_cell(self.field_index).compare(&self.op, &self.cell)
    }
}

/// Compares a field of one tuple against a field of another tuple.
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    pub left_field: usize,
    pub op: Op,
    pub right_field: usize,
}

impl JoinPredicate {
    pub fn new(left_field: usize, op: Op, right_field: usize) -> Self {
        Self {
            left_field,
            op,
            right_field,
        }
    }

    pub fn filter(&self, left: &Tuple, right: &Tuple) -> bool {
        left.get_cell(self.left_field)
            .compare(&self.op, right.get_cell(self.right_field))
    }
}

/// The pull-based cursor every operator implements.
///
/// Operators only implement `fetch_next`, the tuple it returns is kept in
/// `lookahead` until `next` hands it out.
pub trait OpIterator {
    fn open(&mut self) -> SmallResult;

    fn close(&mut self);

    /// Start over from the first tuple.
    fn rewind(&mut self) -> SmallResult;

    fn get_schema(&self) -> &Schema;

    /// Produce the next tuple, `None` once the operator is exhausted.
    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError>;

    fn lookahead(&mut self) -> &mut Option<Tuple>;

    fn has_next(&mut self) -> Result<bool, SmallError> {
        if self.lookahead().is_none() {
            let tuple = self.fetch_next()?;
            *self.lookahead() = tuple;
        }
        Ok(self.lookahead().is_some())
    }

    fn next(&mut self) -> Result<Tuple, SmallError> {
        if !self.has_next()? {
            return Err(SmallError::NoSuchElement);
        }
        self.lookahead().take().ok_or(SmallError::NoSuchElement)
    }
}
