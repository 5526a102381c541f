use super::{OpIterator, Predicate};
use crate::{
    error::SmallError,
    storage::{Schema, Tuple},
    types::SmallResult,
};

/// Passes through the tuples of the child that satisfy the predicate.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    lookahead: Option<Tuple>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        Self {
            predicate,
            child,
            lookahead: None,
        }
    }

    pub fn get_predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> SmallResult {
        self.lookahead = None;
        self.child.open()
    }

    fn close(&mut self) {
        self.lookahead = None;
        self.child.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.lookahead = None;
        self.child.rewind()
    }

    fn get_schema(&self) -> &Schema {
        self.child.get_schema()
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            if self.predicate.filter(&tuple) {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn lookahead(&mut self) -> &mut Option<Tuple> {
        &mut self.lookahead
    }
}
