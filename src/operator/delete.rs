use std::sync::Arc;

use log::debug;

use super::OpIterator;
use crate::{
    buffer_pool::BufferPool,
    error::SmallError,
    storage::{Cell, Field, Schema, Tuple, Type},
    transaction::Transaction,
    types::SmallResult,
};

/// Removes the tuples read from the child from the table they were read
/// from. Yields a single tuple holding the number of deleted tuples.
pub struct Delete {
    tx: Transaction,
    buffer_pool: Arc<BufferPool>,
    child: Box<dyn OpIterator>,

    schema: Schema,

    done: bool,
    lookahead: Option<Tuple>,
}

impl Delete {
    pub fn new(
        tx: &Transaction,
        buffer_pool: &Arc<BufferPool>,
        child: Box<dyn OpIterator>,
    ) -> Self {
        Self {
            tx: *tx,
            buffer_pool: Arc::clone(buffer_pool),
            child,
            schema: Schema::new(vec![Field::new("deleted", Type::Int)]),
            done: false,
            lookahead: None,
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> SmallResult {
        self.done = false;
        self.lookahead = None;
        self.child.open()
    }

    fn close(&mut self) {
        self.lookahead = None;
        self.child.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.done = false;
        self.lookahead = None;
        self.child.rewind()
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        if self.done {
            return Ok(None);
        }

        let mut count = 0;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.buffer_pool.delete_tuple(&self.tx, &tuple)?;
            count += 1;
        }
        debug!("{} deleted {} tuples", self.tx, count);

        self.done = true;
        Ok(Some(Tuple::new(vec![Cell::Int(count)])))
    }

    fn lookahead(&mut self) -> &mut Option<Tuple> {
        &mut self.lookahead
    }
}
