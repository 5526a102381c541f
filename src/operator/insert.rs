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

/// Inserts the tuples read from the child into a table. Yields a single
/// tuple holding the number of inserted tuples.
pub struct Insert {
    tx: Transaction,
    buffer_pool: Arc<BufferPool>,
    child: Box<dyn OpIterator>,
    table_id: u32,

    schema: Schema,

    // the count tuple has been handed out
    done: bool,
    lookahead: Option<Tuple>,
}

impl Insert {
    pub fn new(
        tx: &Transaction,
        buffer_pool: &Arc<BufferPool>,
        child: Box<dyn OpIterator>,
        table_id: u32,
    ) -> Self {
        Self {
            tx: *tx,
            buffer_pool: Arc::clone(buffer_pool),
            child,
            table_id,
            schema: Schema::new(vec![Field::new("inserted", Type::Int)]),
            done: false,
            lookahead: None,
        }
    }
}

impl OpIterator for Insert {
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
            self.buffer_pool
                .insert_tuple(&self.tx, self.table_id, &tuple)?;
            count += 1;
        }
        debug!("{} inserted {} tuples into table {}", self.tx, count, self.table_id);

        self.done = true;
        Ok(Some(Tuple::new(vec![Cell::Int(count)])))
    }

    fn lookahead(&mut self) -> &mut Option<Tuple> {
        &mut self.lookahead
    }
}
