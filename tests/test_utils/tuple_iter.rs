use small_heap::{types::SmallResult, OpIterator, Schema, SmallError, Tuple};

/// An operator over tuples kept in memory.
pub struct TupleIterator {
    schema: Schema,
    tuples: Vec<Tuple>,

    // `None` when closed
    cursor: Option<usize>,
    lookahead: Option<Tuple>,
}

impl TupleIterator {
    pub fn new(schema: Schema, tuples: Vec<Tuple>) -> Self {
        Self {
            schema,
            tuples,
            cursor: None,
            lookahead: None,
        }
    }
}

impl OpIterator for TupleIterator {
    fn open(&mut self) -> SmallResult {
        self.cursor = Some(0);
        self.lookahead = None;
        Ok(())
    }

    fn close(&mut self) {
        self.cursor = None;
        self.lookahead = None;
    }

    fn rewind(&mut self) -> SmallResult {
        self.open()
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        match self.cursor {
            Some(i) if i < self.tuples.len() => {
                self.cursor = Some(i + 1);
                Ok(Some(self.tuples[i].clone()))
            }
            _ => Ok(None),
        }
    }

    fn lookahead(&mut self) -> &mut Option<Tuple> {
        &mut self.lookahead
    }
}
