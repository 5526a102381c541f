use super::{JoinPredicate, OpIterator};
use crate::{
    error::SmallError,
    storage::{Schema, Tuple},
    types::SmallResult,
};

/// Nested loop join. For every tuple of the left child the right child is
/// scanned from the start, matching pairs are emitted as one tuple with
/// the left cells first.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,

    schema: Schema,

    // the left tuple the right child is currently scanned for
    current_left: Option<Tuple>,
    lookahead: Option<Tuple>,
}

impl Join {
    pub fn new(
        predicate: JoinPredicate,
        left: Box<dyn OpIterator>,
        right: Box<dyn OpIterator>,
    ) -> Self {
        let schema = Schema::merge(left.get_schema(), right.get_schema());
        Self {
            predicate,
            left,
            right,
            schema,
            current_left: None,
            lookahead: None,
        }
    }

    pub fn get_predicate(&self) -> &JoinPredicate {
        &self.predicate
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> SmallResult {
        self.current_left = None;
        self.lookahead = None;
        self.left.open()?;
        self.right.open()
    }

    fn close(&mut self) {
        self.current_left = None;
        self.lookahead = None;
        self.right.close();
        self.left.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.current_left = None;
        self.lookahead = None;
        self.left.rewind()?;
        self.right.rewind()
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        loop {
            if self.current_left.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.current_left = Some(self.left.next()?);
                self.right.rewind()?;
            }

            if let Some(left) = &self.current_left {
                while self.right.has_next()? {
                    let right = self.right.next()?;
                    if self.predicate.filter(left, &right) {
                        return Ok(Some(Tuple::merge(left, &right)));
                    }
                }
            }

            // right child exhausted, move on to the next left tuple
            self.current_left = None;
        }
    }

    fn lookahead(&mut self) -> &mut Option<Tuple> {
        &mut self.lookahead
    }
}
