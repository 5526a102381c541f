use std::sync::Arc;

use super::OpIterator;
use crate::{
    buffer_pool::BufferPool,
    catalog::Catalog,
    error::SmallError,
    heap::HeapFileIterator,
    storage::{Schema, Tuple},
    transaction::Transaction,
    types::SmallResult,
};

/// Reads every tuple of a table in no particular order, as part of the
/// given transaction.
pub struct SeqScan {
    table_id: u32,
    table_alias: String,

    // field names are prefixed with the alias
    schema: Schema,

    it: HeapFileIterator,
    lookahead: Option<Tuple>,
}

impl SeqScan {
    pub fn new(
        tx: &Transaction,
        catalog: &Catalog,
        buffer_pool: &Arc<BufferPool>,
        table_id: u32,
        table_alias: &str,
    ) -> Result<Self, SmallError> {
        let file = catalog.get_file(table_id)?;
        let schema = file.get_schema().with_alias(table_alias);
        let it = file.iter(tx, buffer_pool);

        Ok(Self {
            table_id,
            table_alias: table_alias.to_string(),
            schema,
            it,
            lookahead: None,
        })
    }

    pub fn get_table_id(&self) -> u32 {
        self.table_id
    }

    pub fn get_alias(&self) -> &str {
        &self.table_alias
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> SmallResult {
        self.lookahead = None;
        self.it.open()
    }

    fn close(&mut self) {
        self.lookahead = None;
        self.it.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.lookahead = None;
        self.it.rewind()
    }

    fn get_schema(&self) -> &Schema {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        if self.it.has_next()? {
            Ok(Some(self.it.next()?))
        } else {
            Ok(None)
        }
    }

    fn lookahead(&mut self) -> &mut Option<Tuple> {
        &mut self.lookahead
    }
}
