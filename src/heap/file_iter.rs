use std::{iter::Peekable, sync::Arc, vec::IntoIter};

use super::{HeapFile, HeapPageID};
use crate::{
    buffer_pool::BufferPool,
    error::SmallError,
    storage::Tuple,
    transaction::{Permission, Transaction},
    types::SmallResult,
    utils::HandyRwLock,
};

/// Walks the pages of a heap file in order, holding a shared lock on every
/// page it has visited.
///
/// The cursor has to be opened before use, a closed cursor is always
/// exhausted.
pub struct HeapFileIterator {
    tx: Transaction,
    file: Arc<HeapFile>,
    buffer_pool: Arc<BufferPool>,

    page_index: usize,

    // tuples of the current page, `None` when the cursor is closed
    page_it: Option<Peekable<IntoIter<Tuple>>>,
}

impl HeapFileIterator {
    pub fn new(tx: &Transaction, file: &Arc<HeapFile>, buffer_pool: &Arc<BufferPool>) -> Self {
        Self {
            tx: *tx,
            file: Arc::clone(file),
            buffer_pool: Arc::clone(buffer_pool),
            page_index: 0,
            page_it: None,
        }
    }

    fn load_page(&self, page_index: usize) -> Result<Peekable<IntoIter<Tuple>>, SmallError> {
        let pid = HeapPageID::new(self.file.get_id(), page_index as u32);
        let page_rc = self
            .buffer_pool
            .get_page(&self.tx, Permission::ReadOnly, &pid)?;
        let tuples: Vec<Tuple> = page_rc.rl().iter().cloned().collect();
        Ok(tuples.into_iter().peekable())
    }

    pub fn open(&mut self) -> SmallResult {
        self.page_index = 0;
        if self.file.pages_count()? == 0 {
            self.page_it = Some(Vec::new().into_iter().peekable());
        } else {
            self.page_it = Some(self.load_page(0)?);
        }
        Ok(())
    }

    pub fn has_next(&mut self) -> Result<bool, SmallError> {
        loop {
            match self.page_it.as_mut() {
                None => return Ok(false),
                Some(it) => {
                    if it.peek().is_some() {
                        return Ok(true);
                    }
                }
            }

            // current page is exhausted, move to the next one
            if self.page_index + 1 >= self.file.pages_count()? {
                return Ok(false);
            }
            self.page_index += 1;
            self.page_it = Some(self.load_page(self.page_index)?);
        }
    }

    pub fn next(&mut self) -> Result<Tuple, SmallError> {
        if !self.has_next()? {
            return Err(SmallError::NoSuchElement);
        }

        self.page_it
            .as_mut()
            .and_then(|it| it.next())
            .ok_or(SmallError::NoSuchElement)
    }

    pub fn rewind(&mut self) -> SmallResult {
        self.close();
        self.open()
    }

    pub fn close(&mut self) {
        self.page_index = 0;
        self.page_it = None;
    }
}
