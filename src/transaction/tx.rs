use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{buffer_pool::BufferPool, types::SmallResult};

pub type TransactionID = u32;

static TRANSACTION_ID: AtomicU32 = AtomicU32::new(1);

/// The unit of lock ownership and dirty-page attribution.
#[derive(Eq, PartialEq, Hash, Clone, Copy)]
pub struct Transaction {
    // increase monotonically by 1
    id: TransactionID,
}

impl Transaction {
    pub fn new() -> Self {
        let id = TRANSACTION_ID.fetch_add(1, Ordering::Relaxed);
        Self { id }
    }

    /// Force the pages dirtied by this transaction to disk, then release
    /// its locks.
    pub fn commit(&self, buffer_pool: &BufferPool) -> SmallResult {
        buffer_pool.transaction_complete(self, true)
    }

    /// Roll back the pages dirtied by this transaction, then release its
    /// locks.
    pub fn abort(&self, buffer_pool: &BufferPool) -> SmallResult {
        buffer_pool.transaction_complete(self, false)
    }

    pub fn get_id(&self) -> TransactionID {
        self.id
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tx_{}", self.id)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
