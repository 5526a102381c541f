use std::{error::Error, fmt, io};

use backtrace::Backtrace;
use log::error;

use crate::{
    heap::HeapPageID,
    transaction::{Lock, Transaction},
};

#[derive(Debug)]
pub enum SmallError {
    /// The lock could not be granted before the deadline. The transaction
    /// has to be aborted by the caller.
    LockTimeout {
        tx: Transaction,
        page_id: HeapPageID,
        lock: Lock,
    },

    /// The buffer pool is full and nothing in it may be evicted. A resident
    /// page is kept if it is dirty, or if a running transaction holds an
    /// exclusive lock on it even when the page is clean, or if its latch is
    /// taken at that moment.
    ResourceExhausted(String),

    Io(io::Error),

    NotFound(String),

    /// The iterator has no more tuples.
    NoSuchElement,

    Invalid(String),
}

impl SmallError {
    pub fn new(msg: &str) -> SmallError {
        SmallError::Invalid(msg.to_string())
    }

    pub fn not_found(msg: &str) -> SmallError {
        SmallError::NotFound(msg.to_string())
    }

    /// Whether the error requires the running transaction to be rolled
    /// back.
    pub fn is_abort(&self) -> bool {
        match self {
            SmallError::LockTimeout { .. } => true,
            _ => false,
        }
    }

    pub fn show_backtrace(&self) {
        let bt = Backtrace::new();
        error!("error: [{}], backtrace: {:?}", self, bt);
    }
}

impl fmt::Display for SmallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SmallError::LockTimeout { tx, page_id, lock } => write!(
                f,
                "acquire lock timeout, tx: {}, page: {:?}, lock: {:?}",
                tx, page_id, lock
            ),
            SmallError::ResourceExhausted(msg) => {
                write!(f, "resource exhausted: {}", msg)
            }
            SmallError::Io(e) => write!(f, "io error: {}", e),
            SmallError::NotFound(msg) => write!(f, "not found: {}", msg),
            SmallError::NoSuchElement => write!(f, "no such element"),
            SmallError::Invalid(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for SmallError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SmallError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SmallError {
    fn from(e: io::Error) -> Self {
        SmallError::Io(e)
    }
}
