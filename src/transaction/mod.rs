mod lock_manager;
mod tx;

pub use lock_manager::{Lock, LockManager, Permission};
pub use tx::{Transaction, TransactionID};
