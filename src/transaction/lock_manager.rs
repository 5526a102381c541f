use core::fmt;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Condvar, Mutex},
    time::{Duration, Instant},
};

use log::{debug, warn};

use crate::{
    error::SmallError, heap::HeapPageID, transaction::Transaction, types::SmallResult,
    utils::HandyMutex,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Lock {
    XLock,
    SLock,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    pub fn to_lock(&self) -> Lock {
        match self {
            Permission::ReadOnly => Lock::SLock,
            Permission::ReadWrite => Lock::XLock,
        }
    }
}

#[derive(Default)]
struct LockState {
    s_holders: HashSet<Transaction>,
    x_holder: Option<Transaction>,
}

impl LockState {
    // Grant the lock if the current holders allow it. This api is
    // idempotent.
    //
    // A transaction that is the only shared holder of the page is upgraded
    // to the exclusive holder.
    fn try_grant(&mut self, tx: &Transaction, lock: &Lock) -> bool {
        // If the page hold by another transaction with X-Lock, nothing can
        // be granted. The holder itself already has the strongest lock.
        if let Some(holder) = self.x_holder {
            return holder == *tx;
        }

        match lock {
            Lock::SLock => {
                self.s_holders.insert(*tx);
                true
            }
            Lock::XLock => {
                let sole_holder = self.s_holders.len() == 1 && self.s_holders.contains(tx);
                if !self.s_holders.is_empty() && !sole_holder {
                    return false;
                }

                self.s_holders.remove(tx);
                self.x_holder = Some(*tx);
                true
            }
        }
    }

    fn release(&mut self, tx: &Transaction) -> bool {
        let shared = self.s_holders.remove(tx);
        let exclusive = self.x_holder == Some(*tx);
        if exclusive {
            self.x_holder = None;
        }
        shared || exclusive
    }

    fn holds(&self, tx: &Transaction) -> bool {
        self.x_holder == Some(*tx) || self.s_holders.contains(tx)
    }

    fn is_free(&self) -> bool {
        self.x_holder.is_none() && self.s_holders.is_empty()
    }
}

/// Lock table entry of a single page. Waiters sleep on `released` and are
/// woken up whenever a holder of the page lets go.
#[derive(Default)]
struct LockEntry {
    state: Mutex<LockState>,
    released: Condvar,
}

/// Page-level lock table for strict two-phase locking.
///
/// Lock order: `entries` -> `LockEntry::state` -> `hold_pages`. Requests on
/// different pages only share the (briefly held) `entries` mutex.
pub struct LockManager {
    entries: Mutex<HashMap<HeapPageID, Arc<LockEntry>>>,

    // pages on which a transaction holds any lock, used to release
    // everything at the end of the transaction
    hold_pages: Mutex<HashMap<Transaction, HashSet<HeapPageID>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hold_pages: Mutex::new(HashMap::new()),
        }
    }

    fn get_entry(&self, page_id: &HeapPageID) -> Arc<LockEntry> {
        let mut entries = self.entries.ml();
        Arc::clone(entries.entry(*page_id).or_default())
    }

    fn lookup_entry(&self, page_id: &HeapPageID) -> Option<Arc<LockEntry>> {
        self.entries.ml().get(page_id).cloned()
    }

    fn add_hold_page(&self, tx: &Transaction, page_id: &HeapPageID) {
        self.hold_pages
            .ml()
            .entry(*tx)
            .or_insert_with(HashSet::new)
            .insert(*page_id);
    }

    /// Try to take the lock without waiting.
    ///
    /// # Return
    ///
    /// Return a bool value to indicate whether the lock is granted.
    pub fn acquire(&self, tx: &Transaction, lock: &Lock, page_id: &HeapPageID) -> bool {
        let entry = self.get_entry(page_id);
        let mut state = entry.state.ml();
        if state.try_grant(tx, lock) {
            self.add_hold_page(tx, page_id);
            return true;
        }
        false
    }

    /// Request a lock on the given page. This api is blocking, it gives up
    /// with `SmallError::LockTimeout` once `timeout` has elapsed.
    pub fn request_lock(
        &self,
        tx: &Transaction,
        lock: &Lock,
        page_id: &HeapPageID,
        timeout: Duration,
    ) -> SmallResult {
        let entry = self.get_entry(page_id);
        let deadline = Instant::now() + timeout;

        let mut state = entry.state.ml();
        loop {
            if state.try_grant(tx, lock) {
                self.add_hold_page(tx, page_id);
                debug!("{} granted {:?} on {:?}", tx, lock, page_id);
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let (guard, _) = entry.released.wait_timeout(state, deadline - now).unwrap();
            state = guard;
        }
        drop(state);

        warn!(
            "acquire lock timeout, request: <tx: {}, lock: {:?}, page_id: {:?}>",
            tx, lock, page_id,
        );
        debug!("lock table: {:?}", self);
        Err(SmallError::LockTimeout {
            tx: *tx,
            page_id: *page_id,
            lock: *lock,
        })
    }

    fn release_entry(&self, tx: &Transaction, page_id: &HeapPageID) -> bool {
        let entry = match self.lookup_entry(page_id) {
            Some(entry) => entry,
            None => return false,
        };

        let released = entry.state.ml().release(tx);
        if released {
            entry.released.notify_all();
            self.remove_idle_entry(page_id, &entry);
        }
        released
    }

    // Drop the entry of a page nobody holds or waits for. Only the table
    // and the caller own the entry then, and new owners need the `entries`
    // mutex.
    fn remove_idle_entry(&self, page_id: &HeapPageID, entry: &Arc<LockEntry>) {
        let mut entries = self.entries.ml();
        if Arc::strong_count(entry) == 2 && entry.state.ml().is_free() {
            entries.remove(page_id);
        }
    }

    /// Release the lock the transaction holds on the page. Returns false if
    /// the transaction holds no lock on it.
    pub fn release(&self, tx: &Transaction, page_id: &HeapPageID) -> bool {
        let released = self.release_entry(tx, page_id);
        if let Some(pages) = self.hold_pages.ml().get_mut(tx) {
            pages.remove(page_id);
        }
        released
    }

    /// Release every lock of the transaction, called once at the end of
    /// the transaction.
    pub fn release_all(&self, tx: &Transaction) {
        let pages = self.hold_pages.ml().remove(tx).unwrap_or_default();
        for page_id in pages {
            self.release_entry(tx, &page_id);
        }
    }

    pub fn holds_lock(&self, tx: &Transaction, page_id: &HeapPageID) -> bool {
        match self.lookup_entry(page_id) {
            Some(entry) => entry.state.ml().holds(tx),
            None => false,
        }
    }

    /// The transaction holding an exclusive lock on the page, if any.
    pub fn exclusive_holder(&self, page_id: &HeapPageID) -> Option<Transaction> {
        self.lookup_entry(page_id)
            .and_then(|entry| entry.state.ml().x_holder)
    }

    /// Transactions holding a shared lock on the page.
    pub fn shared_holders(&self, page_id: &HeapPageID) -> HashSet<Transaction> {
        self.lookup_entry(page_id)
            .map(|entry| entry.state.ml().s_holders.clone())
            .unwrap_or_default()
    }

    /// Pages on which the transaction holds any lock.
    pub fn hold_pages(&self, tx: &Transaction) -> HashSet<HeapPageID> {
        self.hold_pages.ml().get(tx).cloned().unwrap_or_default()
    }
}

impl fmt::Display for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut depiction = "\n".to_string();

        let entries: Vec<(HeapPageID, Arc<LockEntry>)> = self
            .entries
            .ml()
            .iter()
            .map(|(k, v)| (*k, Arc::clone(v)))
            .collect();

        depiction.push_str("lock_table: {");
        for (page_id, entry) in entries {
            let state = entry.state.ml();
            if state.is_free() {
                continue;
            }
            depiction.push_str(&format!(
                "\n\t{:?} -> s: {:?}, x: {:?}",
                page_id.get_short_repr(),
                state.s_holders,
                state.x_holder,
            ));
        }
        depiction.push_str("\n}\n");

        depiction.push_str("hold_pages: {");
        for (tx, pages) in self.hold_pages.ml().iter() {
            depiction.push_str(&format!("\n\t{:?} -> [", tx));
            for page_id in pages {
                depiction.push_str(&format!("\n\t\t{:?}, ", page_id.get_short_repr()));
            }
            depiction.push_str("\n\t]");
        }
        depiction.push_str("\n}\n");

        write!(f, "{}", depiction)
    }
}

impl fmt::Debug for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
