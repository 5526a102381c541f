use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::{Arc, Mutex, RwLock},
    time::Duration,
};

use log::{debug, error, info};

use crate::{
    catalog::Catalog,
    config::Config,
    error::SmallError,
    heap::{HeapPage, HeapPageID},
    storage::{RecordId, Tuple},
    transaction::{LockManager, Permission, Transaction},
    types::{Pod, ResultPod, SmallResult},
    utils::{lock_state, HandyMutex, HandyRwLock},
};

/// Resident pages, keyed by page id.
///
/// `order` holds the same ids as `pages`, the least recently touched page
/// first.
struct PageCache {
    pages: HashMap<HeapPageID, Pod<HeapPage>>,
    order: VecDeque<HeapPageID>,
}

impl PageCache {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn len(&self) -> usize {
        self.pages.len()
    }

    /// Look up a page and move it to the tail of the recency order.
    fn touch(&mut self, pid: &HeapPageID) -> Option<Pod<HeapPage>> {
        let pod = Arc::clone(self.pages.get(pid)?);
        if let Some(pos) = self.order.iter().position(|p| p == pid) {
            self.order.remove(pos);
        }
        self.order.push_back(*pid);
        Some(pod)
    }

    fn insert(&mut self, pid: &HeapPageID, pod: &Pod<HeapPage>) {
        if self.pages.insert(*pid, Arc::clone(pod)).is_none() {
            self.order.push_back(*pid);
        }
    }

    fn remove(&mut self, pid: &HeapPageID) -> Option<Pod<HeapPage>> {
        let pod = self.pages.remove(pid)?;
        if let Some(pos) = self.order.iter().position(|p| p == pid) {
            self.order.remove(pos);
        }
        Some(pod)
    }

    fn snapshot(&self) -> Vec<(HeapPageID, Pod<HeapPage>)> {
        self.order
            .iter()
            .map(|pid| (*pid, Arc::clone(&self.pages[pid])))
            .collect()
    }
}

/// A bounded cache of heap pages, and the only way to access them.
///
/// Every page access is guarded by a page lock taken through the lock
/// manager (strict two-phase locking). Dirty pages are never written to
/// disk before their transaction commits (no-steal) and are always
/// written when it commits (force), so the on-disk copy of a page is
/// the rollback target of an abort.
pub struct BufferPool {
    capacity: usize,

    lock_timeout: Duration,

    catalog: Arc<Catalog>,

    lock_manager: LockManager,

    cache: Mutex<PageCache>,
}

impl BufferPool {
    pub fn new(config: &Config, catalog: Arc<Catalog>) -> Self {
        Self {
            capacity: config.buffer_pool_pages,
            lock_timeout: config.lock_timeout,
            catalog,
            lock_manager: LockManager::new(),
            cache: Mutex::new(PageCache::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get_lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    /// Retrieve the specified page with the associated permissions.
    /// Will acquire a lock and may block if that lock is held by
    /// another transaction.
    ///
    /// The page is looked up in the cache first. If it's not resident, it
    /// is read from its table file, evicting a page beforehand when the
    /// cache is full.
    ///
    /// # Errors
    ///
    /// - `LockTimeout` if the lock can't be granted in time, the caller
    ///   has to abort the transaction
    /// - `ResourceExhausted` if the cache is full and no page can be
    ///   evicted. Besides dirty pages, clean pages exclusively locked by a
    ///   running transaction are not evicted either, so this can happen
    ///   while every resident page is clean
    pub fn get_page(
        &self,
        tx: &Transaction,
        perm: Permission,
        pid: &HeapPageID,
    ) -> ResultPod<HeapPage> {
        self.lock_manager
            .request_lock(tx, &perm.to_lock(), pid, self.lock_timeout)?;

        let file = self.catalog.get_file(pid.get_table_id())?;

        let mut cache = self.cache.ml();
        if let Some(pod) = cache.touch(pid) {
            return Ok(pod);
        }

        if cache.len() >= self.capacity {
            self.evict_page(&mut cache)?;
        }

        let page = file.read_page(pid).map_err(|e| {
            error!("read page {:?} failed: {}", pid, e);
            e
        })?;
        let pod = Arc::new(RwLock::new(page));
        cache.insert(pid, &pod);
        Ok(pod)
    }

    /// Drop one clean page from the cache, the least recently touched one
    /// that qualifies.
    ///
    /// Dirty pages are never evicted. Neither are pages exclusively locked
    /// by a running transaction or pages someone is reading or writing
    /// right now, since the holder of such a page may dirty it through a
    /// handle it already has.
    fn evict_page(&self, cache: &mut PageCache) -> SmallResult {
        let victim = cache.order.iter().cloned().find(|pid| {
            if self.lock_manager.exclusive_holder(pid).is_some() {
                return false;
            }
            match cache.pages[pid].try_read() {
                Ok(page) => page.is_dirty().is_none(),
                Err(_) => false,
            }
        });

        match victim {
            Some(pid) => {
                cache.remove(&pid);
                debug!("evicted page {:?}", pid);
                Ok(())
            }
            None => {
                let err = SmallError::ResourceExhausted(format!(
                    "all {} resident pages are dirty or in use",
                    cache.len()
                ));
                err.show_backtrace();
                Err(err)
            }
        }
    }

    /// Add a tuple to the specified table on behalf of the transaction.
    ///
    /// The tuple goes to the first page with an empty slot. Every page
    /// inspected on the way is locked exclusively, and the locks are kept
    /// until the transaction completes. If no page has room, a new page is
    /// appended to the file.
    pub fn insert_tuple(
        &self,
        tx: &Transaction,
        table_id: u32,
        tuple: &Tuple,
    ) -> Result<RecordId, SmallError> {
        let file = self.catalog.get_file(table_id)?;
        if !tuple.matches(file.get_schema()) {
            return Err(SmallError::new(&format!(
                "tuple {} doesn't match schema {}",
                tuple,
                file.get_schema()
            )));
        }

        for page_index in 0..file.pages_count()? {
            let pid = HeapPageID::new(table_id, page_index as u32);
            if let Some(record_id) = self.insert_into_page(tx, &pid, tuple)? {
                return Ok(record_id);
            }
        }

        // every page is full, a new one is needed
        loop {
            let pid = file.allocate_page()?;
            if let Some(record_id) = self.insert_into_page(tx, &pid, tuple)? {
                return Ok(record_id);
            }
        }
    }

    // Returns `None` if the page is full.
    fn insert_into_page(
        &self,
        tx: &Transaction,
        pid: &HeapPageID,
        tuple: &Tuple,
    ) -> Result<Option<RecordId>, SmallError> {
        let pod = self.get_page(tx, Permission::ReadWrite, pid)?;
        let mut page = pod.wl();
        if page.empty_slots_count() == 0 {
            return Ok(None);
        }

        let record_id = page.insert_tuple(tuple)?;
        page.mark_dirty(true, tx);
        debug!("{} inserted {} at {:?}", tx, tuple, record_id);
        Ok(Some(record_id))
    }

    /// Remove the specified tuple from the page its record id points to.
    pub fn delete_tuple(&self, tx: &Transaction, tuple: &Tuple) -> SmallResult {
        let record_id = tuple
            .get_record_id()
            .ok_or_else(|| SmallError::new(&format!("tuple {} has no record id", tuple)))?;

        let pod = self.get_page(tx, Permission::ReadWrite, &record_id.page_id)?;
        let mut page = pod.wl();
        page.delete_tuple(tuple)?;
        page.mark_dirty(true, tx);
        debug!("{} deleted {:?}", tx, tuple);
        Ok(())
    }

    /// Commit or abort the transaction, then release all of its locks.
    ///
    /// A commit that fails to write a page keeps the locks, the caller is
    /// expected to abort the transaction afterwards.
    pub fn transaction_complete(&self, tx: &Transaction, commit: bool) -> SmallResult {
        if commit {
            if let Err(e) = self.flush_pages(tx) {
                e.show_backtrace();
                return Err(e);
            }
            info!("{} committed", tx);
        } else {
            self.restore_pages(tx);
            info!("{} aborted", tx);
        }

        self.lock_manager.release_all(tx);
        Ok(())
    }

    pub fn commit(&self, tx: &Transaction) -> SmallResult {
        self.transaction_complete(tx, true)
    }

    pub fn abort(&self, tx: &Transaction) {
        // rolling back never fails, a page that can't be reread is dropped
        // from the cache instead
        let _ = self.transaction_complete(tx, false);
    }

    // Replace every page dirtied by the transaction with its on-disk copy.
    //
    // The page is replaced in place so handles that are still around see
    // the restored content.
    fn restore_pages(&self, tx: &Transaction) {
        let pages = self.cache.ml().snapshot();
        for (pid, pod) in pages {
            let restored = {
                let mut page = pod.wl();
                if page.is_dirty() != Some(*tx) {
                    continue;
                }

                match self
                    .catalog
                    .get_file(pid.get_table_id())
                    .and_then(|file| file.read_page(&pid))
                {
                    Ok(fresh) => {
                        *page = fresh;
                        true
                    }
                    Err(e) => {
                        error!("reread page {:?} failed: {}, discard it", pid, e);
                        false
                    }
                }
            };

            if !restored {
                self.discard_page(&pid);
            }
        }
    }

    /// Write all pages dirtied by the transaction to disk and mark them
    /// clean.
    pub fn flush_pages(&self, tx: &Transaction) -> SmallResult {
        let pages = self.cache.ml().snapshot();
        for (_, pod) in pages {
            let mut page = pod.wl();
            if page.is_dirty() == Some(*tx) {
                self.flush_page(&mut page)?;
            }
        }
        Ok(())
    }

    /// Flush all dirty pages to disk.
    ///
    /// NB: Be careful using this routine -- it writes dirty data of
    /// transactions that haven't committed, which breaks the no-steal
    /// policy.
    pub fn flush_all_pages(&self) -> SmallResult {
        let pages = self.cache.ml().snapshot();
        for (_, pod) in pages {
            let mut page = pod.wl();
            if page.is_dirty().is_some() {
                self.flush_page(&mut page)?;
            }
        }
        Ok(())
    }

    fn flush_page(&self, page: &mut HeapPage) -> SmallResult {
        let file = self.catalog.get_file(page.get_pid().get_table_id())?;
        file.write_page(page)?;
        if let Some(tx) = page.is_dirty() {
            page.mark_dirty(false, &tx);
        }
        Ok(())
    }

    /// Remove the page from the cache without writing it back. Returns
    /// false if the page isn't resident.
    pub fn discard_page(&self, pid: &HeapPageID) -> bool {
        self.cache.ml().remove(pid).is_some()
    }

    /// Release the lock the transaction holds on the page before the
    /// transaction ends.
    ///
    /// Calling this is risky, it may break strict two-phase locking. It's
    /// only meant for pages the transaction has read but not modified.
    pub fn release_page(&self, tx: &Transaction, pid: &HeapPageID) -> bool {
        self.lock_manager.release(tx, pid)
    }

    pub fn holds_lock(&self, tx: &Transaction, pid: &HeapPageID) -> bool {
        self.lock_manager.holds_lock(tx, pid)
    }

    /// Ids of the resident pages, least recently touched first.
    pub fn resident_pages(&self) -> Vec<HeapPageID> {
        self.cache.ml().order.iter().cloned().collect()
    }

    pub fn pages_count_cached(&self) -> usize {
        self.cache.ml().len()
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pages = self.cache.ml().snapshot();

        let mut depiction = format!(
            "BufferPool {{ capacity: {}, resident: {}",
            self.capacity,
            pages.len()
        );
        for (pid, pod) in pages {
            depiction.push_str(&format!("\n\t{:?} -> {}", pid, lock_state(pod)));
        }
        depiction.push_str("\n}");

        write!(f, "{}", depiction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Schema;

    fn page_pod(pid: &HeapPageID) -> Pod<HeapPage> {
        let schema = Arc::new(Schema::small_int_schema(2));
        let page = HeapPage::new(pid, &HeapPage::empty_page_data(256), &schema).unwrap();
        Arc::new(RwLock::new(page))
    }

    #[test]
    fn test_page_cache_recency() {
        let mut cache = PageCache::new();
        let pids: Vec<HeapPageID> = (0..3).map(|i| HeapPageID::new(1, i)).collect();
        for pid in &pids {
            cache.insert(pid, &page_pod(pid));
        }
        assert_eq!(cache.order, vec![pids[0], pids[1], pids[2]]);

        assert!(cache.touch(&pids[0]).is_some());
        assert_eq!(cache.order, vec![pids[1], pids[2], pids[0]]);

        assert!(cache.remove(&pids[2]).is_some());
        assert!(cache.remove(&pids[2]).is_none());
        assert_eq!(cache.order, vec![pids[1], pids[0]]);
        assert_eq!(cache.len(), 2);

        assert!(cache.touch(&pids[2]).is_none());
    }
}
