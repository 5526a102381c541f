use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use log::{debug, error};

use super::{HeapFileIterator, HeapPage, HeapPageID};
use crate::{
    buffer_pool::BufferPool,
    error::SmallError,
    io::SmallFile,
    storage::Schema,
    transaction::Transaction,
    types::SmallResult,
    utils::HandyMutex,
};

/// A table stored as a sequence of fixed-size pages, tuples are kept in no
/// particular order. Page `i` lives at byte offset `i * page_size`.
pub struct HeapFile {
    table_id: u32,

    path: PathBuf,

    file: SmallFile,

    schema: Arc<Schema>,

    page_size: usize,

    // held while a new page is appended, so two writers never get the same
    // page index
    alloc_latch: Mutex<()>,
}

impl HeapFile {
    /// Open (or create) the table file at the given path.
    ///
    /// The table id is a 32-bit hash of the absolute path, so reopening the
    /// same file yields the same id within one build. The hash function may
    /// change between Rust releases, ids are not meant to be persisted.
    /// Two paths may also hash to the same id, `Catalog::add_table` rejects
    /// such a table.
    pub fn new<P: AsRef<Path>>(
        file_path: P,
        schema: Schema,
        page_size: usize,
    ) -> Result<Self, SmallError> {
        let file = SmallFile::open(&file_path)?;

        let path = file_path.as_ref().canonicalize()?;
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let table_id = hasher.finish() as u32;

        Ok(Self::with_id(table_id, path, file, schema, page_size))
    }

    pub(crate) fn with_id(
        table_id: u32,
        path: PathBuf,
        file: SmallFile,
        schema: Schema,
        page_size: usize,
    ) -> Self {
        Self {
            table_id,
            path,
            file,
            schema: Arc::new(schema),
            page_size,
            alloc_latch: Mutex::new(()),
        }
    }

    pub fn get_id(&self) -> u32 {
        self.table_id
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn get_schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn get_page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the number of whole pages in the file.
    pub fn pages_count(&self) -> Result<usize, SmallError> {
        let size = self.file.get_size()?;
        Ok((size / self.page_size as u64) as usize)
    }

    fn page_offset(&self, pid: &HeapPageID) -> u64 {
        pid.page_index as u64 * self.page_size as u64
    }

    fn check_pid(&self, pid: &HeapPageID) -> SmallResult {
        if pid.get_table_id() != self.table_id {
            return Err(SmallError::new(&format!(
                "page {:?} doesn't belong to table {}",
                pid, self.table_id
            )));
        }
        Ok(())
    }

    /// Read the raw bytes of a page.
    pub fn read_page_data(&self, pid: &HeapPageID) -> Result<Vec<u8>, SmallError> {
        self.check_pid(pid)?;

        let pages_count = self.pages_count()?;
        if pid.page_index as usize >= pages_count {
            return Err(SmallError::new(&format!(
                "page {:?} is out of range, table {} has {} pages",
                pid, self.table_id, pages_count
            )));
        }

        let mut buf = vec![0; self.page_size];
        self.file.read_at(self.page_offset(pid), &mut buf)?;
        Ok(buf)
    }

    /// Read a page from disk and decode it. The buffer pool is the only
    /// caller, access methods go through the buffer pool.
    pub fn read_page(&self, pid: &HeapPageID) -> Result<HeapPage, SmallError> {
        let buf = self.read_page_data(pid)?;
        debug!("read page {:?} from {:?}", pid, self.path);
        HeapPage::new(pid, &buf, &self.schema)
    }

    /// Write the bytes of a page to its slot in the file, synchronously.
    pub fn write_page_data(&self, pid: &HeapPageID, data: &[u8]) -> SmallResult {
        self.check_pid(pid)?;

        if data.len() != self.page_size {
            return Err(SmallError::new(&format!(
                "page data size mismatch, expect {}, got {}",
                self.page_size,
                data.len()
            )));
        }

        self.file.write_at(self.page_offset(pid), data).map_err(|e| {
            error!("write page {:?} to {:?} failed: {}", pid, self.path, e);
            SmallError::from(e)
        })
    }

    pub fn write_page(&self, page: &HeapPage) -> SmallResult {
        debug!("flushing page {:?}", page.get_pid());
        self.write_page_data(&page.get_pid(), &page.get_page_data())
    }

    /// Append an empty page to the end of the file, return its id.
    pub fn allocate_page(&self) -> Result<HeapPageID, SmallError> {
        let _latch = self.alloc_latch.ml();

        let pid = HeapPageID::new(self.table_id, self.pages_count()? as u32);
        self.file
            .write_at(self.page_offset(&pid), &HeapPage::empty_page_data(self.page_size))
            .map_err(|e| {
                error!("allocate page {:?} failed: {}", pid, e);
                SmallError::from(e)
            })?;

        debug!("allocated page {:?}", pid);
        Ok(pid)
    }

    /// A cursor over all tuples of the file, pages are read through the
    /// buffer pool with read-only permission.
    pub fn iter(
        self: &Arc<Self>,
        tx: &Transaction,
        buffer_pool: &Arc<BufferPool>,
    ) -> HeapFileIterator {
        HeapFileIterator::new(tx, self, buffer_pool)
    }
}

impl fmt::Debug for HeapFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "HeapFile {{ id: {}, path: {:?}, schema: {} }}",
            self.table_id, self.path, self.schema
        )
    }
}
