mod file;
mod file_iter;
mod page;
mod page_id;

pub use file::HeapFile;
pub use file_iter::HeapFileIterator;
pub use page::HeapPage;
pub use page_id::HeapPageID;
