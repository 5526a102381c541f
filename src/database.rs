use std::{fs, path::Path, sync::Arc};

use log::info;

use crate::{
    buffer_pool::BufferPool, catalog::Catalog, config::Config, error::SmallError,
    heap::HeapFile, storage::Schema,
};

/// The handle shared by everything that touches tables: the catalog and
/// the buffer pool built on top of it.
///
/// It's created once and passed to whoever needs it, there is no global
/// instance.
pub struct Database {
    config: Config,

    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    pub fn new(config: Config) -> Result<Self, SmallError> {
        if !config.data_dir.exists() {
            fs::create_dir_all(&config.data_dir)?;
        }

        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::new(&config, Arc::clone(&catalog)));

        info!("database opened with {:?}", config);
        Ok(Self {
            config,
            catalog,
            buffer_pool,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    /// Create (or reopen) the table `name`, stored in `<data_dir>/name.dat`.
    pub fn create_table(&self, name: &str, schema: Schema) -> Result<u32, SmallError> {
        let path = self.config.data_dir.join(format!("{}.dat", name));
        let file = HeapFile::new(path, schema, self.config.page_size)?;
        self.catalog.add_table(file, name, "")
    }

    /// Register the tables described in a catalog file, see
    /// `Catalog::load_schema`.
    pub fn load_schema<P: AsRef<Path>>(&self, catalog_file: P) -> Result<Vec<u32>, SmallError> {
        self.catalog
            .load_schema(catalog_file, self.config.page_size)
    }

    pub fn get_file(&self, table_id: u32) -> Result<Arc<HeapFile>, SmallError> {
        self.catalog.get_file(table_id)
    }
}
