use std::{env, path::PathBuf, str::FromStr, time::Duration};

use log::warn;

/// Bytes per page, including header.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of pages the buffer pool may keep in memory.
pub const DEFAULT_PAGES: usize = 50;

/// How long a transaction waits for a page lock before it is told to
/// abort.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct Config {
    pub page_size: usize,
    pub buffer_pool_pages: usize,
    pub lock_timeout: Duration,

    /// Directory for table files created through the `Database`.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            buffer_pool_pages: DEFAULT_PAGES,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Config {
    /// Start from the defaults and override them with the `SMALL_*`
    /// environment variables that are set.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = read_env::<usize>("SMALL_PAGE_SIZE") {
            config.page_size = v;
        }
        if let Some(v) = read_env::<usize>("SMALL_BUFFER_POOL_PAGES") {
            config.buffer_pool_pages = v;
        }
        if let Some(v) = read_env::<u64>("SMALL_LOCK_TIMEOUT_MS") {
            config.lock_timeout = Duration::from_millis(v);
        }
        if let Ok(v) = env::var("SMALL_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }

        config
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn buffer_pool_pages(mut self, pages: usize) -> Self {
        self.buffer_pool_pages = pages;
        self
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.data_dir = dir.into();
        self
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignore invalid value for {}: {:?}", key, raw);
            None
        }
    }
}
