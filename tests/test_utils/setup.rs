use std::{ops::Deref, time::Duration};

use small_heap::{utils, Config, Database};
use tempfile::TempDir;

/// Small pages so a test fills a page with a few dozen tuples.
pub const TEST_PAGE_SIZE: usize = 256;

pub const TEST_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// A database whose table files live in a temporary directory, the
/// directory is removed when the value is dropped.
pub struct TestDatabase {
    db: Database,
    _dir: TempDir,
}

impl Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Database {
        &self.db
    }
}

pub fn default_config() -> Config {
    Config::default()
        .page_size(TEST_PAGE_SIZE)
        .lock_timeout(TEST_LOCK_TIMEOUT)
}

/// # Conduct the initialization
///
/// - Setting up log configurations.
/// - Create an empty database in a new temporary directory.
pub fn setup() -> TestDatabase {
    setup_with(default_config())
}

/// Same as `setup`, the data directory of `config` is replaced.
pub fn setup_with(config: Config) -> TestDatabase {
    utils::init_log();

    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(config.data_dir(dir.path())).unwrap();
    TestDatabase { db, _dir: dir }
}
