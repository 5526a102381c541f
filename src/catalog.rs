use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{Arc, RwLock},
};

use log::info;

use crate::{
    error::SmallError,
    heap::HeapFile,
    storage::{Field, Schema, Type},
    utils::HandyRwLock,
};

struct TableEntry {
    file: Arc<HeapFile>,
    name: String,
    primary_key: String,
}

/// Keeps track of all available tables and their schemas, resolves a table
/// id to the file that stores it.
pub struct Catalog {
    tables: RwLock<HashMap<u32, TableEntry>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Add a new table to the catalog. A table stored in the same file or
    /// with the same name is replaced.
    ///
    /// Fails if the id of the table is already taken by a table stored in
    /// another file.
    pub fn add_table(
        &self,
        file: HeapFile,
        name: &str,
        primary_key: &str,
    ) -> Result<u32, SmallError> {
        let table_id = file.get_id();

        let mut tables = self.tables.wl();
        if let Some(existing) = tables.get(&table_id) {
            if existing.file.get_path() != file.get_path() {
                return Err(SmallError::new(&format!(
                    "table id {} of {:?} collides with table {} in {:?}",
                    table_id,
                    file.get_path(),
                    existing.name,
                    existing.file.get_path()
                )));
            }
        }
        tables.retain(|id, entry| *id == table_id || entry.name != name);
        tables.insert(
            table_id,
            TableEntry {
                file: Arc::new(file),
                name: name.to_string(),
                primary_key: primary_key.to_string(),
            },
        );

        Ok(table_id)
    }

    pub fn get_table_id(&self, name: &str) -> Result<u32, SmallError> {
        self.tables
            .rl()
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| SmallError::not_found(&format!("table {}", name)))
    }

    pub fn get_file(&self, table_id: u32) -> Result<Arc<HeapFile>, SmallError> {
        self.tables
            .rl()
            .get(&table_id)
            .map(|entry| Arc::clone(&entry.file))
            .ok_or_else(|| SmallError::not_found(&format!("table {}", table_id)))
    }

    pub fn get_schema(&self, table_id: u32) -> Result<Arc<Schema>, SmallError> {
        Ok(Arc::clone(self.get_file(table_id)?.get_schema()))
    }

    pub fn get_primary_key(&self, table_id: u32) -> Result<String, SmallError> {
        self.tables
            .rl()
            .get(&table_id)
            .map(|entry| entry.primary_key.clone())
            .ok_or_else(|| SmallError::not_found(&format!("table {}", table_id)))
    }

    pub fn get_table_name(&self, table_id: u32) -> Result<String, SmallError> {
        self.tables
            .rl()
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| SmallError::not_found(&format!("table {}", table_id)))
    }

    pub fn table_ids(&self) -> Vec<u32> {
        self.tables.rl().keys().cloned().collect()
    }

    /// Delete all tables from the catalog.
    pub fn clear(&self) {
        self.tables.wl().clear();
    }

    /// Reads the schema from a file and creates the appropriate tables.
    ///
    /// Every line describes a table as `name (field type [pk], ...)`, where
    /// type is `int` or `string`. The table is stored in `name.dat` next to
    /// the catalog file.
    pub fn load_schema<P: AsRef<Path>>(
        &self,
        catalog_file: P,
        page_size: usize,
    ) -> Result<Vec<u32>, SmallError> {
        let base_folder = catalog_file
            .as_ref()
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        let content = fs::read_to_string(catalog_file.as_ref())?;

        let mut table_ids = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let (name, schema, primary_key) = parse_table_line(line)?;

            let file = HeapFile::new(base_folder.join(format!("{}.dat", name)), schema, page_size)?;
            info!("added table: {} with schema {}", name, file.get_schema());
            table_ids.push(self.add_table(file, &name, &primary_key)?);
        }

        Ok(table_ids)
    }
}

fn parse_table_line(line: &str) -> Result<(String, Schema, String), SmallError> {
    let invalid = || SmallError::new(&format!("invalid catalog entry: {}", line));

    let open = line.find('(').ok_or_else(invalid)?;
    let close = line.rfind(')').ok_or_else(invalid)?;
    if close < open {
        return Err(invalid());
    }

    let name = line[..open].trim().to_string();
    if name.is_empty() {
        return Err(invalid());
    }

    let mut fields = Vec::new();
    let mut primary_key = String::new();
    for column in line[open + 1..close].split(',') {
        let parts: Vec<&str> = column.split_whitespace().collect();
        match parts.as_slice() {
            [field_name, field_type] => {
                fields.push(Field::new(field_name, Type::parse(field_type)?));
            }
            [field_name, field_type, annotation] => {
                if *annotation != "pk" {
                    return Err(SmallError::new(&format!(
                        "unknown annotation {} in: {}",
                        annotation, line
                    )));
                }
                fields.push(Field::new(field_name, Type::parse(field_type)?));
                primary_key = field_name.to_string();
            }
            _ => return Err(invalid()),
        }
    }

    Ok((name, Schema::new(fields), primary_key))
}
