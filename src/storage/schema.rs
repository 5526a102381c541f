use std::fmt;

use itertools::Itertools;

use crate::error::SmallError;

/// Maximum payload of a string field in bytes.
pub const STRING_LEN: usize = 128;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Type {
    Int,
    String,
}

impl Type {
    /// Get the size of the type on disk in bytes.
    pub fn len(&self) -> usize {
        match self {
            Type::Int => 4,
            // 4 bytes for the length, then the (zero padded) payload
            Type::String => 4 + STRING_LEN,
        }
    }

    pub fn parse(name: &str) -> Result<Self, SmallError> {
        match name.trim().to_lowercase().as_str() {
            "int" => Ok(Type::Int),
            "string" => Ok(Type::String),
            other => Err(SmallError::new(&format!("unknown type {}", other))),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::String => write!(f, "string"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub t: Type,
}

impl Field {
    pub fn new(field_name: &str, field_type: Type) -> Field {
        Field {
            t: field_type,
            name: field_name.to_string(),
        }
    }
}

/// Describes the layout of the tuples of a table.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
}

// Constructors
impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// A schema with `width` int columns named `int-column-{i}`.
    pub fn small_int_schema(width: usize) -> Self {
        let fields = (0..width)
            .map(|i| Field::new(&format!("int-column-{}", i), Type::Int))
            .collect();
        Self { fields }
    }

    /// Concatenate the fields of two schemas, `a` first.
    pub fn merge(a: &Schema, b: &Schema) -> Self {
        let mut fields = a.fields.clone();
        fields.extend(b.fields.iter().cloned());
        Self { fields }
    }

    /// Same field types, every field renamed to `{alias}.{name}`.
    pub fn with_alias(&self, alias: &str) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|f| Field::new(&format!("{}.{}", alias, f.name), f.t))
            .collect();
        Self { fields }
    }
}

impl Schema {
    pub fn get_fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_count(&self) -> usize {
        self.fields.len()
    }

    pub fn get_field_name(&self, i: usize) -> Option<&str> {
        self.fields.get(i).map(|f| f.name.as_str())
    }

    pub fn get_field_type(&self, i: usize) -> Option<Type> {
        self.fields.get(i).map(|f| f.t)
    }

    pub fn field_name_to_index(&self, name: &str) -> Result<usize, SmallError> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| SmallError::not_found(&format!("field {}", name)))
    }

    /// get tuple size in bytes
    pub fn get_size(&self) -> usize {
        self.fields.iter().map(|f| f.t.len()).sum()
    }
}

/// Two schemas are equal if they have the same field types, names are
/// ignored.
impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|(a, b)| a.t == b.t)
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let content = self
            .fields
            .iter()
            .map(|field| format!("{}({})", field.name, field.t))
            .join(", ");
        write!(f, "{}", content)
    }
}
